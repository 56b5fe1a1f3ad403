//! Response body strategies.
//!
//! # Design Decisions
//! - A body declares its own framing and content type headers
//! - Fixed bodies are framed with `Content-Length`
//! - File bodies are streamed with `Transfer-Encoding: chunked`; the file is
//!   opened only when the response is written and closed after the last chunk

use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tokio::fs::File;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::http::headers::HeaderMap;
use crate::http::mime::content_type_for;

/// Block size used when streaming files.
pub const DEFAULT_CHUNK_SIZE: usize = 8192;

pub const TEXT_PLAIN: &str = "text/plain";
pub const TEXT_HTML: &str = "text/html";
pub const APPLICATION_JSON: &str = "application/json";

/// The body of a response. Exactly one strategy is active.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Body {
    /// A fully buffered body of known length.
    Fixed { data: Vec<u8>, content_type: String },
    /// A file streamed in chunks.
    File(ChunkedFile),
}

impl Body {
    /// An empty `text/plain` body.
    pub fn empty() -> Self {
        Self::bytes(Vec::new())
    }

    /// Raw bytes, sent as `text/plain`.
    pub fn bytes(data: impl Into<Vec<u8>>) -> Self {
        Body::Fixed {
            data: data.into(),
            content_type: TEXT_PLAIN.to_string(),
        }
    }

    /// UTF-8 text, sent as `text/html`.
    pub fn text(text: impl Into<String>) -> Self {
        Body::Fixed {
            data: text.into().into_bytes(),
            content_type: TEXT_HTML.to_string(),
        }
    }

    /// A JSON-encoded value, sent as `application/json`.
    pub fn json<T: Serialize + ?Sized>(value: &T) -> serde_json::Result<Self> {
        Ok(Body::Fixed {
            data: serde_json::to_vec(value)?,
            content_type: APPLICATION_JSON.to_string(),
        })
    }

    /// A file streamed with chunked transfer encoding.
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Body::File(ChunkedFile::new(path))
    }

    /// Override the content type declared by this body.
    pub fn with_content_type(mut self, value: impl Into<String>) -> Self {
        match &mut self {
            Body::Fixed { content_type, .. } => *content_type = value.into(),
            Body::File(file) => file.content_type = value.into(),
        }
        self
    }

    pub fn content_type(&self) -> &str {
        match self {
            Body::Fixed { content_type, .. } => content_type,
            Body::File(file) => &file.content_type,
        }
    }

    /// Merge the framing and content type headers of this body into `headers`.
    pub fn apply_headers(&self, headers: &mut HeaderMap) {
        match self {
            Body::Fixed { data, .. } => {
                headers.insert("Content-Length", data.len().to_string());
            }
            Body::File(_) => {
                headers.insert("Transfer-Encoding", "chunked");
            }
        }
        headers.insert("Content-Type", self.content_type());
    }

    /// Write the body bytes (after the head) to `writer`.
    pub async fn write_to<W>(&self, writer: &mut W) -> io::Result<()>
    where
        W: AsyncWrite + Unpin,
    {
        match self {
            Body::Fixed { data, .. } => writer.write_all(data).await,
            Body::File(file) => file.write_to(writer).await,
        }
    }
}

impl Default for Body {
    fn default() -> Self {
        Body::empty()
    }
}

/// A file body sent as a sequence of fixed-size chunks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkedFile {
    path: PathBuf,
    chunk_size: usize,
    content_type: String,
}

impl ChunkedFile {
    /// Stream `path`, with the content type inferred from its extension.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let content_type = content_type_for(&path).to_string();
        Self {
            path,
            chunk_size: DEFAULT_CHUNK_SIZE,
            content_type,
        }
    }

    /// Set the read block size. Zero is treated as one byte.
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Open the file and write it as chunks, then the terminating chunk.
    pub async fn write_to<W>(&self, writer: &mut W) -> io::Result<()>
    where
        W: AsyncWrite + Unpin,
    {
        let file = File::open(&self.path).await?;
        write_chunks(file, self.chunk_size, writer).await
    }
}

impl From<ChunkedFile> for Body {
    fn from(file: ChunkedFile) -> Self {
        Body::File(file)
    }
}

/// Copy `source` to `writer` as `<hex-len>\r\n<bytes>\r\n` chunks, ending
/// with a single `0\r\n\r\n`.
pub async fn write_chunks<R, W>(mut source: R, chunk_size: usize, writer: &mut W) -> io::Result<()>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut block = vec![0u8; chunk_size.max(1)];
    loop {
        let n = fill_block(&mut source, &mut block).await?;
        if n == 0 {
            break;
        }
        writer.write_all(format!("{n:x}\r\n").as_bytes()).await?;
        writer.write_all(&block[..n]).await?;
        writer.write_all(b"\r\n").await?;
        if n < block.len() {
            break;
        }
    }
    writer.write_all(b"0\r\n\r\n").await
}

/// Read until `block` is full or the source is exhausted.
async fn fill_block<R: AsyncRead + Unpin>(source: &mut R, block: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < block.len() {
        let n = source.read(&mut block[filled..]).await?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    Ok(filled)
}
