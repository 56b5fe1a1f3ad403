//! Request model and parser.
//!
//! # Responsibilities
//! - Parse the request line into method, target and version
//! - Percent-decode the target and split off the query string
//! - Collect header lines until the blank line
//! - Buffer exactly `Content-Length` bytes of body
//!
//! # Design Decisions
//! - Headers keep the case they were received with; last duplicate wins
//! - Chunked request bodies are not supported
//! - Size limits are enforced while reading (see `security::limits`)

use std::collections::HashMap;

use serde::de::DeserializeOwned;
use tokio::io::{AsyncBufRead, AsyncReadExt};

use crate::http::error::ParseError;
use crate::http::headers::HeaderMap;
use crate::http::line::{read_line, trim_eol};
use crate::routing::Captures;
use crate::security::RequestLimits;

/// Parsed query string: key to optional value.
pub type Query = HashMap<String, Option<String>>;

/// A single HTTP request.
#[derive(Debug, Clone, Default)]
pub struct Request {
    /// Request method, e.g. `GET`.
    pub method: String,
    /// The request target exactly as sent.
    pub location: String,
    /// Percent-decoded path, without the query string.
    pub path: String,
    pub query: Query,
    /// Protocol version token, e.g. `HTTP/1.1`.
    pub version: String,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
    /// Capture groups of the route pattern that matched this request.
    pub captures: Captures,
}

impl Request {
    /// Read one request from the stream.
    pub async fn read<R>(reader: &mut R, limits: &RequestLimits) -> Result<Self, ParseError>
    where
        R: AsyncBufRead + Unpin,
    {
        let start_line = read_line(reader, limits.max_line_bytes).await?;
        let mut request = Self::from_start_line(trim_eol(&start_line))?;

        let mut lines = 0;
        loop {
            let raw = read_line(reader, limits.max_line_bytes).await?;
            let line = trim_eol(&raw);
            if line.iter().all(u8::is_ascii_whitespace) {
                break;
            }
            // Duplicates collapse in the map, so count lines rather than names.
            lines += 1;
            if lines > limits.max_headers {
                return Err(ParseError::TooManyHeaders { limit: limits.max_headers });
            }
            let (name, value) = parse_header(line)?;
            request.headers.insert(name, value);
        }

        request.buffer_body(reader, limits.max_body_bytes).await?;
        Ok(request)
    }

    fn from_start_line(line: &[u8]) -> Result<Self, ParseError> {
        let line = std::str::from_utf8(line).map_err(|_| ParseError::Encoding)?;
        let tokens: Vec<&str> = line.split_whitespace().collect();
        let [method, location, version] = tokens.as_slice() else {
            return Err(ParseError::RequestLine(line.to_string()));
        };

        let decoded = urlencoding::decode(location).map_err(|_| ParseError::Encoding)?;
        let (path, query) = match decoded.split_once('?') {
            Some((path, query)) => (path, parse_query(query)),
            None => (decoded.as_ref(), Query::new()),
        };

        Ok(Self {
            method: (*method).to_string(),
            location: (*location).to_string(),
            path: path.to_string(),
            query,
            version: (*version).to_string(),
            ..Self::default()
        })
    }

    async fn buffer_body<R>(&mut self, reader: &mut R, limit: usize) -> Result<(), ParseError>
    where
        R: AsyncBufRead + Unpin,
    {
        let len = self.content_length()?;
        if len == 0 {
            return Ok(());
        }
        if len > limit {
            return Err(ParseError::BodyTooLarge { len, limit });
        }

        let mut body = vec![0; len];
        reader.read_exact(&mut body).await.map_err(|e| match e.kind() {
            std::io::ErrorKind::UnexpectedEof => ParseError::Eof,
            _ => ParseError::Io(e),
        })?;
        self.body = body;
        Ok(())
    }

    fn content_length(&self) -> Result<usize, ParseError> {
        let Some(value) = self.headers.get_ignore_case("Content-Length") else {
            return Ok(0);
        };
        let digits = value.trim();
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ParseError::ContentLength(value.to_string()));
        }
        digits
            .parse()
            .map_err(|_| ParseError::ContentLength(value.to_string()))
    }

    /// Look up a header by exact name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)
    }

    /// Body decoded as UTF-8 text.
    pub fn text(&self) -> Result<&str, std::str::Utf8Error> {
        std::str::from_utf8(&self.body)
    }

    /// Body decoded as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> serde_json::Result<T> {
        serde_json::from_slice(&self.body)
    }

    /// Capture group `index` of the matched route pattern (0 is the whole path).
    pub fn capture(&self, index: usize) -> Option<&str> {
        self.captures.get(index)
    }

    /// Named capture group of the matched route pattern.
    pub fn named(&self, name: &str) -> Option<&str> {
        self.captures.name(name)
    }
}

/// Split a header line on the first `:` and trim the value.
fn parse_header(line: &[u8]) -> Result<(String, String), ParseError> {
    let line = std::str::from_utf8(line).map_err(|_| ParseError::Encoding)?;
    let (name, value) = line
        .split_once(':')
        .ok_or_else(|| ParseError::Header(line.to_string()))?;
    Ok((name.to_string(), value.trim().to_string()))
}

/// Parse `a=1&b&c=3` into a query map. Later duplicates overwrite earlier ones.
pub fn parse_query(query: &str) -> Query {
    query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| match pair.split_once('=') {
            Some((key, value)) => (key.to_string(), Some(value.to_string())),
            None => (pair.to_string(), None),
        })
        .collect()
}
