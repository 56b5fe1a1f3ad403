//! Response model and serialization.
//!
//! # Responsibilities
//! - Hold status line, ordered headers and one body strategy
//! - Seed headers: `Server`, then body headers, then caller overrides
//! - Serialize the head and stream the body to the transport
//!
//! # Design Decisions
//! - Framing headers (`Content-Length`, `Transfer-Encoding`) come from the
//!   body only, so a response never carries both
//! - Default status is `HTTP/1.1 200 OK`

use std::io;

use http::StatusCode;
use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::http::body::Body;
use crate::http::headers::HeaderMap;
use crate::http::reply::Reply;

/// Value of the `Server` header.
pub const SERVER_NAME: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

pub const DEFAULT_VERSION: &str = "HTTP/1.1";

const FRAMING_HEADERS: [&str; 2] = ["Content-Length", "Transfer-Encoding"];

/// A single HTTP response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    version: String,
    code: u16,
    reason: String,
    headers: HeaderMap,
    body: Body,
}

impl Response {
    /// A `200 OK` response carrying the coerced `reply`.
    ///
    /// A reply that already is a response is returned unchanged.
    pub fn new(reply: impl Into<Reply>) -> Self {
        match reply.into() {
            Reply::Response(response) => response,
            other => Self::from_body(other.into_body()),
        }
    }

    /// A `200 OK` response with the given body.
    pub fn from_body(body: Body) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert("Server", SERVER_NAME);
        body.apply_headers(&mut headers);
        Self {
            version: DEFAULT_VERSION.to_string(),
            code: 200,
            reason: "OK".to_string(),
            headers,
            body,
        }
    }

    /// An empty response with the canonical reason phrase for `status`.
    pub fn status(status: StatusCode) -> Self {
        Self::from_body(Body::empty()).with_status(status)
    }

    pub fn not_found() -> Self {
        Self::status(StatusCode::NOT_FOUND)
    }

    pub fn internal_error() -> Self {
        Self::status(StatusCode::INTERNAL_SERVER_ERROR)
    }

    /// Set the status code with its canonical reason phrase.
    pub fn with_status(self, status: StatusCode) -> Self {
        let reason = status.canonical_reason().unwrap_or("Unknown");
        self.with_code(status.as_u16(), reason)
    }

    /// Set an arbitrary status code and reason phrase.
    pub fn with_code(mut self, code: u16, reason: impl Into<String>) -> Self {
        self.code = code;
        self.reason = reason.into();
        self
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// Set a header, overriding any value the body or defaults supplied.
    ///
    /// Framing headers are owned by the body and are ignored here.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        if FRAMING_HEADERS.iter().any(|h| h.eq_ignore_ascii_case(&name)) {
            tracing::warn!(header = %name, "Ignoring attempt to override a framing header");
            return self;
        }
        self.headers.insert(name, value);
        self
    }

    /// Set several headers at once; later ones win.
    pub fn with_headers<I, K, V>(self, headers: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        headers
            .into_iter()
            .fold(self, |response, (k, v)| response.with_header(k, v))
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn code(&self) -> u16 {
        self.code
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> &Body {
        &self.body
    }

    /// Serialize the status line and headers.
    pub fn head(&self) -> Vec<u8> {
        let mut head = format!("{} {} {}\r\n", self.version, self.code, self.reason);
        for (name, value) in self.headers.iter() {
            head.push_str(name);
            head.push_str(": ");
            head.push_str(value);
            head.push_str("\r\n");
        }
        head.push_str("\r\n");
        head.into_bytes()
    }

    /// Write the full response and flush the writer.
    pub async fn write_to<W>(&self, writer: &mut W) -> io::Result<()>
    where
        W: AsyncWrite + Unpin,
    {
        writer.write_all(&self.head()).await?;
        self.body.write_to(writer).await?;
        writer.flush().await
    }
}

impl Default for Response {
    fn default() -> Self {
        Self::from_body(Body::empty())
    }
}

impl From<Reply> for Response {
    fn from(reply: Reply) -> Self {
        Response::new(reply)
    }
}
