//! Wire-level request errors.

use http::StatusCode;
use thiserror::Error;

/// Error raised while reading a request off the wire.
#[derive(Debug, Error)]
pub enum ParseError {
    /// The stream ended before a complete request was read.
    ///
    /// Covers both a clean close between requests and a truncated message.
    #[error("end of stream")]
    Eof,

    /// The request line did not contain exactly three tokens.
    #[error("malformed request line: {0:?}")]
    RequestLine(String),

    /// A header line had no `:` separator.
    #[error("malformed header line: {0:?}")]
    Header(String),

    /// Bytes that should have been UTF-8 text were not.
    #[error("request is not valid UTF-8")]
    Encoding,

    #[error("invalid Content-Length: {0:?}")]
    ContentLength(String),

    #[error("line exceeds {limit} bytes")]
    LineTooLong { limit: usize },

    #[error("more than {limit} header lines")]
    TooManyHeaders { limit: usize },

    #[error("body of {len} bytes exceeds limit of {limit} bytes")]
    BodyTooLarge { len: usize, limit: usize },

    #[error("transport error: {0}")]
    Io(#[from] std::io::Error),
}

impl ParseError {
    /// The status to answer with before closing, for faults the client caused.
    ///
    /// Returns `None` for stream exhaustion and transport errors, which end
    /// the connection without a response.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ParseError::Eof | ParseError::Io(_) => None,
            ParseError::RequestLine(_)
            | ParseError::Header(_)
            | ParseError::Encoding
            | ParseError::ContentLength(_) => Some(StatusCode::BAD_REQUEST),
            ParseError::LineTooLong { .. } | ParseError::TooManyHeaders { .. } => {
                Some(StatusCode::REQUEST_HEADER_FIELDS_TOO_LARGE)
            }
            ParseError::BodyTooLarge { .. } => Some(StatusCode::PAYLOAD_TOO_LARGE),
        }
    }
}
