//! Request size limits.
//!
//! # Responsibilities
//! - Cap the length of a single request or header line
//! - Cap the number of header lines
//! - Cap the buffered body size
//!
//! # Design Decisions
//! - Limits are checked while reading, before anything is buffered past them
//! - Violations are answered with 431 (line/header) or 413 (body), then the
//!   connection is closed

use crate::config::LimitsConfig;

/// Limits applied by the request parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestLimits {
    pub max_line_bytes: usize,
    pub max_headers: usize,
    pub max_body_bytes: usize,
}

impl Default for RequestLimits {
    fn default() -> Self {
        Self::from(&LimitsConfig::default())
    }
}

impl From<&LimitsConfig> for RequestLimits {
    fn from(config: &LimitsConfig) -> Self {
        Self {
            max_line_bytes: config.max_line_bytes,
            max_headers: config.max_headers,
            max_body_bytes: config.max_body_bytes,
        }
    }
}
