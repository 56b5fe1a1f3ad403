//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (limits > 0, prefix shape, addresses parse)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ServerConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::ServerConfig;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("listener.address must not be empty")]
    EmptyAddress,

    #[error("{field} must be greater than zero")]
    Zero { field: &'static str },

    #[error("files.url_prefix {0:?} must be empty or start with '/' and not end with '/'")]
    UrlPrefix(String),

    #[error("files.doc_path {0:?} must start with '/'")]
    DocPath(String),

    #[error("observability.log_level {0:?} is not one of trace, debug, info, warn, error")]
    LogLevel(String),

    #[error("observability.metrics_address {0:?} is not a socket address")]
    MetricsAddress(String),
}

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Check `config` and collect every problem found.
pub fn validate_config(config: &ServerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.address.trim().is_empty() {
        errors.push(ValidationError::EmptyAddress);
    }

    let positive = [
        ("listener.max_connections", config.listener.max_connections),
        ("files.chunk_size", config.files.chunk_size),
        ("limits.max_line_bytes", config.limits.max_line_bytes),
        ("limits.max_headers", config.limits.max_headers),
    ];
    for (field, value) in positive {
        if value == 0 {
            errors.push(ValidationError::Zero { field });
        }
    }

    let prefix = &config.files.url_prefix;
    if !prefix.is_empty() && (!prefix.starts_with('/') || prefix.ends_with('/')) {
        errors.push(ValidationError::UrlPrefix(prefix.clone()));
    }

    if let Some(doc) = &config.files.doc_path {
        if !doc.starts_with('/') {
            errors.push(ValidationError::DocPath(doc.clone()));
        }
    }

    let level = config.observability.log_level.to_ascii_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        errors.push(ValidationError::LogLevel(config.observability.log_level.clone()));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::MetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert_eq!(validate_config(&ServerConfig::default()), Ok(()));
    }

    #[test]
    fn reports_every_problem() {
        let mut config = ServerConfig::default();
        config.listener.address = " ".into();
        config.files.chunk_size = 0;
        config.limits.max_headers = 0;
        config.files.url_prefix = "static/".into();
        config.observability.log_level = "loud".into();

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![
                ValidationError::EmptyAddress,
                ValidationError::Zero { field: "files.chunk_size" },
                ValidationError::Zero { field: "limits.max_headers" },
                ValidationError::UrlPrefix("static/".into()),
                ValidationError::LogLevel("loud".into()),
            ]
        );
    }

    #[test]
    fn metrics_address_checked_only_when_enabled() {
        let mut config = ServerConfig::default();
        config.observability.metrics_address = "nowhere".into();
        assert!(validate_config(&config).is_ok());

        config.observability.metrics_enabled = true;
        assert_eq!(
            validate_config(&config),
            Err(vec![ValidationError::MetricsAddress("nowhere".into())])
        );
    }

    #[test]
    fn prefix_and_doc_path_shapes() {
        let mut config = ServerConfig::default();
        config.files.url_prefix = "/static".into();
        config.files.doc_path = Some("/doc".into());
        assert!(validate_config(&config).is_ok());

        config.files.doc_path = Some("doc".into());
        assert_eq!(
            validate_config(&config),
            Err(vec![ValidationError::DocPath("doc".into())])
        );
    }
}
