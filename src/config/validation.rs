//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate addresses and value ranges
//! - Check path-shaped settings are absolute
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: DevelConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::DevelConfig;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("invalid {field} address {value:?}")]
    InvalidAddress { field: &'static str, value: String },

    #[error("{field} must be greater than zero")]
    Zero { field: &'static str },

    #[error("{field} entry {value:?} must start with '/'")]
    RelativePath { field: &'static str, value: String },

    #[error("{field} must not contain empty entries")]
    EmptyEntry { field: &'static str },

    #[error("silence.header {0:?} is not a valid header name")]
    InvalidHeader(String),

    #[error("{field} must be at most {max}")]
    TooLarge { field: &'static str, max: usize },
}

/// Upper bound for the in-memory report ring.
pub const MAX_RECENT_CAPACITY: usize = 10_000;

/// Validate a parsed configuration.
pub fn validate_config(config: &DevelConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.server.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field: "server.bind_address",
            value: config.server.bind_address.clone(),
        });
    }
    if config.server.request_timeout_secs == 0 {
        errors.push(ValidationError::Zero { field: "server.request_timeout_secs" });
    }
    if config.server.max_body_size == 0 {
        errors.push(ValidationError::Zero { field: "server.max_body_size" });
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidAddress {
            field: "observability.metrics_address",
            value: config.observability.metrics_address.clone(),
        });
    }

    if config.access.tokens.iter().any(|t| t.trim().is_empty()) {
        errors.push(ValidationError::EmptyEntry { field: "access.tokens" });
    }

    for prefix in &config.silence.path_prefixes {
        if !prefix.starts_with('/') {
            errors.push(ValidationError::RelativePath {
                field: "silence.path_prefixes",
                value: prefix.clone(),
            });
        }
    }
    if config.silence.user_agents.iter().any(String::is_empty) {
        errors.push(ValidationError::EmptyEntry { field: "silence.user_agents" });
    }
    if config.silence.query_flags.iter().any(String::is_empty) {
        errors.push(ValidationError::EmptyEntry { field: "silence.query_flags" });
    }
    if axum::http::HeaderName::from_bytes(config.silence.header.as_bytes()).is_err() {
        errors.push(ValidationError::InvalidHeader(config.silence.header.clone()));
    }

    if config.sinks.recent_capacity > MAX_RECENT_CAPACITY {
        errors.push(ValidationError::TooLarge {
            field: "sinks.recent_capacity",
            max: MAX_RECENT_CAPACITY,
        });
    }

    if config.admin.enabled && !config.admin.path_prefix.starts_with('/') {
        errors.push(ValidationError::RelativePath {
            field: "admin.path_prefix",
            value: config.admin.path_prefix.clone(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
