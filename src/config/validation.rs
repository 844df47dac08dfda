//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Required keys are present and non-empty
//! - Value ranges (payload limit > 0)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ServerConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use thiserror::Error;

use crate::config::schema::ServerConfig;

/// A single semantic problem with a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("missing required key `{0}`")]
    MissingKey(&'static str),

    #[error("`{0}` must not be empty")]
    Empty(&'static str),

    #[error("`{0}` must be greater than zero")]
    NotPositive(&'static str),
}

/// Check a parsed config before it is used to start a server.
pub fn validate_config(config: &ServerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.dataset_path.as_os_str().is_empty() {
        errors.push(ValidationError::MissingKey("linuxpath"));
    }
    if config.host.trim().is_empty() {
        errors.push(ValidationError::Empty("host"));
    }
    if config.max_payload == 0 {
        errors.push(ValidationError::NotPositive("max_payload"));
    }
    if config.use_ssl {
        if config.cert_path.as_os_str().is_empty() {
            errors.push(ValidationError::Empty("ssl_cert"));
        }
        if config.key_path.as_os_str().is_empty() {
            errors.push(ValidationError::Empty("ssl_key"));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Render a list of problems as one comma-separated line.
pub fn describe_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
