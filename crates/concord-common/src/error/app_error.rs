//! Application error types
//!
//! Process-level error handling shared across the gateway crates.

use concord_core::DomainError;
use serde::Serialize;
use std::fmt;

/// Application-wide error type
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    // Authentication errors
    #[error("Invalid token")]
    InvalidToken,

    #[error("Token expired")]
    TokenExpired,

    // Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    // Redis errors
    #[error("Cache error: {0}")]
    Cache(String),

    // Internal errors
    #[error("Internal server error")]
    Internal(#[source] anyhow::Error),

    // Domain errors
    #[error(transparent)]
    Domain(#[from] DomainError),

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),
}

impl AppError {
    /// Get error code for wire-level error payloads
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidToken => "INVALID_TOKEN",
            Self::TokenExpired => "TOKEN_EXPIRED",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Cache(_) => "CACHE_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
            Self::Config(_) => "CONFIG_ERROR",
            Self::Domain(e) => e.code(),
        }
    }

    /// Check if the failure came from infrastructure rather than the caller
    #[must_use]
    pub fn is_infrastructure(&self) -> bool {
        match self {
            Self::Cache(_) | Self::Internal(_) | Self::Config(_) => true,
            Self::Domain(e) => e.is_infrastructure(),
            _ => false,
        }
    }

    /// Create a validation error
    #[must_use]
    pub fn validation(msg: impl fmt::Display) -> Self {
        Self::Validation(msg.to_string())
    }

    /// Create an internal error from any error
    pub fn internal(err: impl Into<anyhow::Error>) -> Self {
        Self::Internal(err.into())
    }
}

/// Error payload structure for wire-level error events
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl From<&AppError> for ErrorResponse {
    fn from(err: &AppError) -> Self {
        Self {
            code: err.error_code().to_string(),
            message: err.to_string(),
            details: None,
        }
    }
}

impl From<AppError> for ErrorResponse {
    fn from(err: AppError) -> Self {
        Self::from(&err)
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use concord_core::Snowflake;

    #[test]
    fn test_error_codes() {
        assert_eq!(AppError::InvalidToken.error_code(), "INVALID_TOKEN");
        assert_eq!(
            AppError::Validation("test".to_string()).error_code(),
            "VALIDATION_ERROR"
        );
        assert_eq!(AppError::Cache("down".to_string()).error_code(), "CACHE_ERROR");
    }

    #[test]
    fn test_domain_error_code_passthrough() {
        let err = AppError::Domain(DomainError::ChannelNotFound(Snowflake::new(1)));
        assert_eq!(err.error_code(), "UNKNOWN_CHANNEL");
    }

    #[test]
    fn test_is_infrastructure() {
        assert!(AppError::Cache("down".to_string()).is_infrastructure());
        assert!(AppError::Domain(DomainError::CacheError("x".to_string())).is_infrastructure());
        assert!(!AppError::InvalidToken.is_infrastructure());
        assert!(!AppError::Domain(DomainError::NotGuildMember).is_infrastructure());
    }

    #[test]
    fn test_error_response() {
        let err = AppError::InvalidToken;
        let response = ErrorResponse::from(&err);

        assert_eq!(response.code, "INVALID_TOKEN");
        assert_eq!(response.message, "Invalid token");
        assert!(response.details.is_none());
    }
}
