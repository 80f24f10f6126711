//! Handler error types

use crate::protocol::CloseCode;
use concord_cache::{RedisPoolError, SubscriberError};
use concord_core::DomainError;
use thiserror::Error;

/// Handler error type
#[derive(Debug, Error)]
pub enum HandlerError {
    /// Invalid payload received
    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    /// Authentication failed
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// Not authenticated
    #[error("Not authenticated")]
    NotAuthenticated,

    /// Already authenticated
    #[error("Already authenticated")]
    AlreadyAuthenticated,

    /// Domain error (from directories or the permission resolver)
    #[error("Domain error: {0}")]
    DomainError(#[from] DomainError),

    /// Cache error
    #[error("Cache error: {0}")]
    CacheError(#[from] RedisPoolError),

    /// Pub/Sub subscription error
    #[error("Subscription error: {0}")]
    SubscriptionError(#[from] SubscriberError),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl HandlerError {
    /// Convert to a close code (if applicable)
    ///
    /// Only authentication-class failures terminate the session. Everything
    /// else returns `None`: malformed payloads, authorization and not-found
    /// outcomes, and infrastructure trouble all drop the offending request
    /// while the connection stays up.
    pub fn to_close_code(&self) -> Option<CloseCode> {
        match self {
            Self::AuthenticationFailed(_) => Some(CloseCode::AuthenticationFailed),
            Self::NotAuthenticated => Some(CloseCode::NotAuthenticated),
            Self::AlreadyAuthenticated => Some(CloseCode::AlreadyAuthenticated),
            Self::DomainError(DomainError::InvalidToken) => {
                Some(CloseCode::AuthenticationFailed)
            }
            Self::InvalidPayload(_)
            | Self::DomainError(_)
            | Self::CacheError(_)
            | Self::SubscriptionError(_)
            | Self::Internal(_) => None,
        }
    }
}

/// Handler result type
pub type HandlerResult<T> = Result<T, HandlerError>;

#[cfg(test)]
mod tests {
    use super::*;
    use concord_core::Snowflake;

    #[test]
    fn test_close_codes() {
        assert_eq!(
            HandlerError::NotAuthenticated.to_close_code(),
            Some(CloseCode::NotAuthenticated)
        );
        assert_eq!(
            HandlerError::AlreadyAuthenticated.to_close_code(),
            Some(CloseCode::AlreadyAuthenticated)
        );
        assert_eq!(
            HandlerError::AuthenticationFailed("bad token".to_string()).to_close_code(),
            Some(CloseCode::AuthenticationFailed)
        );
    }

    #[test]
    fn test_malformed_payload_keeps_connection_open() {
        let err = HandlerError::InvalidPayload("bad".to_string());
        assert_eq!(err.to_close_code(), None);
    }

    #[test]
    fn test_authorization_errors_do_not_close() {
        let err = HandlerError::DomainError(DomainError::NotGuildMember);
        assert_eq!(err.to_close_code(), None);

        let err = HandlerError::DomainError(DomainError::ChannelNotFound(Snowflake::new(1)));
        assert_eq!(err.to_close_code(), None);
    }

    #[test]
    fn test_invalid_token_closes_with_auth_failure() {
        let err = HandlerError::DomainError(DomainError::InvalidToken);
        assert_eq!(err.to_close_code(), Some(CloseCode::AuthenticationFailed));
    }

    #[test]
    fn test_infrastructure_errors_keep_connection_open() {
        let err = HandlerError::DomainError(DomainError::CacheError("down".to_string()));
        assert_eq!(err.to_close_code(), None);

        let err = HandlerError::Internal("broadcast failed".to_string());
        assert_eq!(err.to_close_code(), None);
    }
}
