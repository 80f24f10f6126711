//! Domain errors - error types for the domain layer

use thiserror::Error;

use crate::value_objects::Snowflake;

/// Domain layer errors
#[derive(Debug, Error)]
pub enum DomainError {
    // =========================================================================
    // Not Found Errors
    // =========================================================================
    #[error("User not found: {0}")]
    UserNotFound(Snowflake),

    #[error("Guild not found: {0}")]
    GuildNotFound(Snowflake),

    #[error("Channel not found: {0}")]
    ChannelNotFound(Snowflake),

    #[error("Role not found: {0}")]
    RoleNotFound(Snowflake),

    #[error("Member not found in guild")]
    MemberNotFound,

    // =========================================================================
    // Authentication / Authorization Errors
    // =========================================================================
    #[error("Invalid or expired credential")]
    InvalidToken,

    #[error("Missing permission: {0}")]
    MissingPermission(String),

    #[error("Not a member of this guild")]
    NotGuildMember,

    #[error("Not a recipient of this conversation")]
    NotDmRecipient,

    // =========================================================================
    // Business Rule Violations
    // =========================================================================
    #[error("Channel does not support voice: {0}")]
    NotVoiceChannel(Snowflake),

    #[error("Validation error: {0}")]
    ValidationError(String),

    // =========================================================================
    // Infrastructure Errors (wrapped)
    // =========================================================================
    #[error("Cache error: {0}")]
    CacheError(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl DomainError {
    /// Get an error code string for wire-level error payloads
    pub fn code(&self) -> &'static str {
        match self {
            // Not Found
            Self::UserNotFound(_) => "UNKNOWN_USER",
            Self::GuildNotFound(_) => "UNKNOWN_GUILD",
            Self::ChannelNotFound(_) => "UNKNOWN_CHANNEL",
            Self::RoleNotFound(_) => "UNKNOWN_ROLE",
            Self::MemberNotFound => "UNKNOWN_MEMBER",

            // Authentication / Authorization
            Self::InvalidToken => "INVALID_TOKEN",
            Self::MissingPermission(_) => "MISSING_PERMISSIONS",
            Self::NotGuildMember => "NOT_GUILD_MEMBER",
            Self::NotDmRecipient => "NOT_DM_RECIPIENT",

            // Business Rules
            Self::NotVoiceChannel(_) => "NOT_VOICE_CHANNEL",
            Self::ValidationError(_) => "VALIDATION_ERROR",

            // Infrastructure
            Self::CacheError(_) => "CACHE_ERROR",
            Self::InternalError(_) => "INTERNAL_ERROR",
        }
    }

    /// Check if this is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::UserNotFound(_)
                | Self::GuildNotFound(_)
                | Self::ChannelNotFound(_)
                | Self::RoleNotFound(_)
                | Self::MemberNotFound
        )
    }

    /// Check if this is an authorization error
    pub fn is_authorization(&self) -> bool {
        matches!(
            self,
            Self::MissingPermission(_) | Self::NotGuildMember | Self::NotDmRecipient
        )
    }

    /// Check if this is an infrastructure failure rather than a domain outcome
    pub fn is_infrastructure(&self) -> bool {
        matches!(self, Self::CacheError(_) | Self::InternalError(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let err = DomainError::ChannelNotFound(Snowflake::new(1));
        assert_eq!(err.code(), "UNKNOWN_CHANNEL");

        let err = DomainError::MissingPermission("CONNECT".to_string());
        assert_eq!(err.code(), "MISSING_PERMISSIONS");
    }

    #[test]
    fn test_is_not_found() {
        assert!(DomainError::UserNotFound(Snowflake::new(1)).is_not_found());
        assert!(DomainError::GuildNotFound(Snowflake::new(1)).is_not_found());
        assert!(!DomainError::InvalidToken.is_not_found());
    }

    #[test]
    fn test_is_authorization() {
        assert!(DomainError::NotGuildMember.is_authorization());
        assert!(DomainError::MissingPermission("test".to_string()).is_authorization());
        assert!(!DomainError::ChannelNotFound(Snowflake::new(1)).is_authorization());
    }

    #[test]
    fn test_is_infrastructure() {
        assert!(DomainError::CacheError("down".to_string()).is_infrastructure());
        assert!(!DomainError::NotGuildMember.is_infrastructure());
    }

    #[test]
    fn test_error_display() {
        let err = DomainError::ChannelNotFound(Snowflake::new(123));
        assert_eq!(err.to_string(), "Channel not found: 123");
    }
}
