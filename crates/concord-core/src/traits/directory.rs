//! Directory traits (ports) - contracts to out-of-scope collaborators
//!
//! The gateway core defines what it needs from the account store, the
//! guild/channel directory, the permission data source, and the media
//! signaling side; those systems provide the implementations.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::entities::{ChannelInfo, PermissionOverwrite, RoleRecord};
use crate::error::DomainError;
use crate::value_objects::Snowflake;

/// Result type for directory operations
pub type RepoResult<T> = Result<T, DomainError>;

// ============================================================================
// Credential Verifier
// ============================================================================

#[async_trait]
pub trait CredentialVerifier: Send + Sync {
    /// Verify an opaque session credential
    ///
    /// Returns the authenticated user id, or `None` when the credential is
    /// invalid or expired. `Err` is reserved for infrastructure failure.
    async fn verify(&self, token: &str) -> RepoResult<Option<Snowflake>>;
}

// ============================================================================
// Guild Directory
// ============================================================================

#[async_trait]
pub trait GuildDirectory: Send + Sync {
    /// List all guilds a user is a member of
    async fn guilds_for_user(&self, user_id: Snowflake) -> RepoResult<Vec<Snowflake>>;

    /// Check if a user is a member of a guild
    async fn is_member(&self, guild_id: Snowflake, user_id: Snowflake) -> RepoResult<bool>;

    /// Get the owner of a guild
    async fn guild_owner(&self, guild_id: Snowflake) -> RepoResult<Option<Snowflake>>;
}

// ============================================================================
// Channel Directory
// ============================================================================

#[async_trait]
pub trait ChannelDirectory: Send + Sync {
    /// Find a channel summary by id
    async fn get_channel(&self, channel_id: Snowflake) -> RepoResult<Option<ChannelInfo>>;

    /// List all direct-conversation channels for a user
    async fn dm_channels_for_user(&self, user_id: Snowflake) -> RepoResult<Vec<Snowflake>>;

    /// Check if a user is a recipient of a direct conversation
    async fn is_dm_recipient(
        &self,
        channel_id: Snowflake,
        user_id: Snowflake,
    ) -> RepoResult<bool>;
}

// ============================================================================
// Permission Directory
// ============================================================================

#[async_trait]
pub trait PermissionDirectory: Send + Sync {
    /// Get the @everyone role of a guild
    async fn everyone_role(&self, guild_id: Snowflake) -> RepoResult<Option<RoleRecord>>;

    /// List the roles assigned to a member (excluding @everyone)
    async fn roles_for_member(
        &self,
        guild_id: Snowflake,
        user_id: Snowflake,
    ) -> RepoResult<Vec<RoleRecord>>;

    /// List the permission overwrites of a channel
    async fn channel_overwrites(
        &self,
        channel_id: Snowflake,
    ) -> RepoResult<Vec<PermissionOverwrite>>;
}

// ============================================================================
// Call Token Issuer
// ============================================================================

/// Grant returned by the media signaling side for a voice session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallToken {
    /// Opaque token the client presents to the media server
    pub token: String,
    /// Media server endpoint to connect to
    pub endpoint: String,
}

#[async_trait]
pub trait CallTokenIssuer: Send + Sync {
    /// Issue a media-session token for a user joining a voice channel
    async fn issue(
        &self,
        user_id: Snowflake,
        channel_id: Snowflake,
        guild_id: Snowflake,
    ) -> RepoResult<CallToken>;
}
