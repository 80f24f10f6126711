//! Redis-backed directory projection.
//!
//! Gateway processes hold no database connection; the platform's API side
//! maintains a denormalized projection of guild, membership, channel, and
//! permission data in Redis, and these adapters implement the core
//! directory traits over it.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::pool::{RedisPool, RedisPoolError};
use concord_core::{
    ChannelDirectory, ChannelInfo, DomainError, GuildDirectory, PermissionDirectory,
    PermissionOverwrite, RepoResult, RoleRecord, Snowflake,
};

/// Key prefix for the directory projection
const DIRECTORY_PREFIX: &str = "directory:";

/// Projected guild row: owner plus the @everyone role
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuildEntry {
    pub id: Snowflake,
    pub owner_id: Snowflake,
    pub everyone: RoleRecord,
}

/// Projected membership row: the member's assigned roles
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberEntry {
    pub roles: Vec<RoleRecord>,
}

/// Projected channel row: summary, recipients (direct only), overwrites
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelEntry {
    pub info: ChannelInfo,
    #[serde(default)]
    pub recipients: Vec<Snowflake>,
    #[serde(default)]
    pub overwrites: Vec<PermissionOverwrite>,
}

fn cache_err(e: RedisPoolError) -> DomainError {
    DomainError::CacheError(e.to_string())
}

/// Directory trait implementations over the Redis projection
#[derive(Clone)]
pub struct RedisDirectory {
    pool: RedisPool,
}

impl RedisDirectory {
    /// Create a directory over the given pool
    #[must_use]
    pub fn new(pool: RedisPool) -> Self {
        Self { pool }
    }

    fn user_guilds_key(user_id: Snowflake) -> String {
        format!("{DIRECTORY_PREFIX}user:{user_id}:guilds")
    }

    fn user_channels_key(user_id: Snowflake) -> String {
        format!("{DIRECTORY_PREFIX}user:{user_id}:channels")
    }

    fn guild_key(guild_id: Snowflake) -> String {
        format!("{DIRECTORY_PREFIX}guild:{guild_id}")
    }

    fn member_key(guild_id: Snowflake, user_id: Snowflake) -> String {
        format!("{DIRECTORY_PREFIX}guild:{guild_id}:member:{user_id}")
    }

    fn channel_key(channel_id: Snowflake) -> String {
        format!("{DIRECTORY_PREFIX}channel:{channel_id}")
    }

    async fn guild_entry(&self, guild_id: Snowflake) -> RepoResult<Option<GuildEntry>> {
        self.pool
            .get_value(&Self::guild_key(guild_id))
            .await
            .map_err(cache_err)
    }

    async fn channel_entry(&self, channel_id: Snowflake) -> RepoResult<Option<ChannelEntry>> {
        self.pool
            .get_value(&Self::channel_key(channel_id))
            .await
            .map_err(cache_err)
    }
}

#[async_trait]
impl GuildDirectory for RedisDirectory {
    async fn guilds_for_user(&self, user_id: Snowflake) -> RepoResult<Vec<Snowflake>> {
        let guilds: Option<Vec<Snowflake>> = self
            .pool
            .get_value(&Self::user_guilds_key(user_id))
            .await
            .map_err(cache_err)?;
        Ok(guilds.unwrap_or_default())
    }

    async fn is_member(&self, guild_id: Snowflake, user_id: Snowflake) -> RepoResult<bool> {
        self.pool
            .exists(&Self::member_key(guild_id, user_id))
            .await
            .map_err(cache_err)
    }

    async fn guild_owner(&self, guild_id: Snowflake) -> RepoResult<Option<Snowflake>> {
        Ok(self.guild_entry(guild_id).await?.map(|g| g.owner_id))
    }
}

#[async_trait]
impl ChannelDirectory for RedisDirectory {
    async fn get_channel(&self, channel_id: Snowflake) -> RepoResult<Option<ChannelInfo>> {
        Ok(self.channel_entry(channel_id).await?.map(|c| c.info))
    }

    async fn dm_channels_for_user(&self, user_id: Snowflake) -> RepoResult<Vec<Snowflake>> {
        let channels: Option<Vec<Snowflake>> = self
            .pool
            .get_value(&Self::user_channels_key(user_id))
            .await
            .map_err(cache_err)?;
        Ok(channels.unwrap_or_default())
    }

    async fn is_dm_recipient(
        &self,
        channel_id: Snowflake,
        user_id: Snowflake,
    ) -> RepoResult<bool> {
        match self.channel_entry(channel_id).await? {
            Some(entry) => Ok(entry.recipients.contains(&user_id)),
            None => Ok(false),
        }
    }
}

#[async_trait]
impl PermissionDirectory for RedisDirectory {
    async fn everyone_role(&self, guild_id: Snowflake) -> RepoResult<Option<RoleRecord>> {
        Ok(self.guild_entry(guild_id).await?.map(|g| g.everyone))
    }

    async fn roles_for_member(
        &self,
        guild_id: Snowflake,
        user_id: Snowflake,
    ) -> RepoResult<Vec<RoleRecord>> {
        let member: Option<MemberEntry> = self
            .pool
            .get_value(&Self::member_key(guild_id, user_id))
            .await
            .map_err(cache_err)?;
        Ok(member.map(|m| m.roles).unwrap_or_default())
    }

    async fn channel_overwrites(
        &self,
        channel_id: Snowflake,
    ) -> RepoResult<Vec<PermissionOverwrite>> {
        match self.channel_entry(channel_id).await? {
            Some(entry) => Ok(entry.overwrites),
            None => Err(DomainError::ChannelNotFound(channel_id)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_generation() {
        let user_id = Snowflake::from(1i64);
        let guild_id = Snowflake::from(2i64);
        let channel_id = Snowflake::from(3i64);

        assert_eq!(
            RedisDirectory::user_guilds_key(user_id),
            "directory:user:1:guilds"
        );
        assert_eq!(RedisDirectory::guild_key(guild_id), "directory:guild:2");
        assert_eq!(
            RedisDirectory::member_key(guild_id, user_id),
            "directory:guild:2:member:1"
        );
        assert_eq!(
            RedisDirectory::channel_key(channel_id),
            "directory:channel:3"
        );
    }

    #[test]
    fn test_channel_entry_defaults() {
        // Projection rows for guild text channels omit recipients/overwrites
        let json = r#"{"info":{"id":"3","guild_id":"2","channel_type":0}}"#;
        let entry: ChannelEntry = serde_json::from_str(json).unwrap();
        assert!(entry.recipients.is_empty());
        assert!(entry.overwrites.is_empty());
    }
}
