//! Channel permission resolution service
//!
//! Fetches the resolution context from the directories, runs the pure
//! resolver, and memoizes the result for a few seconds. The cache absorbs
//! bursts (typing, rapid messages) without letting stale grants live long;
//! role and overwrite events invalidate affected entries eagerly.

use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;

use concord_core::{
    resolve, ChannelDirectory, DomainError, GuildDirectory, PermissionContext,
    PermissionDirectory, Permissions, RepoResult, Snowflake,
};

/// How long a resolved permission set stays valid
pub const PERMISSION_CACHE_TTL: Duration = Duration::from_secs(5);

struct CacheEntry {
    permissions: Permissions,
    expires_at: Instant,
}

/// Permission resolver with a short-TTL memo over (user, channel)
pub struct PermissionService {
    guilds: Arc<dyn GuildDirectory>,
    channels: Arc<dyn ChannelDirectory>,
    permissions: Arc<dyn PermissionDirectory>,
    cache: DashMap<(Snowflake, Snowflake), CacheEntry>,
    ttl: Duration,
}

impl PermissionService {
    /// Create a new permission service
    pub fn new(
        guilds: Arc<dyn GuildDirectory>,
        channels: Arc<dyn ChannelDirectory>,
        permissions: Arc<dyn PermissionDirectory>,
    ) -> Self {
        Self {
            guilds,
            channels,
            permissions,
            cache: DashMap::new(),
            ttl: PERMISSION_CACHE_TTL,
        }
    }

    /// Create a service with a custom cache TTL
    pub fn with_ttl(
        guilds: Arc<dyn GuildDirectory>,
        channels: Arc<dyn ChannelDirectory>,
        permissions: Arc<dyn PermissionDirectory>,
        ttl: Duration,
    ) -> Self {
        Self {
            guilds,
            channels,
            permissions,
            cache: DashMap::new(),
            ttl,
        }
    }

    /// Resolve a user's effective permissions for a channel
    ///
    /// Direct conversations bypass the guild algorithm: recipients hold
    /// all bits, non-recipients are rejected.
    pub async fn resolve_channel(
        &self,
        user_id: Snowflake,
        channel_id: Snowflake,
    ) -> RepoResult<Permissions> {
        if let Some(entry) = self.cache.get(&(user_id, channel_id)) {
            if entry.expires_at > Instant::now() {
                return Ok(entry.permissions);
            }
        }

        let channel = self
            .channels
            .get_channel(channel_id)
            .await?
            .ok_or(DomainError::ChannelNotFound(channel_id))?;

        let permissions = if channel.is_direct() {
            if self.channels.is_dm_recipient(channel_id, user_id).await? {
                Permissions::ALL
            } else {
                return Err(DomainError::NotDmRecipient);
            }
        } else {
            let guild_id = channel
                .guild_id
                .ok_or(DomainError::ChannelNotFound(channel_id))?;
            self.resolve_guild_channel(user_id, guild_id, channel_id).await?
        };

        self.cache.insert(
            (user_id, channel_id),
            CacheEntry {
                permissions,
                expires_at: Instant::now() + self.ttl,
            },
        );

        Ok(permissions)
    }

    /// Require specific permissions on a channel
    ///
    /// Returns the full effective set on success so callers can make
    /// further checks without a second resolution.
    pub async fn require(
        &self,
        user_id: Snowflake,
        channel_id: Snowflake,
        required: Permissions,
    ) -> RepoResult<Permissions> {
        let effective = self.resolve_channel(user_id, channel_id).await?;

        if effective.has_all(required) {
            Ok(effective)
        } else {
            Err(DomainError::MissingPermission(format!("{required:?}")))
        }
    }

    async fn resolve_guild_channel(
        &self,
        user_id: Snowflake,
        guild_id: Snowflake,
        channel_id: Snowflake,
    ) -> RepoResult<Permissions> {
        if !self.guilds.is_member(guild_id, user_id).await? {
            return Err(DomainError::NotGuildMember);
        }

        let owner_id = self
            .guilds
            .guild_owner(guild_id)
            .await?
            .ok_or(DomainError::GuildNotFound(guild_id))?;

        let everyone = self
            .permissions
            .everyone_role(guild_id)
            .await?
            .ok_or(DomainError::GuildNotFound(guild_id))?;

        let roles = self.permissions.roles_for_member(guild_id, user_id).await?;
        let overwrites = self.permissions.channel_overwrites(channel_id).await?;

        let ctx = PermissionContext {
            guild_id,
            owner_id,
            user_id,
            everyone: everyone.permissions,
            roles,
            overwrites,
        };

        Ok(resolve(&ctx))
    }

    /// Drop all cached resolutions for a user
    pub fn invalidate_user(&self, user_id: Snowflake) {
        self.cache.retain(|(uid, _), _| *uid != user_id);
    }

    /// Drop all cached resolutions for a channel
    pub fn invalidate_channel(&self, channel_id: Snowflake) {
        self.cache.retain(|(_, cid), _| *cid != channel_id);
    }

    /// Drop every cached resolution
    ///
    /// Role and guild-wide events affect an unknown set of entries, so
    /// the whole memo goes. Entries rebuild on next access.
    pub fn invalidate_all(&self) {
        self.cache.clear();
    }

    /// Number of live cache entries (including expired, until touched)
    pub fn cached_entries(&self) -> usize {
        self.cache.len()
    }
}

impl std::fmt::Debug for PermissionService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PermissionService")
            .field("cached_entries", &self.cache.len())
            .field("ttl", &self.ttl)
            .finish()
    }
}
