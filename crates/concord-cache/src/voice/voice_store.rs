//! Voice state storage in Redis.
//!
//! One TTL'd record per user plus a member set per voice channel. The
//! store holds no policy; the coordinator serializes mutations per user
//! so a record never points at more than one channel.

use crate::pool::{RedisPool, RedisPoolError};
use async_trait::async_trait;
use concord_core::{DomainError, RepoResult, Snowflake, VoiceState, VoiceStateRepository};

/// Key prefix for per-user voice state
const VOICE_USER_PREFIX: &str = "voice:user:";
/// Key prefix for channel member sets
const VOICE_CHANNEL_PREFIX: &str = "voice:channel:";

/// Voice state TTL (1 hour)
pub const VOICE_STATE_TTL: u64 = 3600;

/// Voice state store
#[derive(Clone)]
pub struct VoiceStateStore {
    pool: RedisPool,
}

impl VoiceStateStore {
    /// Create a new voice state store
    #[must_use]
    pub fn new(pool: RedisPool) -> Self {
        Self { pool }
    }

    fn user_key(user_id: Snowflake) -> String {
        format!("{VOICE_USER_PREFIX}{user_id}")
    }

    fn channel_key(channel_id: Snowflake) -> String {
        format!("{VOICE_CHANNEL_PREFIX}{channel_id}")
    }

    fn cache_err(e: RedisPoolError) -> DomainError {
        DomainError::CacheError(e.to_string())
    }
}

#[async_trait]
impl VoiceStateRepository for VoiceStateStore {
    async fn get_state(&self, user_id: Snowflake) -> RepoResult<Option<VoiceState>> {
        self.pool
            .get_value(&Self::user_key(user_id))
            .await
            .map_err(Self::cache_err)
    }

    async fn save_state(&self, state: &VoiceState) -> RepoResult<()> {
        let key = Self::user_key(state.user_id);
        self.pool
            .set(&key, state, Some(VOICE_STATE_TTL))
            .await
            .map_err(Self::cache_err)?;

        tracing::debug!(
            user_id = %state.user_id,
            channel_id = ?state.channel_id,
            "Saved voice state"
        );

        Ok(())
    }

    async fn clear_state(&self, user_id: Snowflake) -> RepoResult<bool> {
        self.pool
            .delete(&Self::user_key(user_id))
            .await
            .map_err(Self::cache_err)
    }

    async fn refresh_state(&self, user_id: Snowflake) -> RepoResult<bool> {
        self.pool
            .expire(&Self::user_key(user_id), VOICE_STATE_TTL)
            .await
            .map_err(Self::cache_err)
    }

    async fn add_to_channel(&self, channel_id: Snowflake, user_id: Snowflake) -> RepoResult<()> {
        self.pool
            .set_add(&Self::channel_key(channel_id), &user_id.to_string())
            .await
            .map_err(Self::cache_err)
    }

    async fn remove_from_channel(
        &self,
        channel_id: Snowflake,
        user_id: Snowflake,
    ) -> RepoResult<()> {
        self.pool
            .set_remove(&Self::channel_key(channel_id), &user_id.to_string())
            .await
            .map_err(Self::cache_err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_generation() {
        let user_id = Snowflake::from(12345i64);
        let channel_id = Snowflake::from(67890i64);

        assert_eq!(
            VoiceStateStore::user_key(user_id),
            format!("voice:user:{user_id}")
        );
        assert_eq!(
            VoiceStateStore::channel_key(channel_id),
            format!("voice:channel:{channel_id}")
        );
    }
}
