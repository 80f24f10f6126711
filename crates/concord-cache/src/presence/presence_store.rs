//! User presence storage in Redis.
//!
//! A presence record lives under a TTL'd key refreshed by the heartbeat, so
//! a process that dies without cleanup never leaks a permanent "online".
//! Guild online membership is tracked in a set per guild.

use crate::pool::{RedisPool, RedisResult};
use concord_core::Snowflake;
use serde::{Deserialize, Serialize};

/// Key prefix for user presence
const PRESENCE_PREFIX: &str = "presence:";
/// Key prefix for guild online members
const GUILD_ONLINE_PREFIX: &str = "guild_online:";

/// Presence TTL (5 minutes - refreshed by heartbeat)
pub const PRESENCE_TTL: u64 = 300;

/// User online status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    /// User is online and active
    Online,
    /// User is idle (away from keyboard)
    Idle,
    /// Do not disturb
    Dnd,
    /// User is offline (or invisible)
    Offline,
}

impl Default for UserStatus {
    fn default() -> Self {
        Self::Offline
    }
}

impl UserStatus {
    /// Check if this status should be visible to others
    #[must_use]
    pub fn is_visible(&self) -> bool {
        !matches!(self, Self::Offline)
    }
}

impl std::fmt::Display for UserStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Online => write!(f, "online"),
            Self::Idle => write!(f, "idle"),
            Self::Dnd => write!(f, "dnd"),
            Self::Offline => write!(f, "offline"),
        }
    }
}

impl std::str::FromStr for UserStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "online" => Ok(Self::Online),
            "idle" => Ok(Self::Idle),
            "dnd" => Ok(Self::Dnd),
            // Invisible is stored and broadcast as plain offline
            "offline" | "invisible" => Ok(Self::Offline),
            _ => Err(format!("Invalid status: {s}")),
        }
    }
}

/// User presence record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PresenceRecord {
    /// User ID
    pub user_id: Snowflake,
    /// Current status
    pub status: UserStatus,
    /// Gateway session that owns this record (newest wins on reconnect)
    pub session_id: String,
    /// Last update timestamp
    pub updated_at: i64,
}

impl PresenceRecord {
    /// Create a new presence record owned by a session
    #[must_use]
    pub fn new(user_id: Snowflake, status: UserStatus, session_id: String) -> Self {
        Self {
            user_id,
            status,
            session_id,
            updated_at: chrono::Utc::now().timestamp(),
        }
    }

    /// Update timestamp
    pub fn touch(&mut self) {
        self.updated_at = chrono::Utc::now().timestamp();
    }
}

/// User presence store
#[derive(Clone)]
pub struct PresenceStore {
    pool: RedisPool,
}

impl PresenceStore {
    /// Create a new presence store
    #[must_use]
    pub fn new(pool: RedisPool) -> Self {
        Self { pool }
    }

    fn presence_key(user_id: Snowflake) -> String {
        format!("{PRESENCE_PREFIX}{user_id}")
    }

    fn guild_online_key(guild_id: Snowflake) -> String {
        format!("{GUILD_ONLINE_PREFIX}{guild_id}")
    }

    /// Set user presence
    pub async fn set_presence(&self, presence: &PresenceRecord) -> RedisResult<()> {
        let key = Self::presence_key(presence.user_id);
        self.pool.set(&key, presence, Some(PRESENCE_TTL)).await?;

        tracing::debug!(
            user_id = %presence.user_id,
            status = %presence.status,
            "Set user presence"
        );

        Ok(())
    }

    /// Get user presence
    pub async fn get_presence(&self, user_id: Snowflake) -> RedisResult<Option<PresenceRecord>> {
        let key = Self::presence_key(user_id);
        self.pool.get_value(&key).await
    }

    /// Update user status, creating the record if missing
    pub async fn update_status(
        &self,
        user_id: Snowflake,
        status: UserStatus,
        session_id: &str,
    ) -> RedisResult<PresenceRecord> {
        let mut presence = match self.get_presence(user_id).await? {
            Some(mut existing) => {
                existing.status = status;
                existing.session_id = session_id.to_string();
                existing
            }
            None => PresenceRecord::new(user_id, status, session_id.to_string()),
        };
        presence.touch();
        self.set_presence(&presence).await?;
        Ok(presence)
    }

    /// Remove user presence (set offline)
    pub async fn remove_presence(&self, user_id: Snowflake) -> RedisResult<bool> {
        let key = Self::presence_key(user_id);
        self.pool.delete(&key).await
    }

    /// Refresh presence TTL (called on heartbeat)
    pub async fn refresh_presence(&self, user_id: Snowflake) -> RedisResult<bool> {
        let key = Self::presence_key(user_id);
        self.pool.expire(&key, PRESENCE_TTL).await
    }

    /// Add user to guild's online set
    pub async fn add_to_guild_online(
        &self,
        guild_id: Snowflake,
        user_id: Snowflake,
    ) -> RedisResult<()> {
        let key = Self::guild_online_key(guild_id);
        self.pool.set_add(&key, &user_id.to_string()).await
    }

    /// Remove user from guild's online set
    pub async fn remove_from_guild_online(
        &self,
        guild_id: Snowflake,
        user_id: Snowflake,
    ) -> RedisResult<()> {
        let key = Self::guild_online_key(guild_id);
        self.pool.set_remove(&key, &user_id.to_string()).await
    }

    /// Get all online users in a guild
    pub async fn get_guild_online_users(&self, guild_id: Snowflake) -> RedisResult<Vec<Snowflake>> {
        let key = Self::guild_online_key(guild_id);
        let user_ids = self.pool.set_members(&key).await?;

        let mut result = Vec::new();
        for id_str in user_ids {
            if let Ok(id) = id_str.parse::<i64>() {
                result.push(Snowflake::from(id));
            }
        }
        Ok(result)
    }

    /// Get count of online users in a guild
    pub async fn get_guild_online_count(&self, guild_id: Snowflake) -> RedisResult<u64> {
        let key = Self::guild_online_key(guild_id);
        self.pool.set_count(&key).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_status_display() {
        assert_eq!(UserStatus::Online.to_string(), "online");
        assert_eq!(UserStatus::Idle.to_string(), "idle");
        assert_eq!(UserStatus::Dnd.to_string(), "dnd");
        assert_eq!(UserStatus::Offline.to_string(), "offline");
    }

    #[test]
    fn test_user_status_parse() {
        assert_eq!("online".parse::<UserStatus>().unwrap(), UserStatus::Online);
        assert_eq!("IDLE".parse::<UserStatus>().unwrap(), UserStatus::Idle);
        assert_eq!("DnD".parse::<UserStatus>().unwrap(), UserStatus::Dnd);
        assert!("invalid".parse::<UserStatus>().is_err());
    }

    #[test]
    fn test_invisible_maps_to_offline() {
        assert_eq!(
            "invisible".parse::<UserStatus>().unwrap(),
            UserStatus::Offline
        );
    }

    #[test]
    fn test_user_status_visibility() {
        assert!(UserStatus::Online.is_visible());
        assert!(UserStatus::Idle.is_visible());
        assert!(UserStatus::Dnd.is_visible());
        assert!(!UserStatus::Offline.is_visible());
    }

    #[test]
    fn test_presence_record_creation() {
        let user_id = Snowflake::from(12345i64);
        let presence = PresenceRecord::new(user_id, UserStatus::Online, "session1".to_string());

        assert_eq!(presence.user_id, user_id);
        assert_eq!(presence.status, UserStatus::Online);
        assert_eq!(presence.session_id, "session1");
    }

    #[test]
    fn test_key_generation() {
        let user_id = Snowflake::from(12345i64);
        let guild_id = Snowflake::from(11111i64);

        assert_eq!(
            PresenceStore::presence_key(user_id),
            format!("presence:{user_id}")
        );
        assert_eq!(
            PresenceStore::guild_online_key(guild_id),
            format!("guild_online:{guild_id}")
        );
    }
}
