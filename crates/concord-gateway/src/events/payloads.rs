//! Event payload definitions
//!
//! Payloads for the dispatch events this process constructs itself.
//! Everything else arrives pre-serialized over Pub/Sub and is forwarded
//! as opaque JSON.

use concord_core::Snowflake;
use serde::{Deserialize, Serialize};

/// READY event payload
///
/// Sent after successful Identify.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadyEvent {
    /// Gateway protocol version
    pub v: i32,

    /// Authenticated user
    pub user_id: Snowflake,

    /// Session ID of this connection
    pub session_id: String,

    /// Guilds the user is a member of
    pub guild_ids: Vec<Snowflake>,
}

impl ReadyEvent {
    /// Current gateway protocol version
    pub const VERSION: i32 = 1;

    #[must_use]
    pub fn new(user_id: Snowflake, session_id: String, guild_ids: Vec<Snowflake>) -> Self {
        Self {
            v: Self::VERSION,
            user_id,
            session_id,
            guild_ids,
        }
    }
}

/// PRESENCE_UPDATE event payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PresenceEvent {
    pub user_id: Snowflake,
    pub guild_id: Snowflake,
    pub status: String,
}

/// VOICE_SERVER_UPDATE event payload
///
/// Delivered only to the joining user's sessions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoiceServerUpdateEvent {
    /// Media-session token
    pub token: String,
    /// Media server endpoint
    pub endpoint: String,
    pub guild_id: Snowflake,
    pub channel_id: Snowflake,
}
