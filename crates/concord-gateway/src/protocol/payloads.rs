//! Client payload definitions
//!
//! Defines the payload structures for client-to-server messages.

use concord_core::{Intents, Snowflake};
use serde::{Deserialize, Serialize};

/// Payload for op 10 (Hello)
///
/// Sent by the server immediately after connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HelloPayload {
    /// Heartbeat interval in milliseconds
    pub heartbeat_interval: u64,
}

impl HelloPayload {
    /// Default heartbeat interval (45 seconds)
    pub const DEFAULT_HEARTBEAT_INTERVAL: u64 = 45_000;

    /// Create a new Hello payload with default interval
    #[must_use]
    pub fn new() -> Self {
        Self {
            heartbeat_interval: Self::DEFAULT_HEARTBEAT_INTERVAL,
        }
    }

    /// Create a Hello payload with custom interval
    #[must_use]
    pub fn with_interval(heartbeat_interval: u64) -> Self {
        Self { heartbeat_interval }
    }
}

impl Default for HelloPayload {
    fn default() -> Self {
        Self::new()
    }
}

/// Payload for op 2 (Identify)
///
/// Sent by the client to authenticate the session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentifyPayload {
    /// Authentication token
    pub token: String,

    /// Declared event intents; omitted means all intents
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intents: Option<Intents>,

    /// Optional client properties
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<IdentifyProperties>,
}

impl IdentifyPayload {
    /// Effective intents for the session
    #[must_use]
    pub fn effective_intents(&self) -> Intents {
        self.intents.unwrap_or_default()
    }
}

/// Client connection properties
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentifyProperties {
    /// Operating system
    #[serde(skip_serializing_if = "Option::is_none")]
    pub os: Option<String>,

    /// Browser or client name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub browser: Option<String>,

    /// Device type
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device: Option<String>,
}

/// Payload for op 3 (Presence Update)
///
/// Sent by the client to update their online status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PresenceUpdatePayload {
    /// New status (online, idle, dnd, invisible)
    pub status: String,
}

impl PresenceUpdatePayload {
    /// Valid status values
    pub const VALID_STATUSES: &'static [&'static str] = &["online", "idle", "dnd", "invisible"];

    /// Check if the status is valid
    #[must_use]
    pub fn is_valid_status(&self) -> bool {
        Self::VALID_STATUSES.contains(&self.status.as_str())
    }
}

/// Payload for op 4 (Voice State Update)
///
/// Sent by the client to join, move, or leave a voice channel, or to
/// update mute/deaf/video/stream flags while connected.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoiceStateUpdatePayload {
    /// Guild the voice channel belongs to
    pub guild_id: Snowflake,

    /// Target voice channel; `null` means disconnect
    pub channel_id: Option<Snowflake>,

    /// Whether the user muted themselves
    #[serde(default)]
    pub self_mute: bool,

    /// Whether the user deafened themselves
    #[serde(default)]
    pub self_deaf: bool,

    /// Whether the user's camera is on
    #[serde(default)]
    pub self_video: bool,

    /// Whether the user is screen sharing
    #[serde(default)]
    pub self_stream: bool,
}

/// Payload for op 5 (Subscribe) and op 6 (Unsubscribe)
///
/// Sent by the client to join or leave rooms mid-session: guild rooms
/// (e.g. after accepting an invite) and direct-conversation rooms.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscribePayload {
    /// Guild rooms to (un)subscribe
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub guild_ids: Vec<Snowflake>,

    /// Direct-conversation channels to (un)subscribe
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub channel_ids: Vec<Snowflake>,
}
