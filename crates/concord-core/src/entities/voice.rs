//! Voice-channel occupancy record

use serde::{Deserialize, Serialize};

use crate::value_objects::Snowflake;

/// A user's voice-channel occupancy and flags
///
/// A user holds at most one of these at a time; the coordinator
/// serializes mutations so the record never points at two channels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoiceState {
    pub user_id: Snowflake,
    pub guild_id: Snowflake,
    /// None means the user left voice (used in the departure broadcast)
    pub channel_id: Option<Snowflake>,
    /// Gateway session the state belongs to
    pub session_id: String,
    pub self_mute: bool,
    pub self_deaf: bool,
    pub self_video: bool,
    pub self_stream: bool,
    pub updated_at: i64,
}

impl VoiceState {
    /// Create a voice state for a channel join
    #[must_use]
    pub fn joined(
        user_id: Snowflake,
        guild_id: Snowflake,
        channel_id: Snowflake,
        session_id: String,
    ) -> Self {
        Self {
            user_id,
            guild_id,
            channel_id: Some(channel_id),
            session_id,
            self_mute: false,
            self_deaf: false,
            self_video: false,
            self_stream: false,
            updated_at: chrono::Utc::now().timestamp(),
        }
    }

    /// Set the self flags; deafening forces mute
    pub fn set_flags(&mut self, mute: bool, deaf: bool, video: bool, stream: bool) {
        self.self_deaf = deaf;
        self.self_mute = mute || deaf;
        self.self_video = video;
        self.self_stream = stream;
        self.updated_at = chrono::Utc::now().timestamp();
    }

    /// The state broadcast when this user leaves voice
    #[must_use]
    pub fn departed(&self) -> Self {
        let mut state = self.clone();
        state.channel_id = None;
        state.updated_at = chrono::Utc::now().timestamp();
        state
    }
}
