//! Channel summary as exposed by the channel directory

use serde::{Deserialize, Serialize};

use crate::value_objects::Snowflake;

/// Channel type enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[repr(u8)]
pub enum ChannelType {
    /// Guild text channel
    #[default]
    GuildText = 0,
    /// Direct message between two users
    Dm = 1,
    /// Guild voice channel
    GuildVoice = 2,
    /// Group direct message
    GroupDm = 3,
    /// Guild category for organizing channels
    GuildCategory = 4,
    /// Stage channel (voice with speaker roles)
    GuildStage = 5,
}

impl ChannelType {
    /// Get the numeric value
    #[inline]
    #[must_use]
    pub fn as_i16(self) -> i16 {
        self as i16
    }

    /// Voice-capable channel types accept voice-state joins
    #[inline]
    #[must_use]
    pub fn is_voice(self) -> bool {
        matches!(self, Self::GuildVoice | Self::GuildStage)
    }

    /// Direct conversations live outside any guild
    #[inline]
    #[must_use]
    pub fn is_direct(self) -> bool {
        matches!(self, Self::Dm | Self::GroupDm)
    }
}

impl From<i16> for ChannelType {
    fn from(value: i16) -> Self {
        match value {
            1 => Self::Dm,
            2 => Self::GuildVoice,
            3 => Self::GroupDm,
            4 => Self::GuildCategory,
            5 => Self::GuildStage,
            _ => Self::GuildText, // Default for 0 and unknown values
        }
    }
}

impl From<ChannelType> for i16 {
    fn from(ct: ChannelType) -> Self {
        ct as i16
    }
}

/// The slice of a channel the gateway needs: where it lives and what it is
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelInfo {
    pub id: Snowflake,
    pub guild_id: Option<Snowflake>,
    pub channel_type: ChannelType,
}

impl ChannelInfo {
    /// Create a guild channel summary
    #[must_use]
    pub fn guild(id: Snowflake, guild_id: Snowflake, channel_type: ChannelType) -> Self {
        Self {
            id,
            guild_id: Some(guild_id),
            channel_type,
        }
    }

    /// Create a direct-conversation channel summary
    #[must_use]
    pub fn direct(id: Snowflake, channel_type: ChannelType) -> Self {
        Self {
            id,
            guild_id: None,
            channel_type,
        }
    }

    /// Check if this is a voice-capable channel
    #[inline]
    #[must_use]
    pub fn is_voice(&self) -> bool {
        self.channel_type.is_voice()
    }

    /// Check if this is a direct conversation (DM or group DM)
    #[inline]
    #[must_use]
    pub fn is_direct(&self) -> bool {
        self.channel_type.is_direct()
    }

    /// Check if this channel belongs to a guild
    #[inline]
    #[must_use]
    pub fn is_guild_channel(&self) -> bool {
        self.guild_id.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_type_from_i16() {
        assert_eq!(ChannelType::from(0), ChannelType::GuildText);
        assert_eq!(ChannelType::from(1), ChannelType::Dm);
        assert_eq!(ChannelType::from(2), ChannelType::GuildVoice);
        assert_eq!(ChannelType::from(5), ChannelType::GuildStage);
        assert_eq!(ChannelType::from(99), ChannelType::GuildText); // Unknown defaults to text
    }

    #[test]
    fn test_voice_capable_types() {
        assert!(ChannelType::GuildVoice.is_voice());
        assert!(ChannelType::GuildStage.is_voice());
        assert!(!ChannelType::GuildText.is_voice());
        assert!(!ChannelType::Dm.is_voice());
    }

    #[test]
    fn test_guild_channel_info() {
        let info = ChannelInfo::guild(
            Snowflake::new(1),
            Snowflake::new(100),
            ChannelType::GuildVoice,
        );
        assert!(info.is_voice());
        assert!(info.is_guild_channel());
        assert!(!info.is_direct());
    }

    #[test]
    fn test_dm_channel_info() {
        let info = ChannelInfo::direct(Snowflake::new(1), ChannelType::Dm);
        assert!(info.is_direct());
        assert!(!info.is_guild_channel());
        assert!(!info.is_voice());
    }
}
