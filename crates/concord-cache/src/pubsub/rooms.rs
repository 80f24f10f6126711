//! Fan-out rooms.
//!
//! A room is a broadcast scope (guild, user, or channel). Its wire name
//! doubles as the Redis Pub/Sub topic, so cross-process routing and local
//! membership indexing speak the same vocabulary.

use concord_core::Snowflake;

/// Topic prefix for guild rooms
pub const GUILD_ROOM_PREFIX: &str = "guild:";
/// Topic prefix for user rooms
pub const USER_ROOM_PREFIX: &str = "user:";
/// Topic prefix for channel rooms (direct conversations)
pub const CHANNEL_ROOM_PREFIX: &str = "channel:";

/// A broadcast scope
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Room {
    /// All members of a guild
    Guild(Snowflake),
    /// All sessions of a single user
    User(Snowflake),
    /// Recipients of a direct conversation
    Channel(Snowflake),
}

impl Room {
    /// Create a guild room
    #[must_use]
    pub fn guild(guild_id: Snowflake) -> Self {
        Self::Guild(guild_id)
    }

    /// Create a user room
    #[must_use]
    pub fn user(user_id: Snowflake) -> Self {
        Self::User(user_id)
    }

    /// Create a channel room
    #[must_use]
    pub fn channel(channel_id: Snowflake) -> Self {
        Self::Channel(channel_id)
    }

    /// Get the wire name (also the Redis topic)
    #[must_use]
    pub fn name(&self) -> String {
        match self {
            Self::Guild(id) => format!("{GUILD_ROOM_PREFIX}{id}"),
            Self::User(id) => format!("{USER_ROOM_PREFIX}{id}"),
            Self::Channel(id) => format!("{CHANNEL_ROOM_PREFIX}{id}"),
        }
    }

    /// Parse a wire name back to a room
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        if let Some(id_str) = name.strip_prefix(GUILD_ROOM_PREFIX) {
            return id_str.parse::<i64>().ok().map(|id| Self::Guild(Snowflake::from(id)));
        }

        if let Some(id_str) = name.strip_prefix(USER_ROOM_PREFIX) {
            return id_str.parse::<i64>().ok().map(|id| Self::User(Snowflake::from(id)));
        }

        if let Some(id_str) = name.strip_prefix(CHANNEL_ROOM_PREFIX) {
            return id_str.parse::<i64>().ok().map(|id| Self::Channel(Snowflake::from(id)));
        }

        None
    }
}

impl std::fmt::Display for Room {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_room_names() {
        let guild_id = Snowflake::from(12345i64);
        let user_id = Snowflake::from(11111i64);
        let channel_id = Snowflake::from(67890i64);

        assert_eq!(Room::guild(guild_id).name(), "guild:12345");
        assert_eq!(Room::user(user_id).name(), "user:11111");
        assert_eq!(Room::channel(channel_id).name(), "channel:67890");
    }

    #[test]
    fn test_room_parse() {
        assert_eq!(
            Room::parse("guild:12345"),
            Some(Room::Guild(Snowflake::from(12345i64)))
        );
        assert_eq!(
            Room::parse("user:11111"),
            Some(Room::User(Snowflake::from(11111i64)))
        );
        assert_eq!(
            Room::parse("channel:67890"),
            Some(Room::Channel(Snowflake::from(67890i64)))
        );
    }

    #[test]
    fn test_room_parse_rejects_unknown() {
        assert_eq!(Room::parse("broadcast"), None);
        assert_eq!(Room::parse("guild:not-a-number"), None);
        assert_eq!(Room::parse("unknown:123"), None);
    }

    #[test]
    fn test_round_trip() {
        let room = Room::guild(Snowflake::from(42i64));
        assert_eq!(Room::parse(&room.name()), Some(room));
    }
}
