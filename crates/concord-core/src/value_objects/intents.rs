//! Gateway intents - capability bits a connection declares at IDENTIFY
//!
//! Every outbound event type maps to exactly one required intent; a
//! connection only receives events whose required intent overlaps the
//! bitmask it declared. `ALL` is the sentinel (and the default when
//! IDENTIFY omits intents) that passes every filter.

use bitflags::bitflags;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

bitflags! {
    /// Intent flags declared by a connection at IDENTIFY time
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Intents: u32 {
        /// Guild, channel, and role lifecycle events
        const GUILDS                = 1 << 0;
        /// Member join/leave/ban events
        const GUILD_MEMBERS         = 1 << 1;
        /// Message lifecycle and reactions in guild channels
        const GUILD_MESSAGES        = 1 << 2;
        /// Typing indicators in guild channels
        const GUILD_MESSAGE_TYPING  = 1 << 3;
        /// Presence updates for guild members
        const GUILD_PRESENCES       = 1 << 4;
        /// Voice state changes
        const GUILD_VOICE_STATES    = 1 << 5;
        /// Direct message lifecycle
        const DIRECT_MESSAGES       = 1 << 6;
        /// Typing indicators in direct messages
        const DIRECT_MESSAGE_TYPING = 1 << 7;

        /// All-intents sentinel (every defined and future bit set)
        const ALL = u32::MAX;
    }
}

impl Intents {
    /// Check whether a connection declaring these intents should receive
    /// an event requiring `required`
    ///
    /// An empty requirement passes unconditionally (connection-lifecycle
    /// events). The ALL sentinel has every bit set, so it passes any filter.
    #[inline]
    pub fn covers(&self, required: Intents) -> bool {
        required.is_empty() || self.intersects(required)
    }
}

impl Default for Intents {
    fn default() -> Self {
        Intents::ALL
    }
}

impl fmt::Display for Intents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.bits())
    }
}

impl Serialize for Intents {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u32(self.bits())
    }
}

// Deserialize from number or string
impl<'de> Deserialize<'de> for Intents {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        use serde::de::{self, Visitor};

        struct IntentsVisitor;

        impl Visitor<'_> for IntentsVisitor {
            type Value = Intents;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a string or integer representing intent bits")
            }

            fn visit_i64<E>(self, value: i64) -> Result<Intents, E>
            where
                E: de::Error,
            {
                Ok(Intents::from_bits_retain(value as u32))
            }

            fn visit_u64<E>(self, value: u64) -> Result<Intents, E>
            where
                E: de::Error,
            {
                Ok(Intents::from_bits_retain(value as u32))
            }

            fn visit_str<E>(self, value: &str) -> Result<Intents, E>
            where
                E: de::Error,
            {
                value
                    .parse::<u32>()
                    .map(Intents::from_bits_retain)
                    .map_err(|_| de::Error::custom("invalid intents string"))
            }
        }

        deserializer.deserialize_any(IntentsVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intent_bit_values() {
        assert_eq!(Intents::GUILDS.bits(), 1 << 0);
        assert_eq!(Intents::GUILD_MEMBERS.bits(), 1 << 1);
        assert_eq!(Intents::GUILD_MESSAGES.bits(), 1 << 2);
        assert_eq!(Intents::GUILD_MESSAGE_TYPING.bits(), 1 << 3);
        assert_eq!(Intents::GUILD_PRESENCES.bits(), 1 << 4);
        assert_eq!(Intents::GUILD_VOICE_STATES.bits(), 1 << 5);
        assert_eq!(Intents::DIRECT_MESSAGES.bits(), 1 << 6);
        assert_eq!(Intents::DIRECT_MESSAGE_TYPING.bits(), 1 << 7);
    }

    #[test]
    fn test_all_sentinel_covers_everything() {
        let all = Intents::ALL;
        assert!(all.covers(Intents::GUILDS));
        assert!(all.covers(Intents::GUILD_PRESENCES));
        assert!(all.covers(Intents::DIRECT_MESSAGE_TYPING));
    }

    #[test]
    fn test_narrow_intents_filter() {
        let messages_only = Intents::GUILD_MESSAGES;
        assert!(messages_only.covers(Intents::GUILD_MESSAGES));
        assert!(!messages_only.covers(Intents::GUILD_PRESENCES));
        assert!(!messages_only.covers(Intents::GUILD_VOICE_STATES));
    }

    #[test]
    fn test_empty_requirement_always_covered() {
        assert!(Intents::GUILD_MESSAGES.covers(Intents::empty()));
        assert!(Intents::empty().covers(Intents::empty()));
    }

    #[test]
    fn test_default_is_all() {
        assert_eq!(Intents::default(), Intents::ALL);
    }

    #[test]
    fn test_deserialize_number() {
        let intents: Intents = serde_json::from_str("4").unwrap();
        assert!(intents.covers(Intents::GUILD_MESSAGES));
        assert!(!intents.covers(Intents::GUILDS));
    }

    #[test]
    fn test_deserialize_all_sentinel() {
        let intents: Intents = serde_json::from_str("4294967295").unwrap();
        assert_eq!(intents, Intents::ALL);
    }

    #[test]
    fn test_serialize_number() {
        let intents = Intents::GUILDS | Intents::GUILD_MESSAGES;
        let json = serde_json::to_string(&intents).unwrap();
        assert_eq!(json, "5");
    }
}
