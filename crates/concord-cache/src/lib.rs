//! # concord-cache
//!
//! Redis layer for the realtime gateway: presence, voice state, pub/sub
//! fan-out, and the directory projection.
//!
//! ## Features
//!
//! - **Connection Pool**: Managed Redis connection pool with deadpool
//! - **Presence**: User online status with per-guild online sets
//! - **Voice**: Voice state storage with channel occupancy sets
//! - **Pub/Sub**: Room-scoped event distribution across gateway processes
//! - **Directory**: Read-side guild/channel/permission projection
//!
//! ## Example
//!
//! ```ignore
//! use concord_cache::{PresenceStore, PubSubEvent, Publisher, RedisPool, RedisPoolConfig, Room};
//!
//! // Create Redis pool
//! let config = RedisPoolConfig::default();
//! let pool = RedisPool::new(config)?;
//!
//! // Create stores
//! let presence_store = PresenceStore::new(pool.clone());
//! let publisher = Publisher::new(pool.clone());
//!
//! // Mark a user online
//! let record = PresenceRecord::new(user_id, UserStatus::Online, session_id);
//! presence_store.set_presence(&record).await?;
//!
//! // Publish event
//! let event = PubSubEvent::new("PRESENCE_UPDATE", data);
//! publisher.publish(&Room::guild(guild_id), &event).await?;
//! ```

pub mod directory;
pub mod pool;
pub mod presence;
pub mod pubsub;
pub mod voice;

// Re-export pool types
pub use pool::{
    create_shared_pool, RedisPool, RedisPoolConfig, RedisPoolError, RedisResult, SharedRedisPool,
};

// Re-export presence types
pub use presence::{PresenceRecord, PresenceStore, UserStatus, PRESENCE_TTL};

// Re-export voice types
pub use voice::{VoiceStateStore, VOICE_STATE_TTL};

// Re-export pubsub types
pub use pubsub::{
    PubSubEvent, Publisher, Room, RoomMessage, Subscriber, SubscriberConfig, SubscriberError,
    SubscriberResult, CHANNEL_ROOM_PREFIX, GUILD_ROOM_PREFIX, USER_ROOM_PREFIX,
};

// Re-export directory types
pub use directory::{ChannelEntry, GuildEntry, MemberEntry, RedisDirectory};
