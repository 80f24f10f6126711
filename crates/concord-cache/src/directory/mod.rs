//! Directory projection module.
//!
//! Read-side adapters over the Redis projection maintained by the
//! platform's API processes.

mod redis_directory;

pub use redis_directory::{ChannelEntry, GuildEntry, MemberEntry, RedisDirectory};
