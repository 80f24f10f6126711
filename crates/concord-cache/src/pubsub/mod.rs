//! Redis Pub/Sub module.
//!
//! Cross-process event distribution with one topic per room.

mod publisher;
mod rooms;
mod subscriber;

pub use publisher::{PubSubEvent, Publisher};
pub use rooms::{Room, CHANNEL_ROOM_PREFIX, GUILD_ROOM_PREFIX, USER_ROOM_PREFIX};
pub use subscriber::{
    RoomMessage, Subscriber, SubscriberConfig, SubscriberError, SubscriberResult,
};
