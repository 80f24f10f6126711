//! Redis Pub/Sub publisher.
//!
//! Publishes room-scoped events so every gateway process can re-deliver
//! them to its local connections.

use crate::pool::{RedisPool, RedisResult};
use crate::pubsub::Room;
use redis::AsyncCommands;
use serde::{Deserialize, Serialize};

/// Event wrapper for Pub/Sub messages
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PubSubEvent {
    /// Event type name (e.g., "MESSAGE_CREATE", "PRESENCE_UPDATE")
    pub event_type: String,
    /// Event payload
    pub data: serde_json::Value,
    /// User IDs that must not receive this event (e.g., the originator)
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub exclude_users: Vec<String>,
}

impl PubSubEvent {
    /// Create a new event
    #[must_use]
    pub fn new(event_type: impl Into<String>, data: serde_json::Value) -> Self {
        Self {
            event_type: event_type.into(),
            data,
            exclude_users: Vec::new(),
        }
    }

    /// Exclude a user from delivery
    #[must_use]
    pub fn exclude_user(mut self, user_id: impl Into<String>) -> Self {
        self.exclude_users.push(user_id.into());
        self
    }

    /// Serialize to JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Redis Pub/Sub publisher
#[derive(Clone)]
pub struct Publisher {
    pool: RedisPool,
}

impl Publisher {
    /// Create a new publisher
    #[must_use]
    pub fn new(pool: RedisPool) -> Self {
        Self { pool }
    }

    /// Publish an event to a room's topic
    pub async fn publish(&self, room: &Room, event: &PubSubEvent) -> RedisResult<u32> {
        let mut conn = self.pool.get().await?;
        let topic = room.name();
        let payload = event.to_json()?;

        let receivers: u32 = conn.publish(&topic, &payload).await?;

        tracing::debug!(
            room = %topic,
            event_type = %event.event_type,
            receivers = receivers,
            "Published event"
        );

        Ok(receivers)
    }

    /// Publish an event to several rooms
    pub async fn publish_many(&self, rooms: &[Room], event: &PubSubEvent) -> RedisResult<u32> {
        let payload = event.to_json()?;
        let mut total_receivers = 0;
        let mut conn = self.pool.get().await?;

        for room in rooms {
            let receivers: u32 = conn.publish(&room.name(), &payload).await?;
            total_receivers += receivers;
        }

        tracing::debug!(
            rooms = rooms.len(),
            event_type = %event.event_type,
            total_receivers = total_receivers,
            "Published event to multiple rooms"
        );

        Ok(total_receivers)
    }
}
