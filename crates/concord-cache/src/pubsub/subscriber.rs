//! Redis Pub/Sub subscriber.
//!
//! Maintains one pub/sub connection per process, resubscribing after a
//! reconnect, and fans received messages into a broadcast channel the
//! event dispatcher consumes.

use crate::pubsub::{PubSubEvent, Room};
use futures_util::StreamExt;
use redis::Client;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, RwLock};

/// Error type for subscriber operations
#[derive(Debug, thiserror::Error)]
pub enum SubscriberError {
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Failed to parse event: {0}")]
    ParseError(#[from] serde_json::Error),

    #[error("Channel closed")]
    ChannelClosed,
}

/// Result type for subscriber operations
pub type SubscriberResult<T> = Result<T, SubscriberError>;

/// Message received from a room topic
#[derive(Debug, Clone)]
pub struct RoomMessage {
    /// Room the message was published to
    pub room: Room,
    /// Parsed event (if valid JSON)
    pub event: Option<PubSubEvent>,
    /// Raw payload
    pub payload: String,
}

impl RoomMessage {
    /// Create from a raw Redis message; unknown topics yield None
    fn from_redis(topic: &str, payload: String) -> Option<Self> {
        let room = Room::parse(topic)?;
        let event = serde_json::from_str(&payload).ok();

        Some(Self {
            room,
            event,
            payload,
        })
    }
}

/// Subscriber configuration
#[derive(Debug, Clone)]
pub struct SubscriberConfig {
    /// Redis connection URL
    pub redis_url: String,
    /// Channel buffer size for broadcast
    pub broadcast_buffer: usize,
    /// Reconnection delay in milliseconds
    pub reconnect_delay_ms: u64,
}

impl Default for SubscriberConfig {
    fn default() -> Self {
        Self {
            redis_url: "redis://127.0.0.1:6379".to_string(),
            broadcast_buffer: 1024,
            reconnect_delay_ms: 1000,
        }
    }
}

/// Commands for subscription management
#[derive(Debug)]
enum SubscriberCommand {
    Subscribe(Vec<String>),
    Unsubscribe(Vec<String>),
    Shutdown,
}

/// Redis Pub/Sub subscriber
pub struct Subscriber {
    /// Currently subscribed topics
    subscribed: Arc<RwLock<HashSet<String>>>,
    /// Broadcast sender for messages
    broadcast_tx: broadcast::Sender<RoomMessage>,
    /// Control channel for subscription management
    control_tx: mpsc::Sender<SubscriberCommand>,
}

impl Subscriber {
    /// Create a new subscriber and start the background listener
    pub fn new(config: SubscriberConfig) -> Self {
        let (broadcast_tx, _) = broadcast::channel(config.broadcast_buffer);
        let (control_tx, control_rx) = mpsc::channel(32);
        let subscribed = Arc::new(RwLock::new(HashSet::new()));

        let subscriber = Self {
            subscribed: subscribed.clone(),
            broadcast_tx: broadcast_tx.clone(),
            control_tx,
        };

        tokio::spawn(Self::listener_loop(
            config,
            subscribed,
            broadcast_tx,
            control_rx,
        ));

        subscriber
    }

    /// Background listener loop, reconnecting on error
    async fn listener_loop(
        config: SubscriberConfig,
        subscribed: Arc<RwLock<HashSet<String>>>,
        broadcast_tx: broadcast::Sender<RoomMessage>,
        mut control_rx: mpsc::Receiver<SubscriberCommand>,
    ) {
        loop {
            match Self::run_listener(&config, &subscribed, &broadcast_tx, &mut control_rx).await {
                Ok(should_stop) => {
                    if should_stop {
                        tracing::info!("Subscriber shutting down");
                        break;
                    }
                }
                Err(e) => {
                    tracing::error!(error = %e, "Subscriber error, reconnecting...");
                    tokio::time::sleep(tokio::time::Duration::from_millis(
                        config.reconnect_delay_ms,
                    ))
                    .await;
                }
            }
        }
    }

    /// Run the listener until error or shutdown
    async fn run_listener(
        config: &SubscriberConfig,
        subscribed: &Arc<RwLock<HashSet<String>>>,
        broadcast_tx: &broadcast::Sender<RoomMessage>,
        control_rx: &mut mpsc::Receiver<SubscriberCommand>,
    ) -> SubscriberResult<bool> {
        let client = Client::open(config.redis_url.as_str())?;
        let mut pubsub = client.get_async_pubsub().await?;

        // Resubscribe to everything we held before the reconnect
        {
            let topics = subscribed.read().await;
            for topic in topics.iter() {
                pubsub.subscribe(topic).await?;
            }
        }

        tracing::info!("Subscriber connected to Redis");

        let mut stream = pubsub.on_message();

        loop {
            tokio::select! {
                msg = stream.next() => {
                    match msg {
                        Some(msg) => {
                            let topic: String = msg.get_channel_name().to_string();
                            let payload: String = msg.get_payload().unwrap_or_default();

                            match RoomMessage::from_redis(&topic, payload) {
                                Some(received) => {
                                    // Send errors just mean no receivers yet
                                    let _ = broadcast_tx.send(received);
                                    tracing::trace!(topic = %topic, "Received Pub/Sub message");
                                }
                                None => {
                                    tracing::debug!(topic = %topic, "Dropping message on unknown topic");
                                }
                            }
                        }
                        None => {
                            tracing::warn!("Pub/Sub stream ended");
                            return Ok(false);
                        }
                    }
                }

                cmd = control_rx.recv() => {
                    match cmd {
                        Some(SubscriberCommand::Subscribe(topics)) => {
                            // Need to drop stream to access pubsub
                            drop(stream);
                            for topic in &topics {
                                if let Err(e) = pubsub.subscribe(topic).await {
                                    tracing::error!(topic = %topic, error = %e, "Failed to subscribe");
                                } else {
                                    subscribed.write().await.insert(topic.clone());
                                    tracing::debug!(topic = %topic, "Subscribed to topic");
                                }
                            }
                            stream = pubsub.on_message();
                        }
                        Some(SubscriberCommand::Unsubscribe(topics)) => {
                            drop(stream);
                            for topic in &topics {
                                if let Err(e) = pubsub.unsubscribe(topic).await {
                                    tracing::error!(topic = %topic, error = %e, "Failed to unsubscribe");
                                } else {
                                    subscribed.write().await.remove(topic);
                                    tracing::debug!(topic = %topic, "Unsubscribed from topic");
                                }
                            }
                            stream = pubsub.on_message();
                        }
                        Some(SubscriberCommand::Shutdown) | None => {
                            return Ok(true);
                        }
                    }
                }
            }
        }
    }

    /// Subscribe to room topics
    pub async fn subscribe(&self, rooms: &[Room]) -> SubscriberResult<()> {
        let topics: Vec<String> = rooms.iter().map(Room::name).collect();

        self.control_tx
            .send(SubscriberCommand::Subscribe(topics))
            .await
            .map_err(|_| SubscriberError::ChannelClosed)
    }

    /// Unsubscribe from room topics
    pub async fn unsubscribe(&self, rooms: &[Room]) -> SubscriberResult<()> {
        let topics: Vec<String> = rooms.iter().map(Room::name).collect();

        self.control_tx
            .send(SubscriberCommand::Unsubscribe(topics))
            .await
            .map_err(|_| SubscriberError::ChannelClosed)
    }

    /// Get a receiver for broadcast messages
    #[must_use]
    pub fn receiver(&self) -> broadcast::Receiver<RoomMessage> {
        self.broadcast_tx.subscribe()
    }

    /// Get currently subscribed topics
    pub async fn subscribed_topics(&self) -> Vec<String> {
        self.subscribed.read().await.iter().cloned().collect()
    }

    /// Shutdown the subscriber
    pub async fn shutdown(&self) -> SubscriberResult<()> {
        self.control_tx
            .send(SubscriberCommand::Shutdown)
            .await
            .map_err(|_| SubscriberError::ChannelClosed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use concord_core::Snowflake;

    #[test]
    fn test_room_message_parsing() {
        let payload = r#"{"event_type":"TEST","data":{}}"#.to_string();
        let msg = RoomMessage::from_redis("guild:12345", payload.clone()).unwrap();

        assert_eq!(msg.room, Room::Guild(Snowflake::from(12345i64)));
        assert!(msg.event.is_some());
        assert_eq!(msg.payload, payload);
    }

    #[test]
    fn test_room_message_invalid_json() {
        let msg = RoomMessage::from_redis("user:123", "invalid".to_string()).unwrap();

        assert_eq!(msg.room, Room::User(Snowflake::from(123i64)));
        assert!(msg.event.is_none());
        assert_eq!(msg.payload, "invalid");
    }

    #[test]
    fn test_room_message_unknown_topic() {
        assert!(RoomMessage::from_redis("broadcast", "{}".to_string()).is_none());
    }

    #[test]
    fn test_subscriber_config_default() {
        let config = SubscriberConfig::default();
        assert_eq!(config.redis_url, "redis://127.0.0.1:6379");
        assert_eq!(config.broadcast_buffer, 1024);
        assert_eq!(config.reconnect_delay_ms, 1000);
    }
}
