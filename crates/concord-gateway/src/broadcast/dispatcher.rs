//! Event dispatcher
//!
//! Receives events from Redis Pub/Sub and re-delivers them to local
//! WebSocket connections. Every event is filtered against each session's
//! declared intents; the direct-conversation variant of an intent applies
//! when the event arrived on a channel room.

use crate::connection::ConnectionManager;
use crate::events::GatewayEventType;
use crate::permissions::PermissionService;
use crate::protocol::GatewayMessage;
use concord_cache::{PubSubEvent, Room, RoomMessage, Subscriber, SubscriberConfig, SubscriberResult};
use concord_core::Snowflake;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;

/// Event dispatcher that routes Redis Pub/Sub messages to WebSocket connections
pub struct EventDispatcher {
    /// Connection manager for local delivery
    connection_manager: Arc<ConnectionManager>,
    /// Permission service, invalidated on role and overwrite changes
    permissions: Arc<PermissionService>,
    /// Redis subscriber
    subscriber: Subscriber,
    /// Whether the dispatcher is running
    running: Arc<AtomicBool>,
}

impl EventDispatcher {
    /// Create a new event dispatcher
    #[must_use]
    pub fn new(
        config: SubscriberConfig,
        connection_manager: Arc<ConnectionManager>,
        permissions: Arc<PermissionService>,
    ) -> Self {
        Self {
            connection_manager,
            permissions,
            subscriber: Subscriber::new(config),
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Subscribe to room topics
    pub async fn subscribe(&self, rooms: &[Room]) -> SubscriberResult<()> {
        self.subscriber.subscribe(rooms).await
    }

    /// Unsubscribe from room topics
    pub async fn unsubscribe(&self, rooms: &[Room]) -> SubscriberResult<()> {
        self.subscriber.unsubscribe(rooms).await
    }

    /// Start the event dispatcher
    ///
    /// Spawns a background task that receives messages from Redis and
    /// dispatches them to the appropriate WebSocket connections.
    pub fn start(self: Arc<Self>) {
        if self.running.swap(true, Ordering::SeqCst) {
            tracing::warn!("Event dispatcher is already running");
            return;
        }

        let dispatcher = self.clone();
        tokio::spawn(async move {
            dispatcher.run().await;
        });

        tracing::info!("Event dispatcher started");
    }

    /// Stop the event dispatcher
    pub async fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
        self.subscriber.shutdown().await.ok();
        tracing::info!("Event dispatcher stopped");
    }

    /// Run the event dispatcher loop
    async fn run(&self) {
        let mut receiver = self.subscriber.receiver();

        while self.running.load(Ordering::SeqCst) {
            match receiver.recv().await {
                Ok(msg) => {
                    self.handle_message(msg).await;
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(lagged = n, "Event dispatcher lagged behind");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::warn!("Event dispatcher channel closed");
                    break;
                }
            }
        }

        self.running.store(false, Ordering::SeqCst);
        tracing::info!("Event dispatcher loop ended");
    }

    /// Handle a received message from Redis
    async fn handle_message(&self, msg: RoomMessage) {
        let Some(event) = &msg.event else {
            tracing::debug!(room = %msg.room, "Received non-event message, ignoring");
            return;
        };

        // Every deliverable event name has an intent mapping; a name this
        // gateway cannot map must not bypass the filter.
        let Some(event_type) = GatewayEventType::from_str(&event.event_type) else {
            tracing::warn!(
                room = %msg.room,
                event_type = %event.event_type,
                "Dropping event with unmapped type"
            );
            return;
        };

        if event_type.invalidates_permissions() {
            self.invalidate_permissions(event_type, event);
        }

        let direct = matches!(msg.room, Room::Channel(_));
        let required = event_type.required_intent(direct);
        let exclude_users = Self::parse_exclusions(event);

        let message = GatewayMessage::dispatch(event.event_type.clone(), 0, event.data.clone());

        let sent = self
            .connection_manager
            .send_to_room(msg.room, required, message, &exclude_users)
            .await;

        tracing::trace!(
            room = %msg.room,
            event_type = %event.event_type,
            sent = sent,
            "Event dispatched"
        );
    }

    /// Drop cached permission resolutions the event may have stale-ified
    fn invalidate_permissions(&self, event_type: GatewayEventType, event: &PubSubEvent) {
        match event_type {
            GatewayEventType::ChannelUpdate | GatewayEventType::ChannelDelete => {
                // Overwrite changes only affect the one channel
                match Self::channel_id_from_data(event) {
                    Some(channel_id) => self.permissions.invalidate_channel(channel_id),
                    None => self.permissions.invalidate_all(),
                }
            }
            // Role and member changes affect an unknown set of entries
            _ => self.permissions.invalidate_all(),
        }

        tracing::debug!(
            event_type = %event_type,
            "Invalidated permission cache"
        );
    }

    fn channel_id_from_data(event: &PubSubEvent) -> Option<Snowflake> {
        event
            .data
            .get("id")
            .or_else(|| event.data.get("channel_id"))
            .and_then(serde_json::Value::as_str)
            .and_then(|s| s.parse::<i64>().ok())
            .map(Snowflake::from)
    }

    fn parse_exclusions(event: &PubSubEvent) -> Vec<Snowflake> {
        event
            .exclude_users
            .iter()
            .filter_map(|u| u.parse::<i64>().ok())
            .map(Snowflake::from)
            .collect()
    }

    /// Check if the dispatcher is running
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

impl Drop for EventDispatcher {
    fn drop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
    }
}

impl std::fmt::Debug for EventDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventDispatcher")
            .field("running", &self.is_running())
            .finish()
    }
}
