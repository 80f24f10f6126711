//! Presence update handler (op 3)

use super::{HandlerError, HandlerResult};
use crate::connection::Connection;
use crate::events::{GatewayEventType, PresenceEvent};
use crate::protocol::{CloseCode, PresenceUpdatePayload};
use crate::server::GatewayState;
use concord_cache::{PubSubEvent, Room, UserStatus};
use std::sync::Arc;

/// Handles Presence Update messages
pub struct PresenceHandler;

impl PresenceHandler {
    /// Handle a Presence Update message
    ///
    /// Stores the new status and broadcasts it to every guild room this
    /// session is in. "invisible" is stored and broadcast as plain offline,
    /// so other members cannot tell it apart from a disconnect.
    pub async fn handle(
        state: &GatewayState,
        connection: &Arc<Connection>,
        payload: PresenceUpdatePayload,
    ) -> HandlerResult<Option<CloseCode>> {
        let Some(user_id) = connection.user_id().await else {
            return Err(HandlerError::NotAuthenticated);
        };

        if !payload.is_valid_status() {
            return Err(HandlerError::InvalidPayload(format!(
                "Invalid status: {}",
                payload.status
            )));
        }

        let status: UserStatus = payload
            .status
            .parse()
            .map_err(HandlerError::InvalidPayload)?;

        let presence = state
            .presence_store()
            .update_status(user_id, status, connection.session_id())
            .await?;

        let guild_rooms: Vec<Room> = connection
            .rooms()
            .await
            .into_iter()
            .filter(|room| matches!(room, Room::Guild(_)))
            .collect();

        for room in &guild_rooms {
            let Room::Guild(guild_id) = room else { continue };

            if status.is_visible() {
                state
                    .presence_store()
                    .add_to_guild_online(*guild_id, user_id)
                    .await
                    .ok();
            } else {
                state
                    .presence_store()
                    .remove_from_guild_online(*guild_id, user_id)
                    .await
                    .ok();
            }

            let event = PresenceEvent {
                user_id,
                guild_id: *guild_id,
                status: presence.status.to_string(),
            };
            let data = serde_json::to_value(&event).unwrap_or_default();
            let pubsub_event = PubSubEvent::new(GatewayEventType::PresenceUpdate.as_str(), data);

            if let Err(e) = state.publisher().publish(room, &pubsub_event).await {
                tracing::warn!(
                    guild_id = %guild_id,
                    error = %e,
                    "Failed to publish presence update"
                );
            }
        }

        tracing::debug!(
            session_id = %connection.session_id(),
            user_id = %user_id,
            status = %status,
            guilds = guild_rooms.len(),
            "Presence updated"
        );

        Ok(None)
    }
}
