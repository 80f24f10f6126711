//! Identify handler (op 2)

use super::{HandlerError, HandlerResult};
use crate::connection::Connection;
use crate::events::{GatewayEventType, PresenceEvent, ReadyEvent};
use crate::protocol::{CloseCode, GatewayMessage, IdentifyPayload};
use crate::server::GatewayState;
use concord_cache::{PubSubEvent, Room, UserStatus};
use std::sync::Arc;

/// Handles Identify messages
pub struct IdentifyHandler;

impl IdentifyHandler {
    /// Handle an Identify message
    pub async fn handle(
        state: &GatewayState,
        connection: &Arc<Connection>,
        payload: IdentifyPayload,
    ) -> HandlerResult<Option<CloseCode>> {
        // A session identifies exactly once
        if connection.is_authenticated().await {
            tracing::warn!(
                session_id = %connection.session_id(),
                "Client sent Identify while already authenticated"
            );
            return Ok(Some(CloseCode::AlreadyAuthenticated));
        }

        // Extract token (remove "Bearer " prefix if present)
        let token = payload.token.strip_prefix("Bearer ").unwrap_or(&payload.token);

        let Some(user_id) = state.verifier().verify(token).await? else {
            // Tell the client the session is dead before the close frame
            connection.send(GatewayMessage::invalid_session(false)).await.ok();
            return Err(HandlerError::AuthenticationFailed(
                "Invalid session token".to_string(),
            ));
        };

        let intents = payload.effective_intents();
        let session_id = connection.session_id().to_string();

        let guild_ids = state.guilds().guilds_for_user(user_id).await?;
        let dm_channel_ids = state.channels().dm_channels_for_user(user_id).await?;

        state
            .connection_manager()
            .authenticate_connection(&session_id, user_id, intents)
            .await;

        // Join the user's private room, one room per guild, and one per
        // direct conversation; rooms that gained their first local member
        // need a Pub/Sub subscription.
        let mut rooms = vec![Room::user(user_id)];
        rooms.extend(guild_ids.iter().map(|id| Room::guild(*id)));
        rooms.extend(dm_channel_ids.iter().map(|id| Room::channel(*id)));

        let mut new_subscriptions = Vec::new();
        for room in rooms {
            if state.connection_manager().join_room(&session_id, room).await == Some(true) {
                new_subscriptions.push(room);
            }
        }

        if !new_subscriptions.is_empty() {
            state.event_dispatcher().subscribe(&new_subscriptions).await?;
        }

        // Mark the user online and let their guilds know
        let presence = state
            .presence_store()
            .update_status(user_id, UserStatus::Online, &session_id)
            .await?;

        for guild_id in &guild_ids {
            state
                .presence_store()
                .add_to_guild_online(*guild_id, user_id)
                .await
                .ok();

            let event = PresenceEvent {
                user_id,
                guild_id: *guild_id,
                status: presence.status.to_string(),
            };
            let data = serde_json::to_value(&event).unwrap_or_default();
            let pubsub_event = PubSubEvent::new(GatewayEventType::PresenceUpdate.as_str(), data);

            if let Err(e) = state.publisher().publish(&Room::guild(*guild_id), &pubsub_event).await {
                tracing::warn!(
                    guild_id = %guild_id,
                    error = %e,
                    "Failed to publish presence update"
                );
            }
        }

        // Send READY
        let ready = ReadyEvent::new(user_id, session_id.clone(), guild_ids.clone());
        let ready_data = serde_json::to_value(&ready).unwrap_or_default();
        let seq = connection.next_sequence();

        connection
            .send(GatewayMessage::dispatch(
                GatewayEventType::Ready.as_str(),
                seq,
                ready_data,
            ))
            .await
            .map_err(|e| HandlerError::Internal(format!("Failed to send READY: {e}")))?;

        tracing::info!(
            session_id = %session_id,
            user_id = %user_id,
            intents = %intents,
            guilds = guild_ids.len(),
            "Client identified"
        );

        Ok(None)
    }
}
