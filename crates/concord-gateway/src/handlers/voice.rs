//! Voice state update handler (op 4)

use super::{HandlerError, HandlerResult};
use crate::connection::Connection;
use crate::events::{GatewayEventType, VoiceServerUpdateEvent};
use crate::protocol::{CloseCode, GatewayMessage, VoiceStateUpdatePayload};
use crate::server::GatewayState;
use concord_cache::{PubSubEvent, Room};
use concord_core::DomainError;
use std::sync::Arc;

/// Handles Voice State Update messages
pub struct VoiceHandler;

impl VoiceHandler {
    /// Handle a Voice State Update message
    ///
    /// The coordinator applies the mutation; on success the new state is
    /// broadcast to the guild, and a fresh media grant (if any) is returned
    /// on the requesting connection only. Rejected joins are dropped
    /// without closing the connection.
    pub async fn handle(
        state: &GatewayState,
        connection: &Arc<Connection>,
        payload: VoiceStateUpdatePayload,
    ) -> HandlerResult<Option<CloseCode>> {
        let Some(user_id) = connection.user_id().await else {
            return Err(HandlerError::NotAuthenticated);
        };

        let transition = match state
            .voice_coordinator()
            .update(user_id, connection.session_id(), &payload)
            .await
        {
            Ok(Some(transition)) => transition,
            Ok(None) => return Ok(None),
            Err(e) if Self::is_rejection(&e) => {
                tracing::debug!(
                    session_id = %connection.session_id(),
                    user_id = %user_id,
                    channel_id = ?payload.channel_id,
                    error = %e,
                    "Voice state update rejected"
                );
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        // Everyone in the guild sees the membership change
        let data = serde_json::to_value(&transition.state).unwrap_or_default();
        let event = PubSubEvent::new(GatewayEventType::VoiceStateUpdate.as_str(), data);

        if let Err(e) = state
            .publisher()
            .publish(&Room::guild(payload.guild_id), &event)
            .await
        {
            tracing::warn!(
                guild_id = %payload.guild_id,
                error = %e,
                "Failed to publish voice state update"
            );
        }

        // The media grant never touches the event bus; it goes straight
        // back on the connection that asked for it
        if let Some(grant) = transition.grant {
            if let Some(channel_id) = transition.state.channel_id {
                let server_update = VoiceServerUpdateEvent {
                    token: grant.token,
                    endpoint: grant.endpoint,
                    guild_id: payload.guild_id,
                    channel_id,
                };
                let data = serde_json::to_value(&server_update).unwrap_or_default();
                let message = GatewayMessage::dispatch(
                    GatewayEventType::VoiceServerUpdate.as_str(),
                    connection.next_sequence(),
                    data,
                );

                if connection.send(message).await.is_err() {
                    tracing::debug!(
                        session_id = %connection.session_id(),
                        "Failed to deliver voice server update (connection closing)"
                    );
                }
            }
        }

        Ok(None)
    }

    /// Whether the error is a per-request rejection rather than a failure
    fn is_rejection(e: &DomainError) -> bool {
        e.is_authorization()
            || e.is_not_found()
            || matches!(e, DomainError::NotVoiceChannel(_))
    }
}
