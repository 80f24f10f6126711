//! Op code handlers
//!
//! Handles incoming WebSocket messages based on their operation code.

mod error;
mod heartbeat;
mod identify;
mod presence;
mod subscribe;
mod voice;

pub use error::{HandlerError, HandlerResult};
pub use heartbeat::HeartbeatHandler;
pub use identify::IdentifyHandler;
pub use presence::PresenceHandler;
pub use subscribe::SubscribeHandler;
pub use voice::VoiceHandler;

use crate::connection::Connection;
use crate::protocol::{CloseCode, GatewayMessage, OpCode};
use crate::server::GatewayState;
use std::sync::Arc;

/// Dispatch incoming client messages to appropriate handlers
pub struct MessageDispatcher;

impl MessageDispatcher {
    /// Handle an incoming client message
    pub async fn dispatch(
        state: &GatewayState,
        connection: &Arc<Connection>,
        message: GatewayMessage,
    ) -> HandlerResult<Option<CloseCode>> {
        // Server-only op codes from a client are dropped like any other
        // malformed message
        if !message.op.is_client_op() {
            tracing::warn!(
                session_id = %connection.session_id(),
                op = %message.op,
                "Dropping server-only op code sent by client"
            );
            return Ok(None);
        }

        // Everything except Heartbeat and Identify requires authentication
        if !matches!(message.op, OpCode::Heartbeat | OpCode::Identify)
            && !connection.is_authenticated().await
        {
            return Err(HandlerError::NotAuthenticated);
        }

        match message.op {
            OpCode::Identify => {
                let payload = message.as_identify().ok_or_else(|| {
                    HandlerError::InvalidPayload("Invalid Identify payload".to_string())
                })?;

                IdentifyHandler::handle(state, connection, payload).await
            }
            OpCode::Heartbeat => {
                let seq = message.as_heartbeat_seq().ok_or_else(|| {
                    HandlerError::InvalidPayload("Invalid Heartbeat payload".to_string())
                })?;

                HeartbeatHandler::handle(state, connection, seq).await
            }
            OpCode::PresenceUpdate => {
                let payload = message.as_presence_update().ok_or_else(|| {
                    HandlerError::InvalidPayload("Invalid PresenceUpdate payload".to_string())
                })?;

                PresenceHandler::handle(state, connection, payload).await
            }
            OpCode::VoiceStateUpdate => {
                let payload = message.as_voice_state_update().ok_or_else(|| {
                    HandlerError::InvalidPayload("Invalid VoiceStateUpdate payload".to_string())
                })?;

                VoiceHandler::handle(state, connection, payload).await
            }
            OpCode::Subscribe => {
                let payload = message.as_subscribe().ok_or_else(|| {
                    HandlerError::InvalidPayload("Invalid Subscribe payload".to_string())
                })?;

                SubscribeHandler::handle_subscribe(state, connection, payload).await
            }
            OpCode::Unsubscribe => {
                let payload = message.as_subscribe().ok_or_else(|| {
                    HandlerError::InvalidPayload("Invalid Unsubscribe payload".to_string())
                })?;

                SubscribeHandler::handle_unsubscribe(state, connection, payload).await
            }
            // These ops should never reach here due to is_client_op check
            _ => {
                tracing::error!(op = %message.op, "Unhandled client op code");
                Ok(None)
            }
        }
    }
}
