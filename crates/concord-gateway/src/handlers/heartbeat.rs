//! Heartbeat handler (op 1)

use super::HandlerResult;
use crate::connection::Connection;
use crate::protocol::{CloseCode, GatewayMessage};
use crate::server::GatewayState;
use std::sync::Arc;

/// Handles Heartbeat messages
pub struct HeartbeatHandler;

impl HeartbeatHandler {
    /// Handle a Heartbeat message
    ///
    /// Records the liveness timestamp, refreshes the presence and
    /// voice-state TTLs, and replies with a Heartbeat ACK. The client may
    /// echo its last seen sequence number; it is logged but not otherwise
    /// acted on.
    pub async fn handle(
        state: &GatewayState,
        connection: &Arc<Connection>,
        client_seq: Option<u64>,
    ) -> HandlerResult<Option<CloseCode>> {
        connection.record_heartbeat().await;

        // Keep the presence record and any voice state alive while the
        // connection is healthy
        if let Some(user_id) = connection.user_id().await {
            state.presence_store().refresh_presence(user_id).await.ok();
            state.voice_coordinator().refresh(user_id).await.ok();
        }

        tracing::trace!(
            session_id = %connection.session_id(),
            client_seq = ?client_seq,
            server_seq = connection.current_sequence(),
            "Heartbeat received"
        );

        if connection.send(GatewayMessage::heartbeat_ack()).await.is_err() {
            tracing::debug!(
                session_id = %connection.session_id(),
                "Failed to send Heartbeat ACK (connection closing)"
            );
        }

        Ok(None)
    }
}
