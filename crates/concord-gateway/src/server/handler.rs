//! WebSocket handler
//!
//! Handles WebSocket connections and message processing.

use crate::connection::{Connection, ConnectionState};
use crate::events::{GatewayEventType, PresenceEvent};
use crate::handlers::MessageDispatcher;
use crate::protocol::{CloseCode, GatewayMessage, HelloPayload};
use crate::server::GatewayState;
use axum::{
    extract::{ws::Message, State, WebSocketUpgrade},
    response::IntoResponse,
};
use concord_cache::{PubSubEvent, Room, UserStatus};
use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::interval;

/// Channel buffer size for outgoing messages
const MESSAGE_BUFFER_SIZE: usize = 100;

/// WebSocket gateway handler
pub async fn gateway_handler(
    State(state): State<GatewayState>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_socket(state, socket))
}

/// Handle an upgraded WebSocket connection
async fn handle_socket(state: GatewayState, socket: axum::extract::ws::WebSocket) {
    let session_id = uuid::Uuid::new_v4().to_string();

    // Create message channel for outgoing messages
    let (tx, mut rx) = mpsc::channel::<GatewayMessage>(MESSAGE_BUFFER_SIZE);

    // Register connection
    let connection = state
        .connection_manager()
        .add_connection(session_id.clone(), tx);

    tracing::info!(session_id = %session_id, "WebSocket connection established");

    // Split the WebSocket
    let (mut ws_sink, mut ws_stream) = socket.split();

    // Send Hello message immediately
    let heartbeat_interval = state.config().heartbeat.interval_ms;
    let hello = GatewayMessage::hello(HelloPayload::with_interval(heartbeat_interval));
    if let Ok(json) = hello.to_json() {
        if ws_sink.send(Message::Text(json.into())).await.is_err() {
            tracing::warn!(session_id = %session_id, "Failed to send Hello message");
            cleanup_connection(&state, &session_id, &connection).await;
            return;
        }
    }

    // Clone state for tasks
    let state_recv = state.clone();
    let session_id_recv = session_id.clone();
    let connection_recv = connection.clone();

    // Spawn task to receive messages from WebSocket
    let recv_task = tokio::spawn(async move {
        while let Some(msg) = ws_stream.next().await {
            match msg {
                Ok(Message::Text(text)) => {
                    if let Err(close_code) =
                        handle_text_message(&state_recv, &connection_recv, &text).await
                    {
                        tracing::debug!(
                            session_id = %session_id_recv,
                            close_code = ?close_code,
                            "Closing connection due to error"
                        );
                        return Some(close_code);
                    }
                }
                Ok(Message::Binary(_)) => {
                    tracing::debug!(
                        session_id = %session_id_recv,
                        "Ignoring unsupported binary frame"
                    );
                }
                Ok(Message::Ping(_)) => {
                    tracing::trace!(session_id = %session_id_recv, "Ping received");
                    // Pong is handled automatically by axum
                }
                Ok(Message::Pong(_)) => {
                    tracing::trace!(session_id = %session_id_recv, "Pong received");
                }
                Ok(Message::Close(_)) => {
                    tracing::info!(session_id = %session_id_recv, "Client closed connection");
                    return None;
                }
                Err(e) => {
                    tracing::warn!(
                        session_id = %session_id_recv,
                        error = %e,
                        "WebSocket error"
                    );
                    return Some(CloseCode::UnknownError);
                }
            }
        }
        None
    });

    // Clone for send task
    let session_id_send = session_id.clone();

    // Spawn task to send messages to WebSocket
    let send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if let Ok(json) = msg.to_json() {
                if ws_sink.send(Message::Text(json.into())).await.is_err() {
                    tracing::warn!(
                        session_id = %session_id_send,
                        "Failed to send message to WebSocket"
                    );
                    break;
                }
            }
        }

        // Close the WebSocket when channel is closed
        let _ = ws_sink.close().await;
    });

    // Clone for heartbeat task
    let session_id_hb = session_id.clone();
    let connection_hb = connection.clone();
    let heartbeat_timeout = Duration::from_millis(state.config().heartbeat.timeout_ms);

    // Spawn heartbeat monitoring task
    let heartbeat_task = tokio::spawn(async move {
        let mut check_interval = interval(Duration::from_millis(heartbeat_interval / 2));

        loop {
            check_interval.tick().await;

            // Connection is dead if no heartbeat arrived within the timeout
            let time_since = connection_hb.time_since_heartbeat().await;
            if time_since > heartbeat_timeout {
                tracing::warn!(
                    session_id = %session_id_hb,
                    time_since_ms = time_since.as_millis(),
                    "Connection timed out (no heartbeat)"
                );
                break;
            }
        }
    });

    // Wait for any task to complete
    tokio::select! {
        result = recv_task => {
            if let Ok(Some(close_code)) = result {
                tracing::debug!(
                    session_id = %session_id,
                    close_code = ?close_code,
                    "Receive task ended with close code"
                );
            }
        }
        _ = send_task => {
            tracing::debug!(session_id = %session_id, "Send task ended");
        }
        _ = heartbeat_task => {
            tracing::debug!(session_id = %session_id, "Heartbeat task ended");
        }
    }

    // Clean up
    cleanup_connection(&state, &session_id, &connection).await;
}

/// Handle a text message from the client
///
/// A message that cannot be parsed is dropped without closing: a single
/// bad client message must never take the session down.
async fn handle_text_message(
    state: &GatewayState,
    connection: &Arc<Connection>,
    text: &str,
) -> Result<(), CloseCode> {
    let message = match GatewayMessage::from_json(text) {
        Ok(m) => m,
        Err(e) => {
            tracing::debug!(
                session_id = %connection.session_id(),
                error = %e,
                "Dropping unparseable message"
            );
            return Ok(());
        }
    };

    tracing::trace!(
        session_id = %connection.session_id(),
        op = %message.op,
        "Received message"
    );

    // Dispatch to handler
    match MessageDispatcher::dispatch(state, connection, message).await {
        Ok(Some(close_code)) => Err(close_code),
        Ok(None) => Ok(()),
        Err(e) => {
            tracing::warn!(
                session_id = %connection.session_id(),
                error = %e,
                "Handler error"
            );
            // Errors with no close code drop the request but keep the socket
            match e.to_close_code() {
                Some(close_code) => Err(close_code),
                None => Ok(()),
            }
        }
    }
}

/// Clean up a connection on disconnect
async fn cleanup_connection(state: &GatewayState, session_id: &str, connection: &Arc<Connection>) {
    tracing::info!(session_id = %session_id, "Cleaning up connection");

    connection.set_state(ConnectionState::Disconnected).await;

    if let Some(user_id) = connection.user_id().await {
        // Kick the user out of voice if this session held their state
        match state.voice_coordinator().disconnect(user_id, session_id).await {
            Ok(Some(transition)) => {
                let data = serde_json::to_value(&transition.state).unwrap_or_default();
                let event =
                    PubSubEvent::new(GatewayEventType::VoiceStateUpdate.as_str(), data);

                state
                    .publisher()
                    .publish(&Room::guild(transition.state.guild_id), &event)
                    .await
                    .ok();
            }
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(
                    session_id = %session_id,
                    user_id = %user_id,
                    error = %e,
                    "Failed to clear voice state on disconnect"
                );
            }
        }

        // Only the user's last local connection takes their presence down
        if state
            .connection_manager()
            .is_last_local_connection(user_id, session_id)
        {
            state.presence_store().remove_presence(user_id).await.ok();

            for room in connection.rooms().await {
                let Room::Guild(guild_id) = room else { continue };

                state
                    .presence_store()
                    .remove_from_guild_online(guild_id, user_id)
                    .await
                    .ok();

                let event = PresenceEvent {
                    user_id,
                    guild_id,
                    status: UserStatus::Offline.to_string(),
                };
                let data = serde_json::to_value(&event).unwrap_or_default();
                let pubsub_event =
                    PubSubEvent::new(GatewayEventType::PresenceUpdate.as_str(), data);

                state.publisher().publish(&room, &pubsub_event).await.ok();
            }

            tracing::debug!(user_id = %user_id, "User presence set to offline");
        }
    }

    // Remove from connection manager; rooms with no local members left
    // drop their Pub/Sub subscriptions
    let emptied = state.connection_manager().remove_connection(session_id).await;
    if !emptied.is_empty() {
        state.event_dispatcher().unsubscribe(&emptied).await.ok();
    }
}
