//! Subscribe / Unsubscribe handlers (op 5 and op 6)
//!
//! Clients adjust room membership mid-session: a guild room after joining
//! a guild, a channel room when a direct conversation is opened or closed
//! in the UI. Rooms the user is not entitled to are skipped without
//! closing the connection.

use super::{HandlerError, HandlerResult};
use crate::connection::Connection;
use crate::protocol::{CloseCode, SubscribePayload};
use crate::server::GatewayState;
use concord_cache::Room;
use concord_core::Permissions;
use std::sync::Arc;

/// Handles Subscribe and Unsubscribe messages
pub struct SubscribeHandler;

impl SubscribeHandler {
    /// Handle a Subscribe message
    pub async fn handle_subscribe(
        state: &GatewayState,
        connection: &Arc<Connection>,
        payload: SubscribePayload,
    ) -> HandlerResult<Option<CloseCode>> {
        let Some(user_id) = connection.user_id().await else {
            return Err(HandlerError::NotAuthenticated);
        };

        let session_id = connection.session_id().to_string();
        let mut new_subscriptions = Vec::new();

        // Guild rooms are gated on membership
        for guild_id in payload.guild_ids {
            if !state.guilds().is_member(guild_id, user_id).await? {
                tracing::debug!(
                    session_id = %session_id,
                    guild_id = %guild_id,
                    "Skipping guild subscription for non-member"
                );
                continue;
            }

            let room = Room::guild(guild_id);
            if state.connection_manager().join_room(&session_id, room).await == Some(true) {
                new_subscriptions.push(room);
            }
        }

        for channel_id in payload.channel_ids {
            // Guild channels are covered by guild rooms already; only direct
            // conversations are joined on request.
            match state.channels().get_channel(channel_id).await {
                Ok(Some(channel)) if channel.is_direct() => {}
                Ok(_) => {
                    tracing::debug!(
                        session_id = %session_id,
                        channel_id = %channel_id,
                        "Ignoring subscription to non-direct or unknown channel"
                    );
                    continue;
                }
                Err(e) => return Err(e.into()),
            }

            match state
                .permission_service()
                .require(user_id, channel_id, Permissions::VIEW_CHANNEL)
                .await
            {
                Ok(_) => {}
                Err(e) if e.is_authorization() || e.is_not_found() => {
                    tracing::debug!(
                        session_id = %session_id,
                        channel_id = %channel_id,
                        error = %e,
                        "Skipping channel subscription"
                    );
                    continue;
                }
                Err(e) => return Err(e.into()),
            }

            let room = Room::channel(channel_id);
            if state.connection_manager().join_room(&session_id, room).await == Some(true) {
                new_subscriptions.push(room);
            }
        }

        if !new_subscriptions.is_empty() {
            state.event_dispatcher().subscribe(&new_subscriptions).await?;
        }

        Ok(None)
    }

    /// Handle an Unsubscribe message
    ///
    /// No permission check: leaving a room you can see (or never joined)
    /// is always allowed.
    pub async fn handle_unsubscribe(
        state: &GatewayState,
        connection: &Arc<Connection>,
        payload: SubscribePayload,
    ) -> HandlerResult<Option<CloseCode>> {
        if !connection.is_authenticated().await {
            return Err(HandlerError::NotAuthenticated);
        }

        let session_id = connection.session_id().to_string();
        let mut emptied = Vec::new();

        let rooms = payload
            .guild_ids
            .into_iter()
            .map(Room::guild)
            .chain(payload.channel_ids.into_iter().map(Room::channel));

        for room in rooms {
            if state.connection_manager().leave_room(&session_id, room).await == Some(true) {
                emptied.push(room);
            }
        }

        if !emptied.is_empty() {
            state.event_dispatcher().unsubscribe(&emptied).await?;
        }

        Ok(None)
    }
}
