//! Voice state coordinator
//!
//! Serializes all voice-state mutations per user behind an async lock so
//! a user is never recorded in two channels at once. Join and move are
//! validated against the channel directory and effective permissions;
//! leave and disconnect are idempotent.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::Mutex;

use crate::permissions::PermissionService;
use crate::protocol::VoiceStateUpdatePayload;
use concord_core::{
    CallToken, CallTokenIssuer, ChannelDirectory, DomainError, Permissions, RepoResult, Snowflake,
    VoiceState, VoiceStateRepository,
};

/// Outcome of a voice-state mutation
///
/// `state` is the record to broadcast; `grant` is present only when the
/// user entered a new channel and must be delivered privately.
#[derive(Debug, Clone)]
pub struct VoiceTransition {
    pub state: VoiceState,
    pub previous_channel: Option<Snowflake>,
    pub grant: Option<CallToken>,
}

/// Coordinates voice channel membership
pub struct VoiceCoordinator {
    store: Arc<dyn VoiceStateRepository>,
    channels: Arc<dyn ChannelDirectory>,
    permissions: Arc<PermissionService>,
    tokens: Arc<dyn CallTokenIssuer>,

    /// Per-user mutation locks; entries persist for the process lifetime
    locks: DashMap<Snowflake, Arc<Mutex<()>>>,
}

impl VoiceCoordinator {
    /// Create a new coordinator
    pub fn new(
        store: Arc<dyn VoiceStateRepository>,
        channels: Arc<dyn ChannelDirectory>,
        permissions: Arc<PermissionService>,
        tokens: Arc<dyn CallTokenIssuer>,
    ) -> Self {
        Self {
            store,
            channels,
            permissions,
            tokens,
            locks: DashMap::new(),
        }
    }

    fn user_lock(&self, user_id: Snowflake) -> Arc<Mutex<()>> {
        self.locks
            .entry(user_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Apply a client voice-state update (join, move, leave, or flags)
    ///
    /// Returns `None` when there is nothing to broadcast (a leave with no
    /// active state).
    pub async fn update(
        &self,
        user_id: Snowflake,
        session_id: &str,
        payload: &VoiceStateUpdatePayload,
    ) -> RepoResult<Option<VoiceTransition>> {
        let lock = self.user_lock(user_id);
        let _guard = lock.lock().await;

        match payload.channel_id {
            Some(target) => {
                self.join_or_update(user_id, session_id, target, payload)
                    .await
                    .map(Some)
            }
            None => self.leave(user_id).await,
        }
    }

    /// Clear voice state on connection teardown
    ///
    /// Only the session that owns the state may clear it; a newer
    /// connection's state survives the old connection's cleanup.
    pub async fn disconnect(
        &self,
        user_id: Snowflake,
        session_id: &str,
    ) -> RepoResult<Option<VoiceTransition>> {
        let lock = self.user_lock(user_id);
        let _guard = lock.lock().await;

        let current = self.store.get_state(user_id).await?;

        match current {
            Some(state) if state.session_id == session_id => self.clear(state).await.map(Some),
            _ => Ok(None),
        }
    }

    /// Extend the lifetime of the user's voice state while they heartbeat
    ///
    /// Returns false when the user is not in voice.
    pub async fn refresh(&self, user_id: Snowflake) -> RepoResult<bool> {
        self.store.refresh_state(user_id).await
    }

    async fn join_or_update(
        &self,
        user_id: Snowflake,
        session_id: &str,
        target: Snowflake,
        payload: &VoiceStateUpdatePayload,
    ) -> RepoResult<VoiceTransition> {
        let channel = self
            .channels
            .get_channel(target)
            .await?
            .ok_or(DomainError::ChannelNotFound(target))?;

        if !channel.is_voice() {
            return Err(DomainError::NotVoiceChannel(target));
        }

        if channel.guild_id != Some(payload.guild_id) {
            return Err(DomainError::ChannelNotFound(target));
        }

        self.permissions
            .require(user_id, target, Permissions::VIEW_CHANNEL | Permissions::CONNECT)
            .await?;

        let current = self.store.get_state(user_id).await?;

        // Flag-only update while staying in the same channel
        if let Some(mut state) = current.clone() {
            if state.channel_id == Some(target) {
                state.set_flags(
                    payload.self_mute,
                    payload.self_deaf,
                    payload.self_video,
                    payload.self_stream,
                );
                state.session_id = session_id.to_string();

                self.store.save_state(&state).await?;

                return Ok(VoiceTransition {
                    state,
                    previous_channel: Some(target),
                    grant: None,
                });
            }
        }

        // Implicit leave of the previous channel
        let previous_channel = current.as_ref().and_then(|s| s.channel_id);
        if let Some(previous) = previous_channel {
            self.store.remove_from_channel(previous, user_id).await?;
        }

        let mut state = VoiceState::joined(user_id, payload.guild_id, target, session_id.to_string());
        state.set_flags(
            payload.self_mute,
            payload.self_deaf,
            payload.self_video,
            payload.self_stream,
        );

        self.store.save_state(&state).await?;
        self.store.add_to_channel(target, user_id).await?;

        let grant = self.tokens.issue(user_id, target, payload.guild_id).await?;

        tracing::info!(
            user_id = %user_id,
            channel_id = %target,
            previous = ?previous_channel,
            "User joined voice channel"
        );

        Ok(VoiceTransition {
            state,
            previous_channel,
            grant: Some(grant),
        })
    }

    async fn leave(&self, user_id: Snowflake) -> RepoResult<Option<VoiceTransition>> {
        let current = self.store.get_state(user_id).await?;

        match current {
            Some(state) => self.clear(state).await.map(Some),
            // Leaving while not in voice is a no-op
            None => Ok(None),
        }
    }

    async fn clear(&self, state: VoiceState) -> RepoResult<VoiceTransition> {
        if let Some(channel_id) = state.channel_id {
            self.store.remove_from_channel(channel_id, state.user_id).await?;
        }

        self.store.clear_state(state.user_id).await?;

        tracing::info!(
            user_id = %state.user_id,
            channel_id = ?state.channel_id,
            "User left voice channel"
        );

        Ok(VoiceTransition {
            previous_channel: state.channel_id,
            state: state.departed(),
            grant: None,
        })
    }
}

impl std::fmt::Debug for VoiceCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VoiceCoordinator")
            .field("locked_users", &self.locks.len())
            .finish()
    }
}
