//! Gateway state
//!
//! Application state for the gateway server.

use crate::broadcast::EventDispatcher;
use crate::connection::ConnectionManager;
use crate::permissions::PermissionService;
use crate::voice::VoiceCoordinator;
use concord_cache::{PresenceStore, Publisher};
use concord_common::AppConfig;
use concord_core::{ChannelDirectory, CredentialVerifier, GuildDirectory};
use std::sync::Arc;

/// Gateway application state
///
/// Holds all shared dependencies for the gateway server.
#[derive(Clone)]
pub struct GatewayState {
    /// Session credential verifier
    verifier: Arc<dyn CredentialVerifier>,
    /// Guild membership directory
    guilds: Arc<dyn GuildDirectory>,
    /// Channel directory
    channels: Arc<dyn ChannelDirectory>,
    /// Channel permission resolution
    permission_service: Arc<PermissionService>,
    /// Voice channel membership
    voice_coordinator: Arc<VoiceCoordinator>,
    /// User presence storage
    presence_store: PresenceStore,
    /// Pub/Sub publisher for outgoing events
    publisher: Publisher,
    /// Connection manager for WebSocket connections
    connection_manager: Arc<ConnectionManager>,
    /// Event dispatcher for Redis Pub/Sub
    event_dispatcher: Arc<EventDispatcher>,
    /// Application configuration
    config: Arc<AppConfig>,
}

impl GatewayState {
    /// Create a new gateway state
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        verifier: Arc<dyn CredentialVerifier>,
        guilds: Arc<dyn GuildDirectory>,
        channels: Arc<dyn ChannelDirectory>,
        permission_service: Arc<PermissionService>,
        voice_coordinator: Arc<VoiceCoordinator>,
        presence_store: PresenceStore,
        publisher: Publisher,
        connection_manager: Arc<ConnectionManager>,
        event_dispatcher: Arc<EventDispatcher>,
        config: AppConfig,
    ) -> Self {
        Self {
            verifier,
            guilds,
            channels,
            permission_service,
            voice_coordinator,
            presence_store,
            publisher,
            connection_manager,
            event_dispatcher,
            config: Arc::new(config),
        }
    }

    /// Get the credential verifier
    pub fn verifier(&self) -> &dyn CredentialVerifier {
        self.verifier.as_ref()
    }

    /// Get the guild directory
    pub fn guilds(&self) -> &dyn GuildDirectory {
        self.guilds.as_ref()
    }

    /// Get the channel directory
    pub fn channels(&self) -> &dyn ChannelDirectory {
        self.channels.as_ref()
    }

    /// Get the permission service
    pub fn permission_service(&self) -> &PermissionService {
        &self.permission_service
    }

    /// Get the voice coordinator
    pub fn voice_coordinator(&self) -> &VoiceCoordinator {
        &self.voice_coordinator
    }

    /// Get the presence store
    pub fn presence_store(&self) -> &PresenceStore {
        &self.presence_store
    }

    /// Get the Pub/Sub publisher
    pub fn publisher(&self) -> &Publisher {
        &self.publisher
    }

    /// Get the connection manager
    pub fn connection_manager(&self) -> &ConnectionManager {
        &self.connection_manager
    }

    /// Get the event dispatcher
    pub fn event_dispatcher(&self) -> &EventDispatcher {
        &self.event_dispatcher
    }

    /// Get the application configuration
    pub fn config(&self) -> &AppConfig {
        &self.config
    }
}

impl std::fmt::Debug for GatewayState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayState")
            .field("connection_manager", &self.connection_manager)
            .field("config", &"AppConfig")
            .finish()
    }
}
