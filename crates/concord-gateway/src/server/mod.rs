//! Gateway server setup
//!
//! Provides the main WebSocket server configuration and routes.

mod handler;
mod state;

pub use handler::gateway_handler;
pub use state::GatewayState;

use crate::broadcast::EventDispatcher;
use crate::connection::ConnectionManager;
use crate::permissions::PermissionService;
use crate::voice::VoiceCoordinator;
use axum::{routing::get, Router};
use concord_cache::{
    PresenceStore, Publisher, RedisDirectory, RedisPool, RedisPoolConfig, SubscriberConfig,
    VoiceStateStore,
};
use concord_common::{AppConfig, AppError, TokenVerifier, VoiceTokenIssuer};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

/// Create the gateway router
pub fn create_router() -> Router<GatewayState> {
    Router::new()
        .route("/gateway", get(gateway_handler))
        .route("/health", get(health_check))
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}

/// Build the complete application
pub fn create_app(state: GatewayState) -> Router {
    create_router()
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Initialize all dependencies and create `GatewayState`
pub async fn create_gateway_state(config: AppConfig) -> Result<GatewayState, AppError> {
    // Create Redis pool
    tracing::info!("Connecting to Redis...");
    let redis_config = RedisPoolConfig::from(&config.redis);
    let redis_pool = RedisPool::new(redis_config).map_err(|e| AppError::Cache(e.to_string()))?;
    redis_pool
        .health_check()
        .await
        .map_err(|e| AppError::Cache(e.to_string()))?;
    tracing::info!("Redis connection established");

    // Token verification and voice grant issuance
    let verifier = Arc::new(TokenVerifier::new(&config.auth.token_secret));
    let voice_tokens = Arc::new(VoiceTokenIssuer::new(
        &config.voice.token_secret,
        config.voice.endpoint.clone(),
        config.voice.token_ttl_secs,
    ));

    // Directory projection over Redis
    let directory = Arc::new(RedisDirectory::new(redis_pool.clone()));

    // Permission resolution with the short-TTL memo
    let permission_service = Arc::new(PermissionService::new(
        directory.clone(),
        directory.clone(),
        directory.clone(),
    ));

    // Voice coordination
    let voice_coordinator = Arc::new(VoiceCoordinator::new(
        Arc::new(VoiceStateStore::new(redis_pool.clone())),
        directory.clone(),
        permission_service.clone(),
        voice_tokens,
    ));

    let presence_store = PresenceStore::new(redis_pool.clone());
    let publisher = Publisher::new(redis_pool);

    // Create connection manager
    let connection_manager = ConnectionManager::new_shared();

    // Create and start the event dispatcher
    let subscriber_config = SubscriberConfig {
        redis_url: config.redis.url.clone(),
        ..SubscriberConfig::default()
    };

    let event_dispatcher = Arc::new(EventDispatcher::new(
        subscriber_config,
        connection_manager.clone(),
        permission_service.clone(),
    ));
    event_dispatcher.clone().start();

    Ok(GatewayState::new(
        verifier,
        directory.clone(),
        directory,
        permission_service,
        voice_coordinator,
        presence_store,
        publisher,
        connection_manager,
        event_dispatcher,
        config,
    ))
}

/// Run the gateway server
pub async fn run_server(app: Router, addr: SocketAddr) -> Result<(), AppError> {
    tracing::info!("Starting Gateway server on {}", addr);

    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| AppError::Config(format!("Failed to bind to {addr}: {e}")))?;

    tracing::info!("Gateway listening on ws://{}/gateway", addr);

    axum::serve(listener, app)
        .await
        .map_err(|e| AppError::Config(format!("Server error: {e}")))?;

    Ok(())
}

/// Run the complete gateway server with configuration
pub async fn run(config: AppConfig) -> Result<(), AppError> {
    let addr = SocketAddr::from(([0, 0, 0, 0], config.gateway.port));

    // Create gateway state
    let state = create_gateway_state(config).await?;

    // Build application
    let app = create_app(state);

    // Run server
    run_server(app, addr).await
}
