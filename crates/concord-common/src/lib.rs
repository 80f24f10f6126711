//! # concord-common
//!
//! Shared utilities including configuration, error handling, token
//! authentication, and telemetry.

pub mod auth;
pub mod config;
pub mod error;
pub mod telemetry;

// Re-export commonly used types at crate root
pub use auth::{SessionClaims, TokenVerifier, VoiceClaims, VoiceTokenIssuer};
pub use config::{
    AppConfig, AppSettings, AuthConfig, ConfigError, Environment, HeartbeatConfig, RedisConfig,
    ServerConfig, VoiceConfig,
};
pub use error::{AppError, AppResult, ErrorResponse};
pub use telemetry::{
    try_init_tracing, try_init_tracing_with_config, TracingConfig, TracingError,
};
