//! # concord-core
//!
//! Domain layer for the realtime gateway: value objects, entity summaries,
//! directory traits, and the channel permission resolver. This crate has
//! zero dependencies on infrastructure (Redis, web framework, etc.).

pub mod entities;
pub mod error;
pub mod resolver;
pub mod traits;
pub mod value_objects;

// Re-export commonly used types at crate root
pub use entities::{
    ChannelInfo, ChannelType, OverwriteTarget, PermissionOverwrite, RoleRecord, VoiceState,
};
pub use error::DomainError;
pub use resolver::{resolve, PermissionContext};
pub use traits::{
    CallToken, CallTokenIssuer, ChannelDirectory, CredentialVerifier, GuildDirectory,
    PermissionDirectory, RepoResult, VoiceStateRepository,
};
pub use value_objects::{Intents, Permissions, Snowflake, SnowflakeParseError};
