//! Port traits - interfaces to the systems this core collaborates with

mod directory;
mod voice;

pub use directory::{
    CallToken, CallTokenIssuer, ChannelDirectory, CredentialVerifier, GuildDirectory,
    PermissionDirectory, RepoResult,
};
pub use voice::VoiceStateRepository;
