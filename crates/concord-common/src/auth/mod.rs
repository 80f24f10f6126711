//! Token authentication utilities

mod tokens;

pub use tokens::{SessionClaims, TokenVerifier, VoiceClaims, VoiceTokenIssuer};
