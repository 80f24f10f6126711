//! Session credential verification and voice token issuance
//!
//! The account service signs session tokens with a shared HMAC secret; the
//! gateway verifies them locally without a directory round trip. Voice
//! tokens are minted the same way for the media server to validate.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use concord_core::{CallToken, CallTokenIssuer, CredentialVerifier, DomainError, RepoResult, Snowflake};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// Claims carried by a session token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Subject (user ID)
    pub sub: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

/// Verifies session tokens against the shared signing secret
#[derive(Clone)]
pub struct TokenVerifier {
    decoding_key: DecodingKey,
}

impl TokenVerifier {
    /// Create a verifier for the given shared secret
    #[must_use]
    pub fn new(secret: &str) -> Self {
        Self {
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    /// Decode a session token and extract the user id
    ///
    /// Invalid, expired, or malformed tokens all map to `None`; they are a
    /// caller outcome, not an infrastructure failure.
    pub fn verify_session(&self, token: &str) -> Option<Snowflake> {
        let validation = Validation::default();
        let data = decode::<SessionClaims>(token, &self.decoding_key, &validation).ok()?;
        data.claims.sub.parse::<i64>().ok().map(Snowflake::new)
    }
}

impl std::fmt::Debug for TokenVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenVerifier").finish_non_exhaustive()
    }
}

#[async_trait]
impl CredentialVerifier for TokenVerifier {
    async fn verify(&self, token: &str) -> RepoResult<Option<Snowflake>> {
        Ok(self.verify_session(token))
    }
}

/// Claims carried by a media-session token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoiceClaims {
    /// Subject (user ID)
    pub sub: String,
    /// Target voice channel
    pub channel_id: String,
    /// Guild the channel belongs to
    pub guild_id: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

/// Issues media-session tokens for voice channel joins
#[derive(Clone)]
pub struct VoiceTokenIssuer {
    encoding_key: EncodingKey,
    endpoint: String,
    token_ttl_secs: i64,
}

impl VoiceTokenIssuer {
    /// Create an issuer for the given secret, endpoint, and token lifetime
    #[must_use]
    pub fn new(secret: &str, endpoint: String, token_ttl_secs: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            endpoint,
            token_ttl_secs,
        }
    }
}

impl std::fmt::Debug for VoiceTokenIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VoiceTokenIssuer")
            .field("endpoint", &self.endpoint)
            .field("token_ttl_secs", &self.token_ttl_secs)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl CallTokenIssuer for VoiceTokenIssuer {
    async fn issue(
        &self,
        user_id: Snowflake,
        channel_id: Snowflake,
        guild_id: Snowflake,
    ) -> RepoResult<CallToken> {
        let now = Utc::now();
        let claims = VoiceClaims {
            sub: user_id.to_string(),
            channel_id: channel_id.to_string(),
            guild_id: guild_id.to_string(),
            iat: now.timestamp(),
            exp: (now + Duration::seconds(self.token_ttl_secs)).timestamp(),
        };

        let token = encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| DomainError::InternalError(format!("voice token encoding failed: {e}")))?;

        Ok(CallToken {
            token,
            endpoint: self.endpoint.clone(),
        })
    }
}
