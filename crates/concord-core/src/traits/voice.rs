//! Voice state storage port
//!
//! The shared store every gateway process reads and writes; the
//! coordinator owns all policy, the store just holds records.

use async_trait::async_trait;

use crate::entities::VoiceState;
use crate::traits::RepoResult;
use crate::value_objects::Snowflake;

#[async_trait]
pub trait VoiceStateRepository: Send + Sync {
    /// Get a user's current voice state
    async fn get_state(&self, user_id: Snowflake) -> RepoResult<Option<VoiceState>>;

    /// Write a user's voice state
    async fn save_state(&self, state: &VoiceState) -> RepoResult<()>;

    /// Delete a user's voice state; false when no state existed
    async fn clear_state(&self, user_id: Snowflake) -> RepoResult<bool>;

    /// Extend the state's lifetime while the user stays connected
    async fn refresh_state(&self, user_id: Snowflake) -> RepoResult<bool>;

    /// Add a user to a channel's member set
    async fn add_to_channel(&self, channel_id: Snowflake, user_id: Snowflake) -> RepoResult<()>;

    /// Remove a user from a channel's member set
    async fn remove_from_channel(
        &self,
        channel_id: Snowflake,
        user_id: Snowflake,
    ) -> RepoResult<()>;
}
