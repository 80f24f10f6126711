//! In-memory fakes and wiring for gateway integration tests
//!
//! The directory, voice store, and token issuer are process-local so
//! tests run without Redis. The pool handed to the presence store and
//! publisher points at a closed port; operations against it fail fast
//! and the handlers treat that as a degraded cache.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use concord_cache::{PresenceStore, Publisher, RedisPool, RedisPoolConfig, SubscriberConfig};
use concord_common::{
    AppConfig, AppSettings, AuthConfig, Environment, HeartbeatConfig, RedisConfig, ServerConfig,
    VoiceConfig,
};
use concord_core::{
    CallToken, CallTokenIssuer, ChannelDirectory, ChannelInfo, CredentialVerifier, GuildDirectory,
    PermissionDirectory, PermissionOverwrite, Permissions, RepoResult, RoleRecord, Snowflake,
    VoiceState, VoiceStateRepository,
};
use concord_gateway::broadcast::EventDispatcher;
use concord_gateway::connection::ConnectionManager;
use concord_gateway::permissions::PermissionService;
use concord_gateway::voice::VoiceCoordinator;
use concord_gateway::GatewayState;

/// Owner id shared by every fake guild; distinct from any test user
const GUILD_OWNER: i64 = 9_999;

/// Fixed directory of guilds, channels, and DM recipients
#[derive(Debug, Default)]
pub struct FakeDirectory {
    members: HashSet<(Snowflake, Snowflake)>,
    channels: HashMap<Snowflake, ChannelInfo>,
    dm_recipients: HashSet<(Snowflake, Snowflake)>,
    guilds: HashSet<Snowflake>,
}

impl FakeDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_member(mut self, guild_id: Snowflake, user_id: Snowflake) -> Self {
        self.members.insert((guild_id, user_id));
        self.guilds.insert(guild_id);
        self
    }

    pub fn with_channel(mut self, channel: ChannelInfo) -> Self {
        if let Some(guild_id) = channel.guild_id {
            self.guilds.insert(guild_id);
        }
        self.channels.insert(channel.id, channel);
        self
    }

    pub fn with_dm_recipient(mut self, channel_id: Snowflake, user_id: Snowflake) -> Self {
        self.dm_recipients.insert((channel_id, user_id));
        self
    }
}

#[async_trait]
impl GuildDirectory for FakeDirectory {
    async fn guilds_for_user(&self, user_id: Snowflake) -> RepoResult<Vec<Snowflake>> {
        Ok(self
            .members
            .iter()
            .filter(|(_, uid)| *uid == user_id)
            .map(|(gid, _)| *gid)
            .collect())
    }

    async fn is_member(&self, guild_id: Snowflake, user_id: Snowflake) -> RepoResult<bool> {
        Ok(self.members.contains(&(guild_id, user_id)))
    }

    async fn guild_owner(&self, guild_id: Snowflake) -> RepoResult<Option<Snowflake>> {
        Ok(self
            .guilds
            .contains(&guild_id)
            .then_some(Snowflake::new(GUILD_OWNER)))
    }
}

#[async_trait]
impl ChannelDirectory for FakeDirectory {
    async fn get_channel(&self, channel_id: Snowflake) -> RepoResult<Option<ChannelInfo>> {
        Ok(self.channels.get(&channel_id).cloned())
    }

    async fn dm_channels_for_user(&self, user_id: Snowflake) -> RepoResult<Vec<Snowflake>> {
        Ok(self
            .dm_recipients
            .iter()
            .filter(|(_, uid)| *uid == user_id)
            .map(|(cid, _)| *cid)
            .collect())
    }

    async fn is_dm_recipient(
        &self,
        channel_id: Snowflake,
        user_id: Snowflake,
    ) -> RepoResult<bool> {
        Ok(self.dm_recipients.contains(&(channel_id, user_id)))
    }
}

#[async_trait]
impl PermissionDirectory for FakeDirectory {
    async fn everyone_role(&self, guild_id: Snowflake) -> RepoResult<Option<RoleRecord>> {
        Ok(self.guilds.contains(&guild_id).then(|| {
            RoleRecord::everyone(guild_id, Permissions::VIEW_CHANNEL | Permissions::CONNECT)
        }))
    }

    async fn roles_for_member(
        &self,
        _guild_id: Snowflake,
        _user_id: Snowflake,
    ) -> RepoResult<Vec<RoleRecord>> {
        Ok(Vec::new())
    }

    async fn channel_overwrites(
        &self,
        _channel_id: Snowflake,
    ) -> RepoResult<Vec<PermissionOverwrite>> {
        Ok(Vec::new())
    }
}

/// Voice-state storage backed by plain maps
///
/// Mirrors the Redis store's contract closely enough for the coordinator:
/// one state record per user plus per-channel membership sets. Refresh
/// calls are counted so tests can observe TTL keepalives.
#[derive(Debug, Default)]
pub struct InMemoryVoiceStore {
    states: Mutex<HashMap<Snowflake, VoiceState>>,
    channels: Mutex<HashMap<Snowflake, HashSet<Snowflake>>>,
    refreshes: AtomicUsize,
}

impl InMemoryVoiceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Channels whose membership set currently contains the user
    pub fn occupied_channels(&self, user_id: Snowflake) -> Vec<Snowflake> {
        self.channels
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, members)| members.contains(&user_id))
            .map(|(channel_id, _)| *channel_id)
            .collect()
    }

    pub fn refresh_count(&self) -> usize {
        self.refreshes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl VoiceStateRepository for InMemoryVoiceStore {
    async fn get_state(&self, user_id: Snowflake) -> RepoResult<Option<VoiceState>> {
        Ok(self.states.lock().unwrap().get(&user_id).cloned())
    }

    async fn save_state(&self, state: &VoiceState) -> RepoResult<()> {
        self.states.lock().unwrap().insert(state.user_id, state.clone());
        Ok(())
    }

    async fn clear_state(&self, user_id: Snowflake) -> RepoResult<bool> {
        Ok(self.states.lock().unwrap().remove(&user_id).is_some())
    }

    async fn refresh_state(&self, user_id: Snowflake) -> RepoResult<bool> {
        self.refreshes.fetch_add(1, Ordering::SeqCst);
        Ok(self.states.lock().unwrap().contains_key(&user_id))
    }

    async fn add_to_channel(&self, channel_id: Snowflake, user_id: Snowflake) -> RepoResult<()> {
        self.channels
            .lock()
            .unwrap()
            .entry(channel_id)
            .or_default()
            .insert(user_id);
        Ok(())
    }

    async fn remove_from_channel(
        &self,
        channel_id: Snowflake,
        user_id: Snowflake,
    ) -> RepoResult<()> {
        if let Some(members) = self.channels.lock().unwrap().get_mut(&channel_id) {
            members.remove(&user_id);
        }
        Ok(())
    }
}

/// Media grants with a recognizable token per (user, channel)
pub struct FakeCallTokens;

#[async_trait]
impl CallTokenIssuer for FakeCallTokens {
    async fn issue(
        &self,
        user_id: Snowflake,
        channel_id: Snowflake,
        _guild_id: Snowflake,
    ) -> RepoResult<CallToken> {
        Ok(CallToken {
            token: format!("media-{user_id}-{channel_id}"),
            endpoint: "wss://voice.test".to_string(),
        })
    }
}

/// Verifier for paths that never authenticate through a token in tests;
/// connections are authenticated directly on the manager instead
pub struct FakeVerifier;

#[async_trait]
impl CredentialVerifier for FakeVerifier {
    async fn verify(&self, _token: &str) -> RepoResult<Option<Snowflake>> {
        Ok(None)
    }
}

/// Coordinator over the in-memory store and fake directory
pub fn coordinator(
    directory: Arc<FakeDirectory>,
    store: Arc<InMemoryVoiceStore>,
) -> VoiceCoordinator {
    let permissions = Arc::new(PermissionService::new(
        directory.clone(),
        directory.clone(),
        directory.clone(),
    ));

    VoiceCoordinator::new(store, directory, permissions, Arc::new(FakeCallTokens))
}

fn test_config() -> AppConfig {
    AppConfig {
        app: AppSettings {
            name: "concord-gateway".to_string(),
            env: Environment::Development,
        },
        gateway: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
        },
        // Port 1 is never listening; cache operations fail fast
        redis: RedisConfig {
            url: "redis://127.0.0.1:1".to_string(),
            max_connections: 1,
        },
        auth: AuthConfig {
            token_secret: "test-secret".to_string(),
        },
        voice: VoiceConfig {
            token_secret: "voice-secret".to_string(),
            endpoint: "wss://voice.test".to_string(),
            token_ttl_secs: 60,
        },
        heartbeat: HeartbeatConfig {
            interval_ms: 45_000,
            timeout_ms: 90_000,
        },
    }
}

/// Full gateway state over the fakes, plus the manager for wiring
/// connections directly
pub fn gateway_state(
    directory: Arc<FakeDirectory>,
    store: Arc<InMemoryVoiceStore>,
) -> (GatewayState, Arc<ConnectionManager>) {
    let config = test_config();

    let permission_service = Arc::new(PermissionService::new(
        directory.clone(),
        directory.clone(),
        directory.clone(),
    ));

    let voice_coordinator = Arc::new(VoiceCoordinator::new(
        store,
        directory.clone(),
        permission_service.clone(),
        Arc::new(FakeCallTokens),
    ));

    let redis_pool = RedisPool::new(RedisPoolConfig {
        url: config.redis.url.clone(),
        max_connections: config.redis.max_connections as usize,
    })
    .expect("pool construction is lazy");

    let presence_store = PresenceStore::new(redis_pool.clone());
    let publisher = Publisher::new(redis_pool);

    let connection_manager = ConnectionManager::new_shared();
    let event_dispatcher = Arc::new(EventDispatcher::new(
        SubscriberConfig {
            redis_url: config.redis.url.clone(),
            ..SubscriberConfig::default()
        },
        connection_manager.clone(),
        permission_service.clone(),
    ));

    let state = GatewayState::new(
        Arc::new(FakeVerifier),
        directory.clone(),
        directory,
        permission_service,
        voice_coordinator,
        presence_store,
        publisher,
        connection_manager.clone(),
        event_dispatcher,
        config,
    );

    (state, connection_manager)
}
