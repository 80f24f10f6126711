//! Connection manager
//!
//! Manages all active WebSocket connections using DashMap for thread-safe access.

use super::{Connection, ConnectionState};
use crate::protocol::GatewayMessage;
use concord_cache::Room;
use concord_core::{Intents, Snowflake};
use dashmap::DashMap;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Manages all active WebSocket connections
///
/// Uses `DashMap` for concurrent access to connection state.
pub struct ConnectionManager {
    /// Active connections by session ID
    connections: DashMap<String, Arc<Connection>>,

    /// User ID to session IDs mapping
    user_connections: DashMap<Snowflake, HashSet<String>>,

    /// Room to session IDs mapping
    room_connections: DashMap<Room, HashSet<String>>,
}

impl ConnectionManager {
    /// Create a new connection manager
    #[must_use]
    pub fn new() -> Self {
        Self {
            connections: DashMap::new(),
            user_connections: DashMap::new(),
            room_connections: DashMap::new(),
        }
    }

    /// Create a new connection manager wrapped in Arc
    #[must_use]
    pub fn new_shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Register a new connection
    pub fn add_connection(
        &self,
        session_id: String,
        sender: mpsc::Sender<GatewayMessage>,
    ) -> Arc<Connection> {
        let connection = Connection::new(session_id.clone(), sender);
        self.connections.insert(session_id.clone(), connection.clone());

        tracing::debug!(session_id = %session_id, "Connection added");

        connection
    }

    /// Remove a connection
    ///
    /// Uses `alter` for atomic modify-and-cleanup operations to avoid TOCTOU
    /// race conditions. Returns the rooms that have no local members left,
    /// so the caller can drop their Pub/Sub subscriptions.
    pub async fn remove_connection(&self, session_id: &str) -> Vec<Room> {
        let mut emptied = Vec::new();

        if let Some((_, connection)) = self.connections.remove(session_id) {
            // Remove from user mapping
            if let Some(user_id) = connection.user_id().await {
                // Atomically modify the sessions set
                self.user_connections.alter(&user_id, |_, mut sessions| {
                    sessions.remove(session_id);
                    sessions
                });

                // Clean up empty entry - use retain for atomic removal
                self.user_connections.retain(|_, sessions| !sessions.is_empty());
            }

            // Remove from room mappings
            for room in connection.rooms().await {
                self.room_connections.alter(&room, |_, mut sessions| {
                    sessions.remove(session_id);
                    sessions
                });

                if self
                    .room_connections
                    .get(&room)
                    .is_some_and(|sessions| sessions.is_empty())
                {
                    emptied.push(room);
                }
            }

            // Clean up all empty room entries atomically
            self.room_connections.retain(|_, sessions| !sessions.is_empty());

            tracing::debug!(session_id = %session_id, "Connection removed");
        }

        emptied
    }

    /// Get a connection by session ID
    pub fn get_connection(&self, session_id: &str) -> Option<Arc<Connection>> {
        self.connections.get(session_id).map(|r| r.clone())
    }

    /// Authenticate a connection (link to user, record intents)
    pub async fn authenticate_connection(
        &self,
        session_id: &str,
        user_id: Snowflake,
        intents: Intents,
    ) -> bool {
        if let Some(connection) = self.connections.get(session_id) {
            connection.set_user_id(user_id).await;
            connection.set_intents(intents).await;
            connection.set_state(ConnectionState::Connected).await;

            // Add to user mapping
            self.user_connections
                .entry(user_id)
                .or_default()
                .insert(session_id.to_string());

            tracing::debug!(
                session_id = %session_id,
                user_id = %user_id,
                intents = %intents,
                "Connection authenticated"
            );

            true
        } else {
            false
        }
    }

    /// Subscribe a connection to a room
    ///
    /// Returns `true` if this is the first local connection in the room,
    /// meaning the caller should open a Pub/Sub subscription for it.
    pub async fn join_room(&self, session_id: &str, room: Room) -> Option<bool> {
        let connection = self.connections.get(session_id)?;
        connection.join_room(room).await;

        let mut first = false;
        self.room_connections
            .entry(room)
            .and_modify(|sessions| {
                sessions.insert(session_id.to_string());
            })
            .or_insert_with(|| {
                first = true;
                HashSet::from([session_id.to_string()])
            });

        tracing::trace!(
            session_id = %session_id,
            room = %room,
            "Connection joined room"
        );

        Some(first)
    }

    /// Unsubscribe a connection from a room
    ///
    /// Returns `true` if the room has no local members left.
    pub async fn leave_room(&self, session_id: &str, room: Room) -> Option<bool> {
        let connection = self.connections.get(session_id)?;
        connection.leave_room(room).await;

        // Atomically modify the sessions set
        self.room_connections.alter(&room, |_, mut sessions| {
            sessions.remove(session_id);
            sessions
        });

        let empty = self
            .room_connections
            .get(&room)
            .is_none_or(|sessions| sessions.is_empty());

        // Clean up empty entry
        self.room_connections.retain(|_, sessions| !sessions.is_empty());

        tracing::trace!(
            session_id = %session_id,
            room = %room,
            "Connection left room"
        );

        Some(empty)
    }

    /// Get all connections for a user
    pub fn get_user_connections(&self, user_id: Snowflake) -> Vec<Arc<Connection>> {
        self.user_connections
            .get(&user_id)
            .map(|sessions| {
                sessions
                    .iter()
                    .filter_map(|sid| self.connections.get(sid).map(|c| c.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Get all connections in a room
    pub fn get_room_connections(&self, room: Room) -> Vec<Arc<Connection>> {
        self.room_connections
            .get(&room)
            .map(|sessions| {
                sessions
                    .iter()
                    .filter_map(|sid| self.connections.get(sid).map(|c| c.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Check whether this is the user's only connection on this process
    pub fn is_last_local_connection(&self, user_id: Snowflake, session_id: &str) -> bool {
        self.user_connections
            .get(&user_id)
            .is_none_or(|sessions| sessions.len() == 1 && sessions.contains(session_id))
    }

    /// Send a message to all connections of a user
    pub async fn send_to_user(&self, user_id: Snowflake, message: GatewayMessage) -> usize {
        let connections = self.get_user_connections(user_id);
        let mut sent = 0;

        for conn in connections {
            let seq = conn.next_sequence();
            let mut message = message.clone();
            message.s = Some(seq);

            if conn.send(message).await.is_ok() {
                sent += 1;
            }
        }

        tracing::trace!(
            user_id = %user_id,
            sent = sent,
            "Message sent to user connections"
        );

        sent
    }

    /// Send a dispatch to every connection in a room
    ///
    /// Connections that do not cover `required` or whose user is in
    /// `exclude_users` are skipped. Each delivered copy carries that
    /// connection's own sequence number.
    pub async fn send_to_room(
        &self,
        room: Room,
        required: Intents,
        message: GatewayMessage,
        exclude_users: &[Snowflake],
    ) -> usize {
        let connections = self.get_room_connections(room);
        let mut sent = 0;

        for conn in connections {
            if !conn.covers(required).await {
                continue;
            }

            if let Some(user_id) = conn.user_id().await {
                if exclude_users.contains(&user_id) {
                    continue;
                }
            }

            let seq = conn.next_sequence();
            let mut message = message.clone();
            message.s = Some(seq);

            if conn.send(message).await.is_ok() {
                sent += 1;
            }
        }

        tracing::trace!(
            room = %room,
            sent = sent,
            "Message sent to room connections"
        );

        sent
    }

    /// Get the total number of active connections
    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    /// Get the number of unique authenticated users
    pub fn user_count(&self) -> usize {
        self.user_connections.len()
    }

    /// Get the number of rooms with active connections
    pub fn room_count(&self) -> usize {
        self.room_connections.len()
    }

    /// Check if a session exists
    pub fn has_session(&self, session_id: &str) -> bool {
        self.connections.contains_key(session_id)
    }

    /// Clean up closed connections
    pub async fn cleanup_closed_connections(&self) -> usize {
        let closed: Vec<String> = self
            .connections
            .iter()
            .filter(|r| r.is_closed())
            .map(|r| r.key().clone())
            .collect();

        let count = closed.len();

        for session_id in closed {
            self.remove_connection(&session_id).await;
        }

        if count > 0 {
            tracing::info!(count = count, "Cleaned up closed connections");
        }

        count
    }
}

impl Default for ConnectionManager {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ConnectionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionManager")
            .field("connections", &self.connections.len())
            .field("users", &self.user_connections.len())
            .field("rooms", &self.room_connections.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_connection_manager_creation() {
        let manager = ConnectionManager::new();
        assert_eq!(manager.connection_count(), 0);
        assert_eq!(manager.user_count(), 0);
        assert_eq!(manager.room_count(), 0);
    }

    #[tokio::test]
    async fn test_add_remove_connection() {
        let manager = ConnectionManager::new();
        let (tx, _rx) = mpsc::channel(10);

        let conn = manager.add_connection("session1".to_string(), tx);
        assert_eq!(conn.session_id(), "session1");
        assert_eq!(manager.connection_count(), 1);
        assert!(manager.has_session("session1"));

        manager.remove_connection("session1").await;
        assert_eq!(manager.connection_count(), 0);
        assert!(!manager.has_session("session1"));
    }

    #[tokio::test]
    async fn test_authenticate_connection() {
        let manager = ConnectionManager::new();
        let (tx, _rx) = mpsc::channel(10);

        manager.add_connection("session1".to_string(), tx);

        let user_id = Snowflake::from(12345i64);
        assert!(
            manager
                .authenticate_connection("session1", user_id, Intents::ALL)
                .await
        );
        assert_eq!(manager.user_count(), 1);

        let connections = manager.get_user_connections(user_id);
        assert_eq!(connections.len(), 1);
    }

    #[tokio::test]
    async fn test_room_membership() {
        let manager = ConnectionManager::new();
        let (tx, _rx) = mpsc::channel(10);

        manager.add_connection("session1".to_string(), tx);

        let room = Room::guild(Snowflake::from(67890i64));
        assert_eq!(manager.join_room("session1", room).await, Some(true));
        assert_eq!(manager.room_count(), 1);

        let connections = manager.get_room_connections(room);
        assert_eq!(connections.len(), 1);

        assert_eq!(manager.leave_room("session1", room).await, Some(true));
        let connections = manager.get_room_connections(room);
        assert_eq!(connections.len(), 0);
    }

    #[tokio::test]
    async fn test_join_room_first_flag() {
        let manager = ConnectionManager::new();
        let (tx1, _rx1) = mpsc::channel(10);
        let (tx2, _rx2) = mpsc::channel(10);

        manager.add_connection("session1".to_string(), tx1);
        manager.add_connection("session2".to_string(), tx2);

        let room = Room::guild(Snowflake::from(1i64));
        assert_eq!(manager.join_room("session1", room).await, Some(true));
        assert_eq!(manager.join_room("session2", room).await, Some(false));

        // Not empty yet, session2 is still there
        assert_eq!(manager.leave_room("session1", room).await, Some(false));
        assert_eq!(manager.leave_room("session2", room).await, Some(true));
    }

    #[tokio::test]
    async fn test_multiple_user_connections() {
        let manager = ConnectionManager::new();
        let (tx1, _rx1) = mpsc::channel(10);
        let (tx2, _rx2) = mpsc::channel(10);

        manager.add_connection("session1".to_string(), tx1);
        manager.add_connection("session2".to_string(), tx2);

        let user_id = Snowflake::from(12345i64);
        manager
            .authenticate_connection("session1", user_id, Intents::ALL)
            .await;
        manager
            .authenticate_connection("session2", user_id, Intents::ALL)
            .await;

        let connections = manager.get_user_connections(user_id);
        assert_eq!(connections.len(), 2);
        assert_eq!(manager.user_count(), 1);

        assert!(!manager.is_last_local_connection(user_id, "session1"));
        manager.remove_connection("session2").await;
        assert!(manager.is_last_local_connection(user_id, "session1"));
    }

    #[tokio::test]
    async fn test_send_to_room_intent_filter() {
        let manager = ConnectionManager::new();
        let (tx1, mut rx1) = mpsc::channel(10);
        let (tx2, mut rx2) = mpsc::channel(10);

        manager.add_connection("session1".to_string(), tx1);
        manager.add_connection("session2".to_string(), tx2);

        let user1 = Snowflake::from(1i64);
        let user2 = Snowflake::from(2i64);
        manager
            .authenticate_connection("session1", user1, Intents::GUILD_MESSAGES)
            .await;
        manager
            .authenticate_connection("session2", user2, Intents::ALL)
            .await;

        let room = Room::guild(Snowflake::from(100i64));
        manager.join_room("session1", room).await;
        manager.join_room("session2", room).await;

        let message = GatewayMessage::dispatch("PRESENCE_UPDATE", 0, serde_json::json!({}));
        let sent = manager
            .send_to_room(room, Intents::GUILD_PRESENCES, message, &[])
            .await;

        // Only session2 covers presence
        assert_eq!(sent, 1);
        assert!(rx1.try_recv().is_err());
        assert!(rx2.try_recv().is_ok());
    }

    #[tokio::test]
    async fn test_send_to_room_excludes_users() {
        let manager = ConnectionManager::new();
        let (tx1, mut rx1) = mpsc::channel(10);
        let (tx2, mut rx2) = mpsc::channel(10);

        manager.add_connection("session1".to_string(), tx1);
        manager.add_connection("session2".to_string(), tx2);

        let user1 = Snowflake::from(1i64);
        let user2 = Snowflake::from(2i64);
        manager
            .authenticate_connection("session1", user1, Intents::ALL)
            .await;
        manager
            .authenticate_connection("session2", user2, Intents::ALL)
            .await;

        let room = Room::guild(Snowflake::from(100i64));
        manager.join_room("session1", room).await;
        manager.join_room("session2", room).await;

        let message = GatewayMessage::dispatch("TYPING_START", 0, serde_json::json!({}));
        let sent = manager
            .send_to_room(room, Intents::GUILD_MESSAGE_TYPING, message, &[user1])
            .await;

        assert_eq!(sent, 1);
        assert!(rx1.try_recv().is_err());
        assert!(rx2.try_recv().is_ok());
    }

    #[tokio::test]
    async fn test_per_connection_sequence() {
        let manager = ConnectionManager::new();
        let (tx, mut rx) = mpsc::channel(10);

        manager.add_connection("session1".to_string(), tx);
        let user_id = Snowflake::from(1i64);
        manager
            .authenticate_connection("session1", user_id, Intents::ALL)
            .await;

        let room = Room::guild(Snowflake::from(100i64));
        manager.join_room("session1", room).await;

        let message = GatewayMessage::dispatch("MESSAGE_CREATE", 0, serde_json::json!({}));
        manager
            .send_to_room(room, Intents::GUILD_MESSAGES, message.clone(), &[])
            .await;
        manager
            .send_to_room(room, Intents::GUILD_MESSAGES, message, &[])
            .await;

        let first = rx.try_recv().unwrap();
        let second = rx.try_recv().unwrap();
        assert_eq!(first.s, Some(1));
        assert_eq!(second.s, Some(2));
    }

    #[tokio::test]
    async fn test_remove_connection_reports_emptied_rooms() {
        let manager = ConnectionManager::new();
        let (tx1, _rx1) = mpsc::channel(10);
        let (tx2, _rx2) = mpsc::channel(10);

        manager.add_connection("session1".to_string(), tx1);
        manager.add_connection("session2".to_string(), tx2);

        let shared = Room::guild(Snowflake::from(1i64));
        let solo = Room::user(Snowflake::from(2i64));
        manager.join_room("session1", shared).await;
        manager.join_room("session2", shared).await;
        manager.join_room("session1", solo).await;

        let emptied = manager.remove_connection("session1").await;
        assert!(emptied.contains(&solo));
        assert!(!emptied.contains(&shared));
    }
}
