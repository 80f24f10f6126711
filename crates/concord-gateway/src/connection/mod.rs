//! Connection management
//!
//! Tracks every local WebSocket connection and its room memberships.

mod connection;
mod manager;

pub use connection::{Connection, ConnectionState};
pub use manager::ConnectionManager;
