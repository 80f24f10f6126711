//! # concord-gateway
//!
//! Realtime WebSocket gateway for the chat platform.
//!
//! Each connection walks a small state machine: the server sends Hello,
//! the client Identifies with a session token and declared intents, then
//! heartbeats keep the session alive while dispatch events flow out.
//! Events originate anywhere in the cluster and reach local connections
//! through Redis Pub/Sub rooms; delivery is filtered per session by
//! intents and per event by exclusion lists.
//!
//! ## Modules
//!
//! - [`protocol`]: Op codes, close codes, and message framing
//! - [`events`]: Dispatch event names and their intent requirements
//! - [`connection`]: Local connection and room-membership tracking
//! - [`handlers`]: Client op code handlers
//! - [`permissions`]: Channel permission resolution with a short memo
//! - [`voice`]: Voice channel membership coordination
//! - [`broadcast`]: Pub/Sub to WebSocket event dispatch
//! - [`server`]: Axum server wiring

pub mod broadcast;
pub mod connection;
pub mod events;
pub mod handlers;
pub mod permissions;
pub mod protocol;
pub mod server;
pub mod voice;

pub use server::{create_app, create_gateway_state, run, run_server, GatewayState};
