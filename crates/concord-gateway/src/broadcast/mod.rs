//! Event broadcasting
//!
//! Routes Pub/Sub events from other processes into local connections.

mod dispatcher;

pub use dispatcher::EventDispatcher;
