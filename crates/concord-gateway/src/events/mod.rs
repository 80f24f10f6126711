//! Gateway dispatch events
//!
//! Event type names, intent requirements, and locally-constructed payloads.

mod event_types;
mod payloads;

pub use event_types::GatewayEventType;
pub use payloads::{PresenceEvent, ReadyEvent, VoiceServerUpdateEvent};
