//! Presence storage module.

mod presence_store;

pub use presence_store::{PresenceRecord, PresenceStore, UserStatus, PRESENCE_TTL};
