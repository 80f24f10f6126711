//! Voice state storage module.

mod voice_store;

pub use voice_store::{VoiceStateStore, VOICE_STATE_TTL};
