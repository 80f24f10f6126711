//! Voice channel coordination

mod coordinator;

pub use coordinator::{VoiceCoordinator, VoiceTransition};
