//! Entity summaries - the slices of platform entities the gateway core needs

mod channel;
mod overwrite;
mod role;
mod voice;

pub use channel::{ChannelInfo, ChannelType};
pub use overwrite::{OverwriteTarget, PermissionOverwrite};
pub use role::RoleRecord;
pub use voice::VoiceState;
