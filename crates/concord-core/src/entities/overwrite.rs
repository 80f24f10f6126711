//! Channel permission overwrites - per-channel allow/deny deltas

use serde::{Deserialize, Serialize};

use crate::value_objects::{Permissions, Snowflake};

/// What a channel overwrite targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverwriteTarget {
    /// Targets a role (the @everyone overwrite uses the guild id)
    Role,
    /// Targets a single member
    Member,
}

/// A channel-scoped allow/deny bitset delta
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionOverwrite {
    pub target_id: Snowflake,
    pub target_type: OverwriteTarget,
    pub allow: Permissions,
    pub deny: Permissions,
}

impl PermissionOverwrite {
    /// Create a role-targeted overwrite
    #[must_use]
    pub fn role(target_id: Snowflake, allow: Permissions, deny: Permissions) -> Self {
        Self {
            target_id,
            target_type: OverwriteTarget::Role,
            allow,
            deny,
        }
    }

    /// Create a member-targeted overwrite
    #[must_use]
    pub fn member(target_id: Snowflake, allow: Permissions, deny: Permissions) -> Self {
        Self {
            target_id,
            target_type: OverwriteTarget::Member,
            allow,
            deny,
        }
    }

    /// Apply this overwrite to a permission set (deny first, then allow)
    #[inline]
    pub fn apply(&self, base: Permissions) -> Permissions {
        (base & !self.deny) | self.allow
    }
}
