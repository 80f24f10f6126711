//! Role summary as exposed by the permission directory

use serde::{Deserialize, Serialize};

use crate::value_objects::{Permissions, Snowflake};

/// The slice of a role the resolver needs: identity and base permissions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleRecord {
    pub id: Snowflake,
    pub guild_id: Snowflake,
    pub permissions: Permissions,
    pub is_everyone: bool,
}

impl RoleRecord {
    /// Create a role summary
    #[must_use]
    pub fn new(id: Snowflake, guild_id: Snowflake, permissions: Permissions) -> Self {
        Self {
            id,
            guild_id,
            permissions,
            is_everyone: false,
        }
    }

    /// Create the @everyone role summary for a guild
    ///
    /// By convention the @everyone role shares the guild's id.
    #[must_use]
    pub fn everyone(guild_id: Snowflake, permissions: Permissions) -> Self {
        Self {
            id: guild_id,
            guild_id,
            permissions,
            is_everyone: true,
        }
    }

    /// Check if this role grants a specific permission
    #[inline]
    pub fn has_permission(&self, permission: Permissions) -> bool {
        self.permissions.has(permission)
    }
}
