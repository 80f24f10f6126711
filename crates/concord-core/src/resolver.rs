//! Channel permission resolution
//!
//! Pure function over a pre-fetched context. Precedence, lowest to highest:
//! role base bits, @everyone overwrite, aggregated role overwrites, member
//! overwrite. Each overwrite tier applies deny before allow. Owner and
//! ADMINISTRATOR short-circuit to all bits before any overwrite is read.
//!
//! Direct conversations (DM/group DM) are outside this algorithm; access
//! there is recipient membership and recipients hold all bits.

use crate::entities::{OverwriteTarget, PermissionOverwrite, RoleRecord};
use crate::value_objects::{Permissions, Snowflake};

/// Everything the resolver needs, fetched up front by the caller
#[derive(Debug, Clone)]
pub struct PermissionContext {
    pub guild_id: Snowflake,
    pub owner_id: Snowflake,
    pub user_id: Snowflake,
    /// Base permissions of the guild's @everyone role
    pub everyone: Permissions,
    /// Roles held by the member, @everyone excluded
    pub roles: Vec<RoleRecord>,
    /// Overwrites of the channel being resolved
    pub overwrites: Vec<PermissionOverwrite>,
}

/// Compute the member's effective permissions for the channel
pub fn resolve(ctx: &PermissionContext) -> Permissions {
    if ctx.user_id == ctx.owner_id {
        return Permissions::ALL;
    }

    let mut perms = ctx.everyone | Permissions::combine(ctx.roles.iter().map(|r| r.permissions));
    if perms.contains(Permissions::ADMINISTRATOR) {
        return Permissions::ALL;
    }

    // The @everyone overwrite targets the guild id
    if let Some(everyone_ow) = ctx
        .overwrites
        .iter()
        .find(|o| o.target_type == OverwriteTarget::Role && o.target_id == ctx.guild_id)
    {
        perms = everyone_ow.apply(perms);
    }

    // Role overwrites for held roles aggregate into one deny/allow pair
    let mut role_deny = Permissions::empty();
    let mut role_allow = Permissions::empty();
    for overwrite in ctx.overwrites.iter().filter(|o| {
        o.target_type == OverwriteTarget::Role
            && o.target_id != ctx.guild_id
            && ctx.roles.iter().any(|r| r.id == o.target_id)
    }) {
        role_deny |= overwrite.deny;
        role_allow |= overwrite.allow;
    }
    perms = (perms & !role_deny) | role_allow;

    // Member overwrite applies last and wins
    if let Some(member_ow) = ctx
        .overwrites
        .iter()
        .find(|o| o.target_type == OverwriteTarget::Member && o.target_id == ctx.user_id)
    {
        perms = member_ow.apply(perms);
    }

    perms
}

#[cfg(test)]
mod tests {
    use super::*;

    const GUILD: Snowflake = Snowflake::new(100);
    const OWNER: Snowflake = Snowflake::new(1);
    const USER: Snowflake = Snowflake::new(2);

    fn ctx() -> PermissionContext {
        PermissionContext {
            guild_id: GUILD,
            owner_id: OWNER,
            user_id: USER,
            everyone: Permissions::DEFAULT,
            roles: Vec::new(),
            overwrites: Vec::new(),
        }
    }

    #[test]
    fn test_owner_short_circuit() {
        let mut c = ctx();
        c.user_id = OWNER;
        c.everyone = Permissions::empty();
        // Even a deny-all member overwrite is ignored for the owner
        c.overwrites
            .push(PermissionOverwrite::member(OWNER, Permissions::empty(), Permissions::ALL));
        assert_eq!(resolve(&c), Permissions::ALL);
    }

    #[test]
    fn test_administrator_short_circuit() {
        let mut c = ctx();
        c.roles
            .push(RoleRecord::new(Snowflake::new(10), GUILD, Permissions::ADMINISTRATOR));
        c.overwrites
            .push(PermissionOverwrite::role(GUILD, Permissions::empty(), Permissions::ALL));
        assert_eq!(resolve(&c), Permissions::ALL);
    }

    #[test]
    fn test_base_is_everyone_or_roles() {
        let mut c = ctx();
        c.everyone = Permissions::VIEW_CHANNEL;
        c.roles
            .push(RoleRecord::new(Snowflake::new(10), GUILD, Permissions::SEND_MESSAGES));
        c.roles
            .push(RoleRecord::new(Snowflake::new(11), GUILD, Permissions::CONNECT));
        let perms = resolve(&c);
        assert!(perms.contains(Permissions::VIEW_CHANNEL));
        assert!(perms.contains(Permissions::SEND_MESSAGES));
        assert!(perms.contains(Permissions::CONNECT));
        assert!(!perms.contains(Permissions::MANAGE_GUILD));
    }

    #[test]
    fn test_everyone_overwrite_applies_first() {
        let mut c = ctx();
        c.everyone = Permissions::VIEW_CHANNEL | Permissions::SEND_MESSAGES;
        c.overwrites.push(PermissionOverwrite::role(
            GUILD,
            Permissions::ADD_REACTIONS,
            Permissions::SEND_MESSAGES,
        ));
        let perms = resolve(&c);
        assert!(perms.contains(Permissions::VIEW_CHANNEL));
        assert!(!perms.contains(Permissions::SEND_MESSAGES));
        assert!(perms.contains(Permissions::ADD_REACTIONS));
    }

    #[test]
    fn test_role_overwrites_aggregate() {
        let role_a = Snowflake::new(10);
        let role_b = Snowflake::new(11);
        let mut c = ctx();
        c.everyone = Permissions::VIEW_CHANNEL;
        c.roles.push(RoleRecord::new(role_a, GUILD, Permissions::empty()));
        c.roles.push(RoleRecord::new(role_b, GUILD, Permissions::empty()));
        // One role denies VIEW, another allows it; allow wins inside the tier
        c.overwrites
            .push(PermissionOverwrite::role(role_a, Permissions::empty(), Permissions::VIEW_CHANNEL));
        c.overwrites
            .push(PermissionOverwrite::role(role_b, Permissions::VIEW_CHANNEL, Permissions::empty()));
        assert!(resolve(&c).contains(Permissions::VIEW_CHANNEL));
    }

    #[test]
    fn test_unheld_role_overwrite_ignored() {
        let mut c = ctx();
        c.everyone = Permissions::VIEW_CHANNEL;
        c.overwrites.push(PermissionOverwrite::role(
            Snowflake::new(10),
            Permissions::empty(),
            Permissions::VIEW_CHANNEL,
        ));
        assert!(resolve(&c).contains(Permissions::VIEW_CHANNEL));
    }

    #[test]
    fn test_member_overwrite_wins_last() {
        let role = Snowflake::new(10);
        let mut c = ctx();
        c.everyone = Permissions::empty();
        c.roles.push(RoleRecord::new(role, GUILD, Permissions::empty()));
        c.overwrites.push(PermissionOverwrite::role(
            GUILD,
            Permissions::empty(),
            Permissions::VIEW_CHANNEL,
        ));
        c.overwrites.push(PermissionOverwrite::role(
            role,
            Permissions::VIEW_CHANNEL,
            Permissions::empty(),
        ));
        c.overwrites.push(PermissionOverwrite::member(
            USER,
            Permissions::empty(),
            Permissions::VIEW_CHANNEL,
        ));
        // Role overwrite granted VIEW, member overwrite takes it away again
        assert!(!resolve(&c).contains(Permissions::VIEW_CHANNEL));
    }

    #[test]
    fn test_other_members_overwrite_ignored() {
        let mut c = ctx();
        c.everyone = Permissions::VIEW_CHANNEL;
        c.overwrites.push(PermissionOverwrite::member(
            Snowflake::new(99),
            Permissions::empty(),
            Permissions::VIEW_CHANNEL,
        ));
        assert!(resolve(&c).contains(Permissions::VIEW_CHANNEL));
    }

    #[test]
    fn test_moderator_scenario() {
        // Channel denies VIEW_CHANNEL to @everyone and allows it to the
        // moderator role. A plain member loses it; a moderator keeps it.
        let moderator = Snowflake::new(10);
        let overwrites = vec![
            PermissionOverwrite::role(GUILD, Permissions::empty(), Permissions::VIEW_CHANNEL),
            PermissionOverwrite::role(moderator, Permissions::VIEW_CHANNEL, Permissions::empty()),
        ];

        let plain = PermissionContext {
            guild_id: GUILD,
            owner_id: OWNER,
            user_id: Snowflake::new(20),
            everyone: Permissions::DEFAULT,
            roles: Vec::new(),
            overwrites: overwrites.clone(),
        };
        assert!(!resolve(&plain).contains(Permissions::VIEW_CHANNEL));

        let mod_member = PermissionContext {
            guild_id: GUILD,
            owner_id: OWNER,
            user_id: Snowflake::new(21),
            everyone: Permissions::DEFAULT,
            roles: vec![RoleRecord::new(moderator, GUILD, Permissions::VIEW_CHANNEL)],
            overwrites,
        };
        assert!(resolve(&mod_member).contains(Permissions::VIEW_CHANNEL));
    }

    #[test]
    fn test_no_overwrites_returns_base() {
        let mut c = ctx();
        c.everyone = Permissions::DEFAULT;
        assert_eq!(resolve(&c), Permissions::DEFAULT);
    }
}
