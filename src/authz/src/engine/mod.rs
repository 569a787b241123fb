//! Access Decision Engine
//!
//! The single authority for "may this caller act on this resource". Every
//! operation is a thin wrapper over [`decide`], so the boolean and the
//! raising forms agree on every input.
//!
//! The engine is a pure function of its inputs: no I/O, no logging, no
//! shared state. [`AccessEngine`] is a zero-sized `Copy` value that can be
//! shared freely across request tasks.

pub mod decision;

pub use decision::{AccessDecision, AccessRule};

use crate::error::Result;
use crate::role::Role;
use crate::types::{CallerIdentity, Owned, UserId};

/// Lowest role that may act on content it does not own
pub const PRIVILEGE_THRESHOLD: Role = Role::Moderator;

/// Evaluate `rule` for `caller`
pub fn decide(caller: &CallerIdentity, rule: AccessRule<'_>) -> AccessDecision {
    let privileged = caller.role().is_at_least(PRIVILEGE_THRESHOLD);

    let allowed = match rule {
        AccessRule::OwnerOrPrivileged(owner) => {
            privileged || owner.is_some_and(|owner| owner == caller.id())
        }
        AccessRule::PrivilegedOnly => privileged,
    };

    AccessDecision::from_bool(allowed)
}

/// Stateless access decision engine
///
/// # Example
///
/// ```
/// use pixntalk_authz::{AccessEngine, CallerIdentity, Role, UserId};
///
/// let engine = AccessEngine::new();
/// let caller = CallerIdentity::new("u1", Role::User);
///
/// assert!(engine.check_owner_or_privileged(&caller, &UserId::from("u1")).is_allowed());
/// assert!(engine.assert_privileged_only(&caller).is_err());
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AccessEngine;

impl AccessEngine {
    pub const fn new() -> Self {
        AccessEngine
    }

    /// Evaluate an arbitrary rule
    pub fn evaluate(&self, caller: &CallerIdentity, rule: AccessRule<'_>) -> AccessDecision {
        decide(caller, rule)
    }

    /// Allowed iff the caller owns the resource or is a moderator/admin
    pub fn check_owner_or_privileged(
        &self,
        caller: &CallerIdentity,
        owner_id: &UserId,
    ) -> AccessDecision {
        decide(caller, AccessRule::OwnerOrPrivileged(Some(owner_id)))
    }

    /// Raising form of [`check_owner_or_privileged`](Self::check_owner_or_privileged)
    pub fn assert_owner_or_privileged(
        &self,
        caller: &CallerIdentity,
        owner_id: &UserId,
    ) -> Result<()> {
        self.check_owner_or_privileged(caller, owner_id).into_result()
    }

    /// Allowed iff the caller is a moderator/admin
    pub fn check_privileged_only(&self, caller: &CallerIdentity) -> AccessDecision {
        decide(caller, AccessRule::PrivilegedOnly)
    }

    /// Raising form of [`check_privileged_only`](Self::check_privileged_only)
    pub fn assert_privileged_only(&self, caller: &CallerIdentity) -> Result<()> {
        self.check_privileged_only(caller).into_result()
    }

    /// Owner-or-privileged check against whatever owner `resource` records.
    /// Unowned resources are open to privileged roles only.
    pub fn check_resource<R: Owned + ?Sized>(
        &self,
        caller: &CallerIdentity,
        resource: &R,
    ) -> AccessDecision {
        decide(caller, AccessRule::OwnerOrPrivileged(resource.owner_id()))
    }

    /// Raising form of [`check_resource`](Self::check_resource)
    pub fn assert_resource<R: Owned + ?Sized>(
        &self,
        caller: &CallerIdentity,
        resource: &R,
    ) -> Result<()> {
        self.check_resource(caller, resource).into_result()
    }
}
