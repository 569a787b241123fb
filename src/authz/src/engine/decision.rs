//! Access decision and rule types

use crate::error::{AuthzError, Result};
use crate::types::UserId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Outcome of an access check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessDecision {
    Allowed,
    Denied,
}

impl AccessDecision {
    pub const fn from_bool(allowed: bool) -> Self {
        if allowed {
            AccessDecision::Allowed
        } else {
            AccessDecision::Denied
        }
    }

    pub const fn is_allowed(self) -> bool {
        matches!(self, AccessDecision::Allowed)
    }

    pub const fn is_denied(self) -> bool {
        !self.is_allowed()
    }

    /// `Ok(())` when allowed, [`AuthzError::AccessDenied`] otherwise
    pub fn into_result(self) -> Result<()> {
        match self {
            AccessDecision::Allowed => Ok(()),
            AccessDecision::Denied => Err(AuthzError::AccessDenied),
        }
    }
}

impl From<AccessDecision> for bool {
    fn from(decision: AccessDecision) -> Self {
        decision.is_allowed()
    }
}

impl fmt::Display for AccessDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(if self.is_allowed() { "ALLOW" } else { "DENY" })
    }
}

/// Authorization rule a caller is checked against
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessRule<'a> {
    /// Resource owner, or any moderator/admin. `None` is an unowned resource.
    OwnerOrPrivileged(Option<&'a UserId>),

    /// Moderators and admins only; no ownership concept
    PrivilegedOnly,
}

impl AccessRule<'_> {
    /// Stable rule name for logs
    pub const fn name(&self) -> &'static str {
        match self {
            AccessRule::OwnerOrPrivileged(_) => "owner_or_privileged",
            AccessRule::PrivilegedOnly => "privileged_only",
        }
    }
}
