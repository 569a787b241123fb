//! Role model: the closed, ordered set of caller privileges

use crate::error::{AuthzError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Caller role
///
/// Variants are declared in privilege order, so the derived `Ord` is the
/// privilege order: `User < Moderator < Admin`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum Role {
    /// Regular account; may manage only its own content
    #[default]
    User,
    /// May manage anyone's content
    Moderator,
    /// Full administrative access
    Admin,
}

impl Role {
    /// Every role, lowest privilege first
    pub const ALL: [Role; 3] = [Role::User, Role::Moderator, Role::Admin];

    /// Privilege rank (0 = lowest)
    pub const fn rank(self) -> u8 {
        match self {
            Role::User => 0,
            Role::Moderator => 1,
            Role::Admin => 2,
        }
    }

    /// Role with the given rank, e.g. as stored in a database column
    pub fn from_rank(rank: u8) -> Result<Self> {
        Self::ALL
            .get(usize::from(rank))
            .copied()
            .ok_or_else(|| AuthzError::InvalidRole(format!("unknown role rank {}", rank)))
    }

    /// True iff this role's rank is at least `threshold`'s rank
    pub const fn is_at_least(self, threshold: Role) -> bool {
        self.rank() >= threshold.rank()
    }

    /// Moderator or above
    pub const fn is_privileged(self) -> bool {
        self.is_at_least(Role::Moderator)
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Moderator => "moderator",
            Role::Admin => "admin",
        }
    }
}

/// Free-function form of [`Role::is_at_least`]
pub fn is_at_least(role: Role, threshold: Role) -> bool {
    role.is_at_least(threshold)
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = AuthzError;

    /// Parses a role name, ignoring surrounding whitespace and ASCII case
    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|role| role.as_str() == normalized)
            .ok_or_else(|| AuthzError::InvalidRole(s.to_string()))
    }
}

impl TryFrom<String> for Role {
    type Error = AuthzError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl TryFrom<&str> for Role {
    type Error = AuthzError;

    fn try_from(value: &str) -> Result<Self> {
        value.parse()
    }
}
