//! Identity resolution: bearer credential → [`CallerIdentity`]
//!
//! The access engine assumes a validated identity. Everything that can fail
//! while establishing one (bad signature, expired token, unknown or banned
//! user) fails here, before the engine is reached.

pub mod authenticator;
pub mod directory;
pub mod password;
pub mod token;

pub use authenticator::{EmailRequest, TokenAuthenticator};
pub use directory::InMemoryUserDirectory;
pub use password::PasswordService;
pub use token::{Claims, TokenPair, TokenScope, TokenService};

use crate::error::Result;
use crate::role::Role;
use crate::types::{CallerIdentity, UserId};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Turns an opaque bearer credential into the caller identity
#[async_trait]
pub trait IdentityResolver: Send + Sync {
    async fn resolve(&self, bearer_token: &str) -> Result<CallerIdentity>;
}

/// Stored account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: UserId,
    pub name: String,
    pub email: String,

    /// Argon2 PHC string
    #[serde(skip_serializing)]
    pub password_hash: String,

    pub role: Role,

    /// Email confirmed
    #[serde(default)]
    pub is_active: bool,

    #[serde(default)]
    pub banned: bool,

    /// Refresh token currently issued to this account
    #[serde(skip_serializing, default)]
    pub refresh_token: Option<String>,

    pub created_at: DateTime<Utc>,
}

impl UserRecord {
    /// Identity this account authenticates as
    pub fn identity(&self) -> CallerIdentity {
        CallerIdentity::new(self.id.clone(), self.role)
    }
}

/// Registration input
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
}

/// Account storage used by the authenticator
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Register an account; fails with `AlreadyExists` for a taken email.
    /// The first account ever created is an admin.
    async fn create_user(&self, new_user: NewUser) -> Result<UserRecord>;

    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>>;

    async fn find_by_id(&self, id: &UserId) -> Result<Option<UserRecord>>;

    /// Mark the account's email as confirmed
    async fn activate(&self, id: &UserId) -> Result<()>;

    /// Store (or with `None`, revoke) the account's refresh token
    async fn update_token(&self, id: &UserId, refresh_token: Option<&str>) -> Result<()>;
}
