//! # PixnTalk Authorization
//!
//! Role and ownership authorization for the PixnTalk photo-sharing service.
//!
//! ## Components
//!
//! - **Role model** ([`Role`]) - closed, ordered set `User < Moderator < Admin`
//! - **Access engine** ([`AccessEngine`]) - pure owner-or-privileged and
//!   privileged-only decisions, in boolean and raising forms
//! - **Guard** ([`Guard`]) - what handlers call; logs and counts decisions
//! - **Identity** ([`identity`]) - signed bearer tokens, Argon2 passwords and
//!   the [`IdentityResolver`] that turns a token into a [`CallerIdentity`]
//! - **HTTP** (`http` feature) - axum extractor and `403`/`401` mapping
//!
//! ## Example
//!
//! ```rust
//! use pixntalk_authz::{AuthzError, CallerIdentity, Guard, OwnedResource, Role};
//!
//! let guard = Guard::new();
//! let photo = OwnedResource::photo("42", "u1");
//!
//! let owner = CallerIdentity::new("u1", Role::User);
//! assert!(guard.authorize_resource(&owner, &photo).is_ok());
//!
//! let stranger = CallerIdentity::new("u2", Role::User);
//! assert!(matches!(
//!     guard.authorize_resource(&stranger, &photo),
//!     Err(AuthzError::AccessDenied)
//! ));
//!
//! let moderator = CallerIdentity::new("u3", Role::Moderator);
//! assert!(guard.authorize_resource(&moderator, &photo).is_ok());
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod guard;
#[cfg(feature = "http")]
pub mod http;
pub mod identity;
pub mod role;
pub mod telemetry;
pub mod types;

// Re-export commonly used types
pub use config::{AuthConfig, LoggingConfig};
pub use engine::{decide, AccessDecision, AccessEngine, AccessRule};
pub use error::{AuthzError, Result};
pub use guard::{Guard, GuardMetricsSnapshot};
#[cfg(feature = "http")]
pub use http::{Caller, ProvidesIdentity};
pub use identity::{IdentityResolver, TokenAuthenticator, TokenService, UserDirectory};
pub use role::{is_at_least, Role};
pub use types::{CallerIdentity, Owned, OwnedResource, ResourceKind, UserId};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
