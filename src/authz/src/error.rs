//! Error types for authorization and authentication

use thiserror::Error;

/// Authorization and authentication errors
#[derive(Debug, Error)]
pub enum AuthzError {
    /// Caller lacks privilege for the requested action.
    ///
    /// Carries no resource detail so a denial never reveals whether the
    /// resource exists.
    #[error("Access denied")]
    AccessDenied,

    /// Role value outside the closed role set
    #[error("Invalid role: {0}")]
    InvalidRole(String),

    /// Bearer credential could not be turned into a caller identity
    #[error("Could not validate credentials: {0}")]
    Unauthenticated(String),

    /// Token is malformed or its signature does not verify
    #[error("Invalid token: {0}")]
    InvalidToken(String),

    /// Token signature is valid but `exp` has passed
    #[error("Token has expired")]
    TokenExpired,

    /// Unknown email or wrong password at login
    #[error("Invalid email or password")]
    InvalidCredentials,

    /// Account is banned
    #[error("User is banned")]
    UserBanned,

    /// Account email has not been confirmed
    #[error("User is not confirmed")]
    UserInactive,

    /// No user with the given identifier
    #[error("User not found: {0}")]
    UserNotFound(String),

    /// An account with this email is already registered
    #[error("Account already exists: {0}")]
    AlreadyExists(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Metric registration failed
    #[error("Metrics error: {0}")]
    Metrics(#[from] prometheus::Error),

    /// Password hashing error
    #[error("Password hashing failed: {0}")]
    PasswordHash(String),

    /// JSON encoding or decoding error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AuthzError {
    /// True for the routine "caller lacks privilege" outcome
    pub fn is_access_denied(&self) -> bool {
        matches!(self, AuthzError::AccessDenied)
    }

    /// True when the caller could not be authenticated at all
    pub fn is_authentication_failure(&self) -> bool {
        matches!(
            self,
            AuthzError::Unauthenticated(_)
                | AuthzError::InvalidToken(_)
                | AuthzError::TokenExpired
                | AuthzError::InvalidCredentials
                | AuthzError::UserBanned
                | AuthzError::UserInactive
        )
    }
}

/// Result type for authorization operations
pub type Result<T> = std::result::Result<T, AuthzError>;
