//! Token-based authentication flows and identity resolution

use super::{
    IdentityResolver, NewUser, PasswordService, TokenPair, TokenService, UserDirectory, UserRecord,
};
use crate::config::AuthConfig;
use crate::error::{AuthzError, Result};
use crate::types::CallerIdentity;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Outcome of a confirmation email request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmailRequest {
    /// Fresh email token to deliver to the account
    Issued(String),

    /// Account email is already confirmed; nothing to send
    AlreadyConfirmed,
}

/// Signup, login, refresh, logout and email confirmation over a [`UserDirectory`]
///
/// Also the production [`IdentityResolver`]: an access token resolves to
/// the identity of the active, non-banned account named by its subject.
pub struct TokenAuthenticator<D> {
    directory: Arc<D>,
    tokens: TokenService,
    passwords: PasswordService,
}

impl<D: UserDirectory> TokenAuthenticator<D> {
    pub fn new(directory: Arc<D>, tokens: TokenService) -> Self {
        Self {
            directory,
            tokens,
            passwords: PasswordService::new(),
        }
    }

    pub fn from_config(directory: Arc<D>, config: &AuthConfig) -> Self {
        Self::new(directory, TokenService::from_config(&config.auth))
    }

    pub fn directory(&self) -> &Arc<D> {
        &self.directory
    }

    pub fn tokens(&self) -> &TokenService {
        &self.tokens
    }

    pub fn passwords(&self) -> &PasswordService {
        &self.passwords
    }

    /// Register an account and issue its email confirmation token
    pub async fn signup(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<(UserRecord, String)> {
        if !email.contains('@') {
            return Err(AuthzError::InvalidInput(format!("invalid email {}", email)));
        }
        if password.is_empty() {
            return Err(AuthzError::InvalidInput("password must not be empty".to_string()));
        }

        let password_hash = self.passwords.hash(password)?;
        let user = self
            .directory
            .create_user(NewUser {
                name: name.to_string(),
                email: email.to_string(),
                password_hash,
            })
            .await?;

        let email_token = self.tokens.create_email_token(&user.email)?;
        info!(user = %user.id, "User signed up");
        Ok((user, email_token))
    }

    /// Exchange email + password for a token pair
    pub async fn login(&self, email: &str, password: &str) -> Result<TokenPair> {
        let Some(user) = self.directory.find_by_email(email).await? else {
            self.passwords.verify_unknown_account(password);
            return Err(AuthzError::InvalidCredentials);
        };

        if !self.passwords.verify(password, &user.password_hash) {
            warn!(user = %user.id, "Login rejected: wrong password");
            return Err(AuthzError::InvalidCredentials);
        }
        Self::ensure_may_sign_in(&user)?;

        let pair = self.issue_session(&user).await?;
        info!(user = %user.id, "User logged in");
        Ok(pair)
    }

    /// Exchange the account's current refresh token for a new token pair
    ///
    /// Each refresh token is single use. Presenting any other token than the
    /// one last issued revokes the stored token, ending the session.
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenPair> {
        let email = self.tokens.decode_refresh(refresh_token)?;
        let user = self.lookup(&email).await?;

        if !tokens_match(user.refresh_token.as_deref(), refresh_token) {
            self.directory.update_token(&user.id, None).await?;
            warn!(user = %user.id, "Refresh token reuse detected, session revoked");
            return Err(AuthzError::Unauthenticated("invalid refresh token".to_string()));
        }
        Self::ensure_may_sign_in(&user)?;

        let pair = self.issue_session(&user).await?;
        debug!(user = %user.id, "Tokens refreshed");
        Ok(pair)
    }

    /// Revoke the caller's refresh token
    pub async fn logout(&self, caller: &CallerIdentity) -> Result<()> {
        self.directory.update_token(caller.id(), None).await?;
        info!(user = %caller.id(), "User logged out");
        Ok(())
    }

    /// Confirm an account's email from an email token
    pub async fn confirm_email(&self, email_token: &str) -> Result<UserRecord> {
        let email = self.tokens.decode_email(email_token)?;
        let mut user = self
            .directory
            .find_by_email(&email)
            .await?
            .ok_or_else(|| AuthzError::InvalidInput("verification error".to_string()))?;

        if !user.is_active {
            self.directory.activate(&user.id).await?;
            user.is_active = true;
            info!(user = %user.id, "Email confirmed");
        }
        Ok(user)
    }

    /// New email confirmation token for an unconfirmed account
    pub async fn request_email(&self, email: &str) -> Result<EmailRequest> {
        let user = self
            .directory
            .find_by_email(email)
            .await?
            .ok_or_else(|| AuthzError::UserNotFound(email.to_string()))?;

        if user.is_active {
            return Ok(EmailRequest::AlreadyConfirmed);
        }

        debug!(user = %user.id, "Confirmation email requested");
        Ok(EmailRequest::Issued(self.tokens.create_email_token(&user.email)?))
    }

    async fn issue_session(&self, user: &UserRecord) -> Result<TokenPair> {
        let pair = self.tokens.issue_pair(&user.email)?;
        self.directory
            .update_token(&user.id, Some(&pair.refresh_token))
            .await?;
        Ok(pair)
    }

    async fn lookup(&self, email: &str) -> Result<UserRecord> {
        self.directory
            .find_by_email(email)
            .await?
            .ok_or_else(|| AuthzError::Unauthenticated("unknown subject".to_string()))
    }

    fn ensure_may_sign_in(user: &UserRecord) -> Result<()> {
        if !user.is_active {
            return Err(AuthzError::UserInactive);
        }
        if user.banned {
            return Err(AuthzError::UserBanned);
        }
        Ok(())
    }
}

/// Constant-time comparison against the stored refresh token
fn tokens_match(stored: Option<&str>, presented: &str) -> bool {
    match stored {
        Some(stored) => blake3::hash(stored.as_bytes()) == blake3::hash(presented.as_bytes()),
        None => false,
    }
}

#[async_trait]
impl<D: UserDirectory> IdentityResolver for TokenAuthenticator<D> {
    async fn resolve(&self, bearer_token: &str) -> Result<CallerIdentity> {
        let email = self.tokens.decode_access(bearer_token)?;
        let user = self.lookup(&email).await?;
        Self::ensure_may_sign_in(&user)?;
        Ok(user.identity())
    }
}
