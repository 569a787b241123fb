//! Signed bearer tokens
//!
//! Compact form: `base64url(header) . base64url(claims) . base64url(mac)`,
//! where `mac` is a BLAKE3 keyed hash of the first two segments. The key is
//! derived from the configured secret, never the secret itself.

use crate::config::AuthSection;
use crate::error::{AuthzError, Result};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fmt;

const KEY_CONTEXT: &str = "pixntalk-authz 2024-10-01 bearer token signing key";
const ALGORITHM: &str = "BLAKE3-KEYED";
const TOKEN_TYPE: &str = "PXT";

pub const DEFAULT_ACCESS_TTL_SECS: i64 = 15 * 60;
pub const DEFAULT_REFRESH_TTL_SECS: i64 = 7 * 24 * 60 * 60;
pub const DEFAULT_EMAIL_TTL_SECS: i64 = 3 * 24 * 60 * 60;

/// What a token may be used for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenScope {
    AccessToken,
    RefreshToken,
    EmailToken,
}

/// Token payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (account email)
    pub sub: String,

    /// Issued at (unix seconds)
    pub iat: i64,

    /// Expires at (unix seconds)
    pub exp: i64,

    pub scope: TokenScope,

    /// Random token id; tokens issued within the same second still differ
    pub jti: String,
}

/// Access and refresh token issued at login
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct TokenHeader {
    alg: String,
    typ: String,
}

/// Issues and verifies bearer tokens
#[derive(Clone)]
pub struct TokenService {
    key: [u8; 32],
    access_ttl_secs: i64,
    refresh_ttl_secs: i64,
    email_ttl_secs: i64,
}

impl fmt::Debug for TokenService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenService")
            .field("access_ttl_secs", &self.access_ttl_secs)
            .field("refresh_ttl_secs", &self.refresh_ttl_secs)
            .field("email_ttl_secs", &self.email_ttl_secs)
            .finish_non_exhaustive()
    }
}

impl TokenService {
    /// Token service with default lifetimes (15 min / 7 days / 3 days)
    pub fn new(secret: &str) -> Self {
        Self {
            key: blake3::derive_key(KEY_CONTEXT, secret.as_bytes()),
            access_ttl_secs: DEFAULT_ACCESS_TTL_SECS,
            refresh_ttl_secs: DEFAULT_REFRESH_TTL_SECS,
            email_ttl_secs: DEFAULT_EMAIL_TTL_SECS,
        }
    }

    pub fn from_config(config: &AuthSection) -> Self {
        Self::new(&config.secret_key).with_ttls(
            clamp_secs(config.access_token_ttl_secs),
            clamp_secs(config.refresh_token_ttl_secs),
            clamp_secs(config.email_token_ttl_secs),
        )
    }

    /// Override token lifetimes, in seconds
    pub fn with_ttls(mut self, access: i64, refresh: i64, email: i64) -> Self {
        self.access_ttl_secs = access;
        self.refresh_ttl_secs = refresh;
        self.email_ttl_secs = email;
        self
    }

    pub fn create_access_token(&self, subject: &str) -> Result<String> {
        self.issue(subject, TokenScope::AccessToken, self.access_ttl_secs)
    }

    pub fn create_refresh_token(&self, subject: &str) -> Result<String> {
        self.issue(subject, TokenScope::RefreshToken, self.refresh_ttl_secs)
    }

    pub fn create_email_token(&self, subject: &str) -> Result<String> {
        self.issue(subject, TokenScope::EmailToken, self.email_ttl_secs)
    }

    /// Fresh access + refresh token for `subject`
    pub fn issue_pair(&self, subject: &str) -> Result<TokenPair> {
        Ok(TokenPair {
            access_token: self.create_access_token(subject)?,
            refresh_token: self.create_refresh_token(subject)?,
            token_type: "bearer".to_string(),
        })
    }

    /// Issue a token with an explicit lifetime. A non-positive `ttl_secs`
    /// yields a token that is already expired.
    pub fn issue(&self, subject: &str, scope: TokenScope, ttl_secs: i64) -> Result<String> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: subject.to_string(),
            iat: now,
            exp: now.saturating_add(ttl_secs),
            scope,
            jti: token_id()?,
        };
        let header = TokenHeader {
            alg: ALGORITHM.to_string(),
            typ: TOKEN_TYPE.to_string(),
        };

        let signing_input = format!(
            "{}.{}",
            URL_SAFE_NO_PAD.encode(serde_json::to_vec(&header)?),
            URL_SAFE_NO_PAD.encode(serde_json::to_vec(&claims)?)
        );
        let signature = URL_SAFE_NO_PAD.encode(self.mac(&signing_input).as_bytes());

        Ok(format!("{}.{}", signing_input, signature))
    }

    /// Verify signature and expiry; scope is not checked
    pub fn decode(&self, token: &str) -> Result<Claims> {
        let mut parts = token.split('.');
        let (Some(header), Some(claims), Some(signature), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(AuthzError::InvalidToken("malformed token".to_string()));
        };

        let provided: [u8; 32] = decode_segment(signature)?
            .try_into()
            .map_err(|_| AuthzError::InvalidToken("bad signature length".to_string()))?;
        let signing_input = &token[..header.len() + 1 + claims.len()];

        // blake3::Hash equality is constant-time.
        if self.mac(signing_input) != blake3::Hash::from(provided) {
            return Err(AuthzError::InvalidToken("signature mismatch".to_string()));
        }

        let header: TokenHeader = serde_json::from_slice(&decode_segment(header)?)
            .map_err(|e| AuthzError::InvalidToken(format!("bad header: {}", e)))?;
        if header.alg != ALGORITHM {
            return Err(AuthzError::InvalidToken(format!(
                "unsupported algorithm {}",
                header.alg
            )));
        }

        let claims: Claims = serde_json::from_slice(&decode_segment(claims)?)
            .map_err(|e| AuthzError::InvalidToken(format!("bad claims: {}", e)))?;

        if claims.exp <= Utc::now().timestamp() {
            return Err(AuthzError::TokenExpired);
        }

        Ok(claims)
    }

    /// Subject of a valid access token
    pub fn decode_access(&self, token: &str) -> Result<String> {
        self.decode_scoped(token, TokenScope::AccessToken)
    }

    /// Subject of a valid refresh token
    pub fn decode_refresh(&self, token: &str) -> Result<String> {
        self.decode_scoped(token, TokenScope::RefreshToken)
    }

    /// Subject of a valid email confirmation token
    ///
    /// Any failure is reported as [`AuthzError::InvalidInput`]: the token
    /// arrives as request data, not as a bearer credential.
    pub fn decode_email(&self, token: &str) -> Result<String> {
        self.decode_scoped(token, TokenScope::EmailToken).map_err(|_| {
            AuthzError::InvalidInput("invalid token for email verification".to_string())
        })
    }

    fn decode_scoped(&self, token: &str, expected: TokenScope) -> Result<String> {
        let claims = self.decode(token)?;
        if claims.scope != expected {
            return Err(AuthzError::Unauthenticated("invalid scope for token".to_string()));
        }
        if claims.sub.is_empty() {
            return Err(AuthzError::Unauthenticated("token has no subject".to_string()));
        }
        Ok(claims.sub)
    }

    fn mac(&self, signing_input: &str) -> blake3::Hash {
        blake3::keyed_hash(&self.key, signing_input.as_bytes())
    }
}

fn decode_segment(segment: &str) -> Result<Vec<u8>> {
    URL_SAFE_NO_PAD
        .decode(segment)
        .map_err(|e| AuthzError::InvalidToken(format!("bad encoding: {}", e)))
}

fn token_id() -> Result<String> {
    let mut bytes = [0u8; 16];
    getrandom::getrandom(&mut bytes)
        .map_err(|e| AuthzError::Internal(format!("token id generation failed: {}", e)))?;
    Ok(URL_SAFE_NO_PAD.encode(bytes))
}

fn clamp_secs(secs: u64) -> i64 {
    i64::try_from(secs).unwrap_or(i64::MAX)
}
