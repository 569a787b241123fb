//! Configuration loading and validation
//!
//! ```toml
//! [auth]
//! secret_key = "change-me-to-a-long-random-string"
//! access_token_ttl_secs = 900
//! refresh_token_ttl_secs = 604800
//! email_token_ttl_secs = 259200
//!
//! [logging]
//! level = "info"
//! ansi = true
//! ```
//!
//! `PIXNTALK_SECRET_KEY` and `PIXNTALK_LOG_LEVEL` override the file.

use crate::error::{AuthzError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use tracing::info;

pub const ENV_SECRET_KEY: &str = "PIXNTALK_SECRET_KEY";
pub const ENV_LOG_LEVEL: &str = "PIXNTALK_LOG_LEVEL";

/// Minimum accepted secret length, in bytes
pub const MIN_SECRET_LEN: usize = 16;

/// Complete configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuthConfig {
    pub auth: AuthSection,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Token settings
#[derive(Clone, Deserialize, Serialize)]
pub struct AuthSection {
    /// Token signing secret
    pub secret_key: String,
    #[serde(default = "default_access_ttl")]
    pub access_token_ttl_secs: u64,
    #[serde(default = "default_refresh_ttl")]
    pub refresh_token_ttl_secs: u64,
    #[serde(default = "default_email_ttl")]
    pub email_token_ttl_secs: u64,
}

impl fmt::Debug for AuthSection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthSection")
            .field("secret_key", &"<redacted>")
            .field("access_token_ttl_secs", &self.access_token_ttl_secs)
            .field("refresh_token_ttl_secs", &self.refresh_token_ttl_secs)
            .field("email_token_ttl_secs", &self.email_token_ttl_secs)
            .finish()
    }
}

/// Log output settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Filter directive used when `RUST_LOG` is unset (e.g. "info", "pixntalk_authz=debug")
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_true")]
    pub ansi: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            ansi: true,
        }
    }
}

fn default_true() -> bool { true }
fn default_access_ttl() -> u64 { 15 * 60 }
fn default_refresh_ttl() -> u64 { 7 * 24 * 60 * 60 }
fn default_email_ttl() -> u64 { 3 * 24 * 60 * 60 }
fn default_log_level() -> String { "info".to_string() }

impl AuthConfig {
    /// Configuration with default lifetimes and logging
    pub fn new(secret_key: impl Into<String>) -> Self {
        Self {
            auth: AuthSection {
                secret_key: secret_key.into(),
                access_token_ttl_secs: default_access_ttl(),
                refresh_token_ttl_secs: default_refresh_ttl(),
                email_token_ttl_secs: default_email_ttl(),
            },
            logging: LoggingConfig::default(),
        }
    }

    /// Load from a TOML file, apply environment overrides, and validate
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AuthzError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;

        let mut config = Self::from_toml_str(&contents)?;
        config.apply_env_overrides();
        config.validate()?;

        info!(path = %path.display(), "Configuration loaded");
        Ok(config)
    }

    /// Parse without overrides or validation
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        toml::from_str(contents)
            .map_err(|e| AuthzError::Config(format!("failed to parse config: {}", e)))
    }

    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply overrides from any key lookup; empty values are ignored
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(secret) = lookup(ENV_SECRET_KEY).filter(|v| !v.is_empty()) {
            self.auth.secret_key = secret;
        }
        if let Some(level) = lookup(ENV_LOG_LEVEL).filter(|v| !v.is_empty()) {
            self.logging.level = level;
        }
    }

    pub fn validate(&self) -> Result<()> {
        let auth = &self.auth;

        if auth.secret_key.len() < MIN_SECRET_LEN {
            return Err(AuthzError::Config(format!(
                "secret_key must be at least {} bytes",
                MIN_SECRET_LEN
            )));
        }

        if auth.access_token_ttl_secs == 0
            || auth.refresh_token_ttl_secs == 0
            || auth.email_token_ttl_secs == 0
        {
            return Err(AuthzError::Config("token lifetimes must be non-zero".to_string()));
        }

        if auth.access_token_ttl_secs >= auth.refresh_token_ttl_secs {
            return Err(AuthzError::Config(
                "access_token_ttl_secs must be shorter than refresh_token_ttl_secs".to_string(),
            ));
        }

        Ok(())
    }
}
