//! Tracing subscriber setup

use crate::config::LoggingConfig;
use crate::error::{AuthzError, Result};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install a global fmt subscriber
///
/// `RUST_LOG` wins over `config.level`. If a global subscriber is already
/// installed (another component, or a second call) this is a no-op.
pub fn init_tracing(config: &LoggingConfig) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.level).map_err(|e| {
            AuthzError::Config(format!("invalid log level '{}': {}", config.level, e))
        })?,
    };

    let installed = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true).with_ansi(config.ansi))
        .try_init()
        .is_ok();

    if installed {
        tracing::debug!(level = %config.level, "Tracing initialized");
    }
    Ok(())
}
