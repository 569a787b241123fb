//! Guard adapter between resource handlers and the access engine
//!
//! A handler resolves its caller, loads the ownership metadata of the
//! resource it is about to touch, and asks the guard. The guard marshals the
//! inputs into [`AccessEngine`] and turns a denial into
//! [`AuthzError::AccessDenied`] for the handler to propagate with `?`.
//! Allow/deny rules live in the engine only; the guard adds logging and
//! counters around them.

pub mod metrics;

pub use metrics::{GuardMetrics, GuardMetricsSnapshot};

use crate::engine::{AccessEngine, AccessRule};
use crate::error::{AuthzError, Result};
use crate::identity::IdentityResolver;
use crate::types::{CallerIdentity, Owned, UserId};

use prometheus::Registry;
use std::sync::Arc;
use tracing::{debug, warn};

/// Request guard
///
/// Cheap to clone; clones share one set of counters. [`Guard::new`] keeps
/// its counters on a private registry; use [`Guard::with_registry`] to
/// export them.
#[derive(Debug, Clone, Default)]
pub struct Guard {
    engine: AccessEngine,
    metrics: Arc<GuardMetrics>,
}

impl Guard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Guard whose counters are registered with `registry`
    pub fn with_registry(registry: &Registry) -> Result<Self> {
        Ok(Self {
            engine: AccessEngine::new(),
            metrics: Arc::new(GuardMetrics::new(registry)?),
        })
    }

    /// Underlying engine, for call sites that branch on the boolean form
    pub fn engine(&self) -> &AccessEngine {
        &self.engine
    }

    /// Current counter values
    pub fn metrics(&self) -> GuardMetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Resolve a bearer credential into the caller identity
    pub async fn authenticate<R>(&self, resolver: &R, bearer_token: &str) -> Result<CallerIdentity>
    where
        R: IdentityResolver + ?Sized,
    {
        match resolver.resolve(bearer_token).await {
            Ok(caller) => {
                debug!(caller = %caller.id(), role = %caller.role(), "Caller authenticated");
                Ok(caller)
            }
            Err(e) => {
                if e.is_authentication_failure() {
                    self.metrics.record_authentication_failure();
                }
                warn!("Authentication failed: {}", e);
                Err(e)
            }
        }
    }

    /// Proceed only if the caller owns `owner_id`'s content or is privileged
    pub fn authorize_owner(&self, caller: &CallerIdentity, owner_id: &UserId) -> Result<()> {
        self.enforce(caller, AccessRule::OwnerOrPrivileged(Some(owner_id)))
    }

    /// Proceed only if the caller owns `resource` or is privileged
    pub fn authorize_resource<R>(&self, caller: &CallerIdentity, resource: &R) -> Result<()>
    where
        R: Owned + ?Sized,
    {
        self.enforce(caller, AccessRule::OwnerOrPrivileged(resource.owner_id()))
    }

    /// Proceed only if the caller is a moderator or admin
    pub fn authorize_privileged(&self, caller: &CallerIdentity) -> Result<()> {
        self.enforce(caller, AccessRule::PrivilegedOnly)
    }

    fn enforce(&self, caller: &CallerIdentity, rule: AccessRule<'_>) -> Result<()> {
        let decision = self.engine.evaluate(caller, rule);
        self.metrics.record_decision(decision.is_allowed());

        if decision.is_denied() {
            // No resource detail in the log line either.
            warn!(
                caller = %caller.id(),
                role = %caller.role(),
                rule = rule.name(),
                "Access denied"
            );
            return Err(AuthzError::AccessDenied);
        }

        debug!(caller = %caller.id(), rule = rule.name(), "Access allowed");
        Ok(())
    }
}
