//! Prometheus counters for guard decisions
//!
//! - `pixntalk_authz_decisions_total{outcome="allowed"|"denied"}`
//! - `pixntalk_authz_authentication_failures_total`

use prometheus::{
    register_int_counter_vec_with_registry, register_int_counter_with_registry, IntCounter,
    IntCounterVec, Opts, Registry,
};
use serde::Serialize;
use std::fmt;

const NAMESPACE: &str = "pixntalk";

/// Point-in-time copy of the guard counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct GuardMetricsSnapshot {
    /// Number of allowed decisions
    pub allowed_decisions: u64,

    /// Number of denied decisions
    pub denied_decisions: u64,

    /// Bearer credentials that failed to resolve to an identity
    pub authentication_failures: u64,
}

impl GuardMetricsSnapshot {
    /// Total authorization decisions
    pub fn total_decisions(&self) -> u64 {
        self.allowed_decisions + self.denied_decisions
    }

    /// Calculate deny rate
    pub fn deny_rate(&self) -> f64 {
        let total = self.total_decisions();
        if total == 0 {
            0.0
        } else {
            self.denied_decisions as f64 / total as f64
        }
    }
}

/// Guard counters
pub struct GuardMetrics {
    /// Authorization decisions, labelled by `outcome`
    pub decisions_total: IntCounterVec,

    /// Failed identity resolutions
    pub authentication_failures_total: IntCounter,

    allowed: IntCounter,
    denied: IntCounter,
}

impl GuardMetrics {
    /// Create the guard counters and register them with `registry`
    pub fn new(registry: &Registry) -> Result<Self, prometheus::Error> {
        let decisions_total = register_int_counter_vec_with_registry!(
            Opts::new("authz_decisions_total", "Authorization decisions by outcome")
                .namespace(NAMESPACE),
            &["outcome"],
            registry
        )?;

        let authentication_failures_total = register_int_counter_with_registry!(
            Opts::new(
                "authz_authentication_failures_total",
                "Bearer credentials that failed to resolve to a caller"
            )
            .namespace(NAMESPACE),
            registry
        )?;

        let allowed = decisions_total.with_label_values(&["allowed"]);
        let denied = decisions_total.with_label_values(&["denied"]);

        Ok(Self {
            decisions_total,
            authentication_failures_total,
            allowed,
            denied,
        })
    }

    /// Record an authorization decision
    pub fn record_decision(&self, allowed: bool) {
        if allowed {
            self.allowed.inc();
        } else {
            self.denied.inc();
        }
    }

    /// Record a failed identity resolution
    pub fn record_authentication_failure(&self) {
        self.authentication_failures_total.inc();
    }

    pub fn snapshot(&self) -> GuardMetricsSnapshot {
        GuardMetricsSnapshot {
            allowed_decisions: self.allowed.get(),
            denied_decisions: self.denied.get(),
            authentication_failures: self.authentication_failures_total.get(),
        }
    }
}

impl Default for GuardMetrics {
    /// Counters on a private registry, for guards nobody scrapes
    fn default() -> Self {
        Self::new(&Registry::new()).expect("guard metric definitions are valid")
    }
}

impl fmt::Debug for GuardMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("GuardMetrics").field(&self.snapshot()).finish()
    }
}
