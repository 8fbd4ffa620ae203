//! Degraded-mode health signal for the lifecycle engine.
//!
//! Operations keep succeeding when a semantic status role is unassigned or
//! when an invariant violation is detected and repaired, but each such event
//! is counted here so operators can see it instead of relying on logs alone.

use crate::status::domain::StatusRole;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Roles whose absence turns engine side effects into no-ops.
pub const REQUIRED_ROLES: [StatusRole; 3] =
    [StatusRole::Pending, StatusRole::Executing, StatusRole::Final];

/// Shared event counters, updated by the registry and lifecycle services.
#[derive(Debug, Default)]
pub struct EngineHealth {
    invariant_violations: AtomicU64,
    skipped_pendency_effects: AtomicU64,
    halted_cascades: AtomicU64,
}

impl EngineHealth {
    /// Creates a counter set with every count at zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a detected invariant violation.
    pub fn record_invariant_violation(&self) {
        self.invariant_violations.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a pendency transition whose task side effect was skipped
    /// because the target role is unassigned.
    pub fn record_skipped_pendency_effect(&self) {
        self.skipped_pendency_effects.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a cascade walk stopped by the depth bound.
    pub fn record_halted_cascade(&self) {
        self.halted_cascades.fetch_add(1, Ordering::Relaxed);
    }

    /// Returns the number of invariant violations detected so far.
    #[must_use]
    pub fn invariant_violations(&self) -> u64 {
        self.invariant_violations.load(Ordering::Relaxed)
    }

    /// Returns the number of skipped pendency side effects.
    #[must_use]
    pub fn skipped_pendency_effects(&self) -> u64 {
        self.skipped_pendency_effects.load(Ordering::Relaxed)
    }

    /// Returns the number of cascades halted by the depth bound.
    #[must_use]
    pub fn halted_cascades(&self) -> u64 {
        self.halted_cascades.load(Ordering::Relaxed)
    }

    /// Builds a report from the counters and the roles currently unheld.
    #[must_use]
    pub fn report(&self, unheld_roles: impl IntoIterator<Item = StatusRole>) -> HealthReport {
        let missing_roles: Vec<StatusRole> = unheld_roles
            .into_iter()
            .filter(|role| REQUIRED_ROLES.contains(role))
            .collect();
        let invariant_violations = self.invariant_violations();
        let halted_cascades = self.halted_cascades();
        let status = if missing_roles.is_empty() && invariant_violations == 0 && halted_cascades == 0
        {
            HealthStatus::Healthy
        } else {
            HealthStatus::Degraded
        };

        HealthReport {
            status,
            missing_roles,
            invariant_violations,
            skipped_pendency_effects: self.skipped_pendency_effects(),
            halted_cascades,
        }
    }
}

/// Overall engine health.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    /// Every required role is assigned, no violation was seen, and no
    /// cascade hit the depth bound.
    Healthy,
    /// Side effects are being skipped, an invariant was broken, or a cascade
    /// was cut short.
    Degraded,
}

impl HealthStatus {
    /// Returns the canonical representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Healthy => "healthy",
            Self::Degraded => "degraded",
        }
    }
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Point-in-time health snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthReport {
    /// Overall status.
    pub status: HealthStatus,
    /// Required roles that no status currently holds.
    pub missing_roles: Vec<StatusRole>,
    /// Invariant violations detected since start-up.
    pub invariant_violations: u64,
    /// Pendency side effects skipped since start-up.
    pub skipped_pendency_effects: u64,
    /// Cascade walks halted by the depth bound since start-up.
    pub halted_cascades: u64,
}

impl HealthReport {
    /// Returns whether the engine is running in degraded mode.
    #[must_use]
    pub fn is_degraded(&self) -> bool {
        self.status == HealthStatus::Degraded
    }
}
