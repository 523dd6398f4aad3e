//! Liveness status evaluation for a vault.
//!
//! Pure logic: takes a vault and the current time, returns a
//! recommendation. The caller (daemon, UI) decides what to do with it.
//!
//! ```text
//! |--- Healthy ---|--- CheckinRecommended ---|--- CheckinRequired ---|--- Expired
//! 0%             50%                        90%                    100%
//! ```
//!
//! Fractions are measured against the current period, so an owner who has
//! heartbeat ahead of schedule stays at 0% until the deadline is within
//! one period again.

use crate::timer::{TimerState, Timestamp};
use crate::vault::Vault;
use serde::{Deserialize, Serialize};

/// When to recommend a heartbeat.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeartbeatConfig {
    /// Fraction of the period elapsed before recommending a heartbeat (0.0–1.0).
    /// Default: 0.5.
    #[serde(default = "default_checkin_threshold")]
    pub checkin_threshold: f64,

    /// Fraction of the period elapsed before a heartbeat is critical (0.0–1.0).
    /// Default: 0.9.
    #[serde(default = "default_critical_threshold")]
    pub critical_threshold: f64,
}

fn default_checkin_threshold() -> f64 {
    0.5
}

fn default_critical_threshold() -> f64 {
    0.9
}

impl Default for HeartbeatConfig {
    fn default() -> Self {
        Self {
            checkin_threshold: default_checkin_threshold(),
            critical_threshold: default_critical_threshold(),
        }
    }
}

impl HeartbeatConfig {
    /// Validate that thresholds are sensible.
    pub fn validate(&self) -> Result<(), HeartbeatError> {
        if self.checkin_threshold <= 0.0 || self.checkin_threshold >= 1.0 {
            return Err(HeartbeatError::InvalidThreshold(
                "checkin_threshold must be between 0.0 and 1.0 exclusive".into(),
            ));
        }
        if self.critical_threshold <= self.checkin_threshold || self.critical_threshold >= 1.0 {
            return Err(HeartbeatError::InvalidThreshold(
                "critical_threshold must be between checkin_threshold and 1.0 exclusive".into(),
            ));
        }
        Ok(())
    }
}

/// What the evaluation recommends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HeartbeatAction {
    /// Deadline is far away.
    Healthy,
    /// Past the check-in threshold. Owner should heartbeat soon.
    CheckinRecommended,
    /// Past the critical threshold. Owner must heartbeat now.
    CheckinRequired,
    /// Deadline passed. Beneficiary controls withdrawals.
    Expired,
}

impl HeartbeatAction {
    /// Stable lowercase name, used in logs and the status journal.
    pub fn as_str(self) -> &'static str {
        match self {
            HeartbeatAction::Healthy => "healthy",
            HeartbeatAction::CheckinRecommended => "checkin_recommended",
            HeartbeatAction::CheckinRequired => "checkin_required",
            HeartbeatAction::Expired => "expired",
        }
    }

    /// Inverse of [`HeartbeatAction::as_str`].
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "healthy" => Some(HeartbeatAction::Healthy),
            "checkin_recommended" => Some(HeartbeatAction::CheckinRecommended),
            "checkin_required" => Some(HeartbeatAction::CheckinRequired),
            "expired" => Some(HeartbeatAction::Expired),
            _ => None,
        }
    }
}

/// Full liveness status of a vault at one instant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeartbeatStatus {
    /// `last_heartbeat + heartbeat_period`
    pub deadline: Timestamp,
    /// Seconds until the deadline (zero once expired)
    pub secs_remaining: u64,
    /// Fraction of the current period elapsed (0.0–1.0+)
    pub elapsed_fraction: f64,
    /// ALIVE or EXPIRED
    pub state: TimerState,
    /// Recommended action
    pub action: HeartbeatAction,
}

/// Errors from heartbeat configuration.
#[derive(Debug, thiserror::Error)]
pub enum HeartbeatError {
    #[error("Invalid threshold: {0}")]
    InvalidThreshold(String),
}

/// Evaluate the liveness status of `vault` at `now`.
pub fn evaluate_heartbeat(
    vault: &Vault,
    now: Timestamp,
    config: &HeartbeatConfig,
) -> HeartbeatStatus {
    let timer = vault.timer();
    let period = timer.heartbeat_period();
    let deadline = timer.deadline();
    let state = timer.state(now);
    let secs_remaining = timer.remaining(now);

    let elapsed = if now >= deadline {
        period.saturating_add(now - deadline)
    } else {
        period.saturating_sub(secs_remaining)
    };
    let elapsed_fraction = elapsed as f64 / period as f64;

    let action = if state == TimerState::Expired {
        HeartbeatAction::Expired
    } else if elapsed_fraction >= config.critical_threshold {
        HeartbeatAction::CheckinRequired
    } else if elapsed_fraction >= config.checkin_threshold {
        HeartbeatAction::CheckinRecommended
    } else {
        HeartbeatAction::Healthy
    };

    HeartbeatStatus {
        deadline,
        secs_remaining,
        elapsed_fraction,
        state,
        action,
    }
}
