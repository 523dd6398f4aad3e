//! Liveness timer.
//!
//! The deadline is always `last_heartbeat + heartbeat_period`. A heartbeat
//! moves `last_heartbeat` forward by exactly one period, so deadlines follow
//! the fixed schedule `created_at + k * period` no matter when the owner
//! calls in.
//!
//! ```text
//! created_at        last_heartbeat            deadline
//!     |------ k*period ------|------ period ------|
//!                       ALIVE                     | EXPIRED ...
//! ```

use crate::vault::VaultError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

/// Unix timestamp in seconds.
pub type Timestamp = u64;

/// Source of the current time, supplied by the host for each operation.
pub trait Clock {
    fn now(&self) -> Timestamp;
}

/// Wall clock in unix seconds.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0)
    }
}

/// A clock frozen at a given instant (replays, tests, one-shot checks).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock(pub Timestamp);

impl Clock for FixedClock {
    fn now(&self) -> Timestamp {
        self.0
    }
}

/// Which side of the deadline `now` falls on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimerState {
    /// now < deadline: the owner controls withdrawals
    Alive,
    /// now >= deadline: the beneficiary controls withdrawals
    Expired,
}

impl fmt::Display for TimerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimerState::Alive => f.write_str("ALIVE"),
            TimerState::Expired => f.write_str("EXPIRED"),
        }
    }
}

/// Tracks the last heartbeat and the fixed period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawTimer")]
pub struct LivenessTimer {
    last_heartbeat: Timestamp,
    heartbeat_period: u64,
}

#[derive(Deserialize)]
struct RawTimer {
    last_heartbeat: Timestamp,
    heartbeat_period: u64,
}

impl TryFrom<RawTimer> for LivenessTimer {
    type Error = VaultError;

    fn try_from(raw: RawTimer) -> Result<Self, Self::Error> {
        LivenessTimer::new(raw.last_heartbeat, raw.heartbeat_period)
    }
}

impl LivenessTimer {
    /// Start a timer at `created_at` with a positive `heartbeat_period` (seconds).
    pub fn new(created_at: Timestamp, heartbeat_period: u64) -> Result<Self, VaultError> {
        if heartbeat_period == 0 {
            return Err(VaultError::InvalidHeartbeatPeriod);
        }
        created_at
            .checked_add(heartbeat_period)
            .ok_or(VaultError::DeadlineOverflow)?;
        Ok(Self {
            last_heartbeat: created_at,
            heartbeat_period,
        })
    }

    pub fn last_heartbeat(&self) -> Timestamp {
        self.last_heartbeat
    }

    pub fn heartbeat_period(&self) -> u64 {
        self.heartbeat_period
    }

    /// `last_heartbeat + heartbeat_period`.
    pub fn deadline(&self) -> Timestamp {
        // `new` and `extend` keep this sum in range
        self.last_heartbeat.saturating_add(self.heartbeat_period)
    }

    pub fn is_expired(&self, now: Timestamp) -> bool {
        now >= self.deadline()
    }

    pub fn state(&self, now: Timestamp) -> TimerState {
        if self.is_expired(now) {
            TimerState::Expired
        } else {
            TimerState::Alive
        }
    }

    /// Seconds left before the deadline (zero once expired).
    pub fn remaining(&self, now: Timestamp) -> u64 {
        self.deadline().saturating_sub(now)
    }

    /// Advance `last_heartbeat` by one period. Authorization is the caller's job.
    pub(crate) fn extend(&mut self) -> Result<Timestamp, VaultError> {
        let next = self
            .last_heartbeat
            .checked_add(self.heartbeat_period)
            .ok_or(VaultError::DeadlineOverflow)?;
        next.checked_add(self.heartbeat_period)
            .ok_or(VaultError::DeadlineOverflow)?;
        self.last_heartbeat = next;
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_period_rejected() {
        assert_eq!(
            LivenessTimer::new(0, 0),
            Err(VaultError::InvalidHeartbeatPeriod)
        );
    }

    #[test]
    fn test_creation_overflow_rejected() {
        assert_eq!(
            LivenessTimer::new(u64::MAX - 10, 11),
            Err(VaultError::DeadlineOverflow)
        );
    }

    #[test]
    fn test_expiry_boundary() {
        let timer = LivenessTimer::new(100, 1000).unwrap();
        assert_eq!(timer.deadline(), 1100);

        assert_eq!(timer.state(100), TimerState::Alive);
        assert_eq!(timer.state(1099), TimerState::Alive);
        // Exactly at the deadline counts as expired
        assert_eq!(timer.state(1100), TimerState::Expired);
        assert!(timer.is_expired(5000));
    }

    #[test]
    fn test_extend_moves_by_one_period() {
        let mut timer = LivenessTimer::new(0, 1000).unwrap();
        assert_eq!(timer.extend().unwrap(), 1000);
        assert_eq!(timer.extend().unwrap(), 2000);
        assert_eq!(timer.deadline(), 3000);
    }

    #[test]
    fn test_extend_overflow_leaves_timer_unchanged() {
        let mut timer = LivenessTimer::new(u64::MAX - 25, 10).unwrap();
        timer.extend().unwrap();
        assert_eq!(timer.extend(), Err(VaultError::DeadlineOverflow));
        assert_eq!(timer.last_heartbeat(), u64::MAX - 15);
    }

    #[test]
    fn test_remaining() {
        let timer = LivenessTimer::new(0, 1000).unwrap();
        assert_eq!(timer.remaining(400), 600);
        assert_eq!(timer.remaining(1000), 0);
        assert_eq!(timer.remaining(2000), 0);
    }

    #[test]
    fn test_fixed_clock() {
        assert_eq!(FixedClock(42).now(), 42);
        assert!(SystemClock.now() > 1_600_000_000);
    }
}
