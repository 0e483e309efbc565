//! Lockout after repeated failed logins
//!
//! - 1 to 3 failures: no lockout, an "attempt N/4" notice
//! - 4 failures: input disabled for 60 seconds with a per-second countdown
//!
//! The counter resets when the countdown ends. Nothing here is persisted.

use std::time::Duration;

use paytrack_core::AppConfig;

/// Attempts allowed before lockout
pub const DEFAULT_MAX_ATTEMPTS: u32 = 4;

/// Lockout length
pub const DEFAULT_LOCKOUT: Duration = Duration::from_secs(60);

/// Lockout policy
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LockoutPolicy {
    /// Failed attempts that trigger a lockout
    pub max_attempts: u32,
    /// How long input stays disabled
    pub duration: Duration,
}

impl Default for LockoutPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            duration: DEFAULT_LOCKOUT,
        }
    }
}

impl LockoutPolicy {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            max_attempts: config.attempts(),
            duration: config.lockout_duration(),
        }
    }

    /// Whether `failed_attempts` should lock the gate
    pub fn is_locked(&self, failed_attempts: u32) -> bool {
        failed_attempts >= self.max_attempts
    }

    /// Attempts left before lockout
    pub fn remaining_attempts(&self, failed_attempts: u32) -> u32 {
        self.max_attempts.saturating_sub(failed_attempts)
    }

    /// Countdown length in whole seconds, at least one
    pub fn countdown_secs(&self) -> u64 {
        self.duration.as_secs().max(1)
    }

    /// Human-readable description of the current state
    pub fn describe(&self, failed_attempts: u32) -> String {
        if self.is_locked(failed_attempts) {
            format!("Locked for {} seconds", self.countdown_secs())
        } else {
            format!("{} attempts remaining", self.remaining_attempts(failed_attempts))
        }
    }
}

/// Lockout countdown
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LockoutState {
    #[default]
    Inactive,
    Active {
        remaining_secs: u64,
    },
}

impl LockoutState {
    /// Start a countdown for `policy`
    pub fn engage(policy: &LockoutPolicy) -> Self {
        LockoutState::Active {
            remaining_secs: policy.countdown_secs(),
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, LockoutState::Active { .. })
    }

    /// Seconds left, `None` when inactive
    pub fn remaining(&self) -> Option<u64> {
        match self {
            LockoutState::Active { remaining_secs } => Some(*remaining_secs),
            LockoutState::Inactive => None,
        }
    }

    /// Count down one second; deactivates at zero
    ///
    /// Returns the seconds left, or `None` if the lockout was not active.
    pub fn tick(&mut self) -> Option<u64> {
        let remaining = self.remaining()?.saturating_sub(1);
        *self = if remaining == 0 {
            LockoutState::Inactive
        } else {
            LockoutState::Active {
                remaining_secs: remaining,
            }
        };
        Some(remaining)
    }
}
