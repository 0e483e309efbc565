//! PayTrack Gate - PIN lock screen
//!
//! The lock screen in front of the PayTrack dashboard:
//! - First run: choose a 4-digit PIN and confirm it
//! - Later visits: enter the PIN, or unlock with a platform biometric
//! - Four wrong PINs in a row lock input for a minute
//!
//! [`PinGate`] is a synchronous state machine. Timers go through the
//! [`Scheduler`] trait; [`runtime::GateDriver`] runs a gate on tokio, and
//! [`ManualScheduler`] lets a host (or a test) step time by hand.

pub mod biometric;
pub mod buffer;
pub mod feedback;
pub mod gate;
pub mod lockout;
pub mod runtime;
pub mod scheduler;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use biometric::{
    AssertionPolicy, BiometricAuthenticator, BiometricError, BiometricRequest, Challenge,
    UnsupportedAuthenticator, UserVerification,
};
pub use buffer::{Digit, EntryBuffer};
pub use feedback::{Feedback, Notice, Severity};
pub use gate::{
    GateConfig, GateError, GateMode, GateServices, GateSnapshot, Key, PinGate,
    DEFAULT_VERIFY_DELAY,
};
pub use lockout::{LockoutPolicy, LockoutState};
pub use runtime::{GateDriver, GateHandle, GateInput, GateOutcome, TokioScheduler};
pub use scheduler::{ManualScheduler, Scheduler, TimerEvent, TimerId, TimerKind};
