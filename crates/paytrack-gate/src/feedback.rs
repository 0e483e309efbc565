//! User-facing notices raised by the gate

use std::fmt;

/// How a notice should be presented
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Severity {
    Success,
    Error,
    Info,
}

/// Something the lock screen should tell the user
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Notice {
    /// First run: choose a PIN
    CreatePrompt,
    /// First run: re-enter the PIN
    ConfirmPrompt,
    Unlocked,
    PinCreated,
    IncorrectPin { attempt: u32, max: u32 },
    PinMismatch,
    LockoutStarted { seconds: u64 },
    LockoutTick { remaining: u64 },
    LockoutEnded,
    BiometricAvailable,
    BiometricFailed { reason: String },
    /// A storage write failed; the user can retry
    SaveFailed,
}

impl Notice {
    pub fn severity(&self) -> Severity {
        match self {
            Notice::Unlocked | Notice::PinCreated => Severity::Success,
            Notice::IncorrectPin { .. }
            | Notice::PinMismatch
            | Notice::LockoutStarted { .. }
            | Notice::BiometricFailed { .. }
            | Notice::SaveFailed => Severity::Error,
            Notice::CreatePrompt
            | Notice::ConfirmPrompt
            | Notice::LockoutTick { .. }
            | Notice::LockoutEnded
            | Notice::BiometricAvailable => Severity::Info,
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::CreatePrompt => write!(f, "Create a 4-digit PIN"),
            Notice::ConfirmPrompt => write!(f, "Confirm your PIN"),
            Notice::Unlocked => write!(f, "Unlocked"),
            Notice::PinCreated => write!(f, "PIN created"),
            Notice::IncorrectPin { attempt, max } => {
                write!(f, "Incorrect PIN (attempt {}/{})", attempt, max)
            }
            Notice::PinMismatch => write!(f, "PINs do not match, start again"),
            Notice::LockoutStarted { seconds } => {
                write!(f, "Too many failed attempts. Try again in {}s", seconds)
            }
            Notice::LockoutTick { remaining } => write!(f, "Try again in {}s", remaining),
            Notice::LockoutEnded => write!(f, "You can try again"),
            Notice::BiometricAvailable => write!(f, "Biometric unlock available"),
            Notice::BiometricFailed { reason } => write!(f, "Biometric unlock failed: {}", reason),
            Notice::SaveFailed => write!(f, "Could not save, please try again"),
        }
    }
}

/// Presents notices to the user
pub trait Feedback: Send + Sync {
    fn notify(&self, notice: &Notice);

    /// Hide any failure message currently shown
    fn clear(&self) {}
}
