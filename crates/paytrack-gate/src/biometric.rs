//! Platform biometric assertion
//!
//! The gate asks the platform for a user-presence assertion bound to a fresh
//! random challenge. It only sees success, cancellation or failure.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use rand::rngs::OsRng;
use rand::RngCore;

/// Challenge length in bytes
pub const CHALLENGE_LEN: usize = 32;

/// Platform prompt timeout
pub const DEFAULT_ASSERTION_TIMEOUT: Duration = Duration::from_secs(60);

/// Random challenge for one assertion
#[derive(Clone, PartialEq, Eq)]
pub struct Challenge([u8; CHALLENGE_LEN]);

impl Challenge {
    /// Fresh challenge from the OS RNG
    pub fn generate() -> Self {
        let mut bytes = [0u8; CHALLENGE_LEN];
        OsRng.fill_bytes(&mut bytes);
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; CHALLENGE_LEN] {
        &self.0
    }

    /// Short hex prefix for logs
    pub fn fingerprint(&self) -> String {
        hex::encode(&self.0[..4])
    }
}

impl fmt::Debug for Challenge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Challenge({}..)", self.fingerprint())
    }
}

/// Whether the platform must verify the user (PIN, fingerprint) or only presence
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum UserVerification {
    #[default]
    Required,
    Preferred,
    Discouraged,
}

/// Options sent with an assertion request
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AssertionPolicy {
    pub user_verification: UserVerification,
    pub timeout: Duration,
}

impl Default for AssertionPolicy {
    fn default() -> Self {
        Self::with_timeout(DEFAULT_ASSERTION_TIMEOUT)
    }
}

impl AssertionPolicy {
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            user_verification: UserVerification::Required,
            timeout,
        }
    }
}

/// Why an assertion did not succeed
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BiometricError {
    /// The user dismissed the prompt
    #[error("Canceled by user")]
    Canceled,

    #[error("{0}")]
    Failed(String),
}

/// An assertion the host should run
#[derive(Clone, Debug)]
pub struct BiometricRequest {
    pub challenge: Challenge,
    pub policy: AssertionPolicy,
}

/// Platform biometric capability
#[async_trait]
pub trait BiometricAuthenticator: Send + Sync {
    /// Ask the platform to assert user presence for `challenge`
    async fn request_assertion(
        &self,
        challenge: &Challenge,
        policy: &AssertionPolicy,
    ) -> Result<(), BiometricError>;
}

/// Authenticator for platforms without biometric support
#[derive(Debug, Default, Clone, Copy)]
pub struct UnsupportedAuthenticator;

#[async_trait]
impl BiometricAuthenticator for UnsupportedAuthenticator {
    async fn request_assertion(
        &self,
        _challenge: &Challenge,
        _policy: &AssertionPolicy,
    ) -> Result<(), BiometricError> {
        Err(BiometricError::Failed(
            "biometric authentication is not available on this platform".to_string(),
        ))
    }
}
