//! Session flag handling
//!
//! A successful unlock writes the flag into the session store. Protected
//! surfaces (dashboard, settings) call [`SessionFlag::require`] first and send
//! the user back to the lock view when it fails.

use crate::error::StoreError;
use crate::keys;
use crate::storage::SharedStore;

/// Value written for an active session
const GRANTED: &str = "true";

/// Session errors
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Session locked - unlock with your PIN first")]
    Locked,

    #[error("Session storage error: {0}")]
    Store(#[from] StoreError),
}

/// Reader and writer of the session grant
#[derive(Clone)]
pub struct SessionFlag {
    store: SharedStore,
}

impl SessionFlag {
    /// Wrap the session store
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    /// Mark the session as unlocked
    pub fn grant(&self) -> Result<(), StoreError> {
        self.store.set(keys::SESSION, GRANTED)?;
        tracing::debug!("Session granted");
        Ok(())
    }

    /// Drop the grant (explicit lock, PIN change)
    pub fn revoke(&self) -> Result<(), StoreError> {
        self.store.remove(keys::SESSION)?;
        tracing::debug!("Session revoked");
        Ok(())
    }

    /// Whether the session is unlocked; any value but `"true"` is locked
    pub fn is_active(&self) -> Result<bool, StoreError> {
        Ok(self.store.get(keys::SESSION)?.as_deref() == Some(GRANTED))
    }

    /// Fail with [`SessionError::Locked`] unless the session is unlocked
    pub fn require(&self) -> Result<(), SessionError> {
        if self.is_active()? {
            Ok(())
        } else {
            Err(SessionError::Locked)
        }
    }
}
