//! The stored unlock PIN
//!
//! The PIN is kept as a plain 4-digit string because the tracker pages read
//! the same key. Comparisons go through [`pins_match`] so that the time taken
//! does not depend on where the first differing digit is.

use zeroize::Zeroizing;

use crate::error::Result;
use crate::keys;
use crate::storage::KeyValueStore;
use crate::PIN_LENGTH;

/// PIN compared against when none has been stored yet
pub const DEFAULT_FALLBACK_SECRET: &str = "0000";

/// PIN the dashboard accepts for project deletion when none is stored
pub const DEFAULT_DELETE_FALLBACK_SECRET: &str = "7739";

/// Check a PIN is exactly [`PIN_LENGTH`] ASCII digits
pub fn is_valid_pin(pin: &str) -> bool {
    pin.len() == PIN_LENGTH && pin.bytes().all(|b| b.is_ascii_digit())
}

/// Load the stored PIN; an empty value counts as unset
pub fn load_secret(store: &dyn KeyValueStore) -> Result<Option<Zeroizing<String>>> {
    Ok(store
        .get(keys::SECRET)?
        .filter(|pin| !pin.is_empty())
        .map(Zeroizing::new))
}

/// Whether a PIN has been stored
pub fn has_secret(store: &dyn KeyValueStore) -> Result<bool> {
    Ok(load_secret(store)?.is_some())
}

/// Persist a new PIN
pub fn store_secret(store: &dyn KeyValueStore, pin: &str) -> Result<()> {
    store.set(keys::SECRET, pin)
}

/// Compare `pin` with the stored PIN, or with `fallback` if none is stored
pub fn verify_or_fallback(store: &dyn KeyValueStore, pin: &str, fallback: &str) -> Result<bool> {
    let stored = load_secret(store)?;
    let expected = stored.as_ref().map(|s| s.as_str()).unwrap_or(fallback);
    Ok(pins_match(pin, expected))
}

/// Length-checked comparison that inspects every byte
pub fn pins_match(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.bytes()
        .zip(b.bytes())
        .fold(0u8, |acc, (x, y)| acc | (x ^ y))
        == 0
}
