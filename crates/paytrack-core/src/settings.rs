//! Global settings
//!
//! Theme, currency, language and reminder preferences live in one JSON
//! record. The PIN and biometric flag have their own keys.

use std::sync::Arc;

use chrono::Utc;

use crate::error::StoreError;
use crate::keys;
use crate::model::{GlobalSettings, ReminderSettings, SavedTheme, ThemeConfig};
use crate::ports::Localizer;
use crate::secret;
use crate::session::SessionFlag;
use crate::storage::{get_json, set_json, KeyValueStore, Stores};
use crate::theme;

/// Currency used when none has been chosen
pub const DEFAULT_CURRENCY: &str = "USD";

/// Symbol of [`DEFAULT_CURRENCY`]
pub const DEFAULT_CURRENCY_SYMBOL: &str = "$";

/// Currencies offered by the settings page
const CURRENCY_SYMBOLS: &[(&str, &str)] = &[
    ("USD", "$"),
    ("EUR", "€"),
    ("GBP", "£"),
    ("JPY", "¥"),
    ("INR", "₹"),
    ("IDR", "Rp"),
    ("MYR", "RM"),
    ("SGD", "S$"),
    ("AUD", "A$"),
    ("CAD", "C$"),
];

/// Allowed reminder days
const REMINDER_DAYS: std::ops::RangeInclusive<u32> = 1..=28;

/// Settings errors
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Color {index} is not a valid HEX code")]
    InvalidColor { index: u8, value: String },

    #[error("Theme name cannot be empty")]
    EmptyThemeName,

    #[error("No custom theme to save")]
    NoCustomTheme,

    #[error("Theme not found: {0}")]
    ThemeNotFound(String),

    #[error("Current PIN is incorrect")]
    IncorrectPin,

    #[error("New PIN must be exactly 4 digits")]
    InvalidPin,

    #[error("New PINs do not match")]
    PinMismatch,

    #[error("Reminder day must be between 1 and 28, got {0}")]
    InvalidReminderDay(u32),

    #[error("Currency code cannot be empty")]
    EmptyCurrency,

    #[error("Storage error: {0}")]
    Store(#[from] StoreError),
}

/// Result type alias for settings operations
pub type Result<T> = std::result::Result<T, SettingsError>;

/// Symbol for a known currency code
pub fn currency_symbol(code: &str) -> Option<&'static str> {
    CURRENCY_SYMBOLS
        .iter()
        .find(|(c, _)| c.eq_ignore_ascii_case(code))
        .map(|(_, s)| *s)
}

/// Whether biometric unlock was enabled on this device
pub fn biometric_enabled(store: &dyn KeyValueStore) -> std::result::Result<bool, StoreError> {
    Ok(store.get(keys::BIOMETRIC_ENABLED)?.as_deref() == Some("true"))
}

/// Prefix `#` unless already present
fn with_hash(color: &str) -> String {
    let color = color.trim();
    if color.starts_with('#') {
        color.to_string()
    } else {
        format!("#{}", color)
    }
}

/// Reads and updates the settings record
pub struct SettingsService {
    stores: Stores,
    fallback_secret: String,
    localizer: Arc<dyn Localizer>,
}

impl SettingsService {
    pub fn new(
        stores: Stores,
        fallback_secret: impl Into<String>,
        localizer: Arc<dyn Localizer>,
    ) -> Self {
        Self {
            stores,
            fallback_secret: fallback_secret.into(),
            localizer,
        }
    }

    /// Current settings; a missing record reads as defaults
    pub fn load(&self) -> Result<GlobalSettings> {
        Ok(get_json(self.stores.local.as_ref(), keys::GLOBAL_SETTINGS)?.unwrap_or_default())
    }

    fn save(&self, settings: &GlobalSettings) -> Result<()> {
        set_json(self.stores.local.as_ref(), keys::GLOBAL_SETTINGS, settings)?;
        Ok(())
    }

    fn update<F>(&self, f: F) -> Result<GlobalSettings>
    where
        F: FnOnce(&mut GlobalSettings) -> Result<()>,
    {
        let mut settings = self.load()?;
        f(&mut settings)?;
        self.save(&settings)?;
        Ok(settings)
    }

    /// Select a preset or saved theme
    pub fn select_theme(&self, name: &str) -> Result<GlobalSettings> {
        self.update(|s| {
            if name.starts_with("custom-") && s.saved_theme(name).is_none() {
                return Err(SettingsError::ThemeNotFound(name.to_string()));
            }
            s.theme = Some(name.to_string());
            Ok(())
        })
    }

    /// Apply a custom color theme
    ///
    /// `gradient` is the second color and the CSS direction. Colors may be
    /// given with or without the leading `#`.
    pub fn apply_custom_theme(
        &self,
        color1: &str,
        gradient: Option<(&str, &str)>,
    ) -> Result<ThemeConfig> {
        let color1 = with_hash(color1);
        if !theme::is_valid_hex(&color1) {
            return Err(SettingsError::InvalidColor {
                index: 1,
                value: color1,
            });
        }

        let config = match gradient {
            Some((color2, direction)) => {
                let color2 = with_hash(color2);
                if !theme::is_valid_hex(&color2) {
                    return Err(SettingsError::InvalidColor {
                        index: 2,
                        value: color2,
                    });
                }
                ThemeConfig::gradient(color1, color2, direction)
            }
            None => ThemeConfig::solid(color1),
        };

        self.update(|s| {
            s.theme = Some("custom".to_string());
            s.custom_theme_config = Some(config.clone());
            Ok(())
        })?;
        Ok(config)
    }

    /// Save the current custom theme under `name` and select it
    pub fn save_custom_theme(&self, name: &str) -> Result<SavedTheme> {
        let name = name.trim();
        if name.is_empty() {
            return Err(SettingsError::EmptyThemeName);
        }

        let mut saved = None;
        self.update(|s| {
            let config = s
                .custom_theme_config
                .clone()
                .ok_or(SettingsError::NoCustomTheme)?;
            let theme = SavedTheme {
                id: format!("custom-{}", Utc::now().timestamp_millis()),
                name: name.to_string(),
                config,
            };
            s.theme = Some(theme.id.clone());
            s.saved_themes.push(theme.clone());
            saved = Some(theme);
            Ok(())
        })?;

        saved.ok_or(SettingsError::NoCustomTheme)
    }

    /// Delete a saved theme, reverting to `default` if it was selected
    pub fn delete_saved_theme(&self, id: &str) -> Result<SavedTheme> {
        let mut removed = None;
        self.update(|s| {
            let index = s
                .saved_themes
                .iter()
                .position(|t| t.id == id)
                .ok_or_else(|| SettingsError::ThemeNotFound(id.to_string()))?;
            removed = Some(s.saved_themes.remove(index));
            if s.theme.as_deref() == Some(id) {
                s.theme = Some("default".to_string());
            }
            Ok(())
        })?;

        removed.ok_or_else(|| SettingsError::ThemeNotFound(id.to_string()))
    }

    /// Change the unlock PIN
    ///
    /// The session is revoked so the next protected view asks for the new PIN.
    pub fn change_pin(&self, current: &str, new: &str, confirm: &str) -> Result<()> {
        let local = self.stores.local.as_ref();
        if !secret::verify_or_fallback(local, current, &self.fallback_secret)? {
            tracing::warn!("PIN change rejected: incorrect current PIN");
            return Err(SettingsError::IncorrectPin);
        }
        if !secret::is_valid_pin(new) {
            return Err(SettingsError::InvalidPin);
        }
        if !secret::pins_match(new, confirm) {
            return Err(SettingsError::PinMismatch);
        }

        secret::store_secret(local, new)?;
        SessionFlag::new(self.stores.session.clone()).revoke()?;
        tracing::info!("PIN changed, session revoked");
        Ok(())
    }

    /// Configure the monthly installment reminder
    pub fn set_reminder(&self, enabled: bool, day_of_month: u32) -> Result<GlobalSettings> {
        if !REMINDER_DAYS.contains(&day_of_month) {
            return Err(SettingsError::InvalidReminderDay(day_of_month));
        }
        self.update(|s| {
            s.installment_reminder = Some(ReminderSettings {
                enabled,
                day_of_month,
            });
            Ok(())
        })
    }

    /// Choose the display currency
    ///
    /// Without an explicit symbol the known symbol for `code` is used, or the
    /// code itself.
    pub fn set_currency(&self, code: &str, symbol: Option<&str>) -> Result<GlobalSettings> {
        let code = code.trim().to_ascii_uppercase();
        if code.is_empty() {
            return Err(SettingsError::EmptyCurrency);
        }
        let symbol = symbol
            .map(str::to_string)
            .or_else(|| currency_symbol(&code).map(str::to_string))
            .unwrap_or_else(|| code.clone());

        self.update(|s| {
            s.currency = Some(code);
            s.currency_symbol = Some(symbol);
            Ok(())
        })
    }

    /// Switch language and re-translate the current view
    pub fn set_language(&self, code: &str) -> Result<GlobalSettings> {
        let settings = self.update(|s| {
            s.language = Some(code.to_string());
            Ok(())
        })?;
        self.localizer.set_language(code);
        Ok(settings)
    }

    /// Enable or disable biometric unlock on the lock screen
    pub fn set_biometric_enabled(&self, enabled: bool) -> Result<()> {
        let local = self.stores.local.as_ref();
        if enabled {
            local.set(keys::BIOMETRIC_ENABLED, "true")?;
        } else {
            local.remove(keys::BIOMETRIC_ENABLED)?;
        }
        Ok(())
    }
}
