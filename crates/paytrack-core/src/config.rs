//! Application configuration
//!
//! Stored as JSON at `$PAYTRACK_CONFIG`, or `paytrack/config.json` under the
//! platform config directory. Every field has a default, so a missing file or
//! a partial one is fine.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::secret::{DEFAULT_DELETE_FALLBACK_SECRET, DEFAULT_FALLBACK_SECRET};
use crate::storage::{JsonFileStore, Stores};

/// Environment variable overriding the config file location
pub const CONFIG_ENV_VAR: &str = "PAYTRACK_CONFIG";

/// Configuration file name
const CONFIG_FILE_NAME: &str = "config.json";

/// Directory name under the platform config and data directories
const APP_DIR_NAME: &str = "paytrack";

/// File holding the long-lived store
const LOCAL_STORE_FILE: &str = "local.json";

/// File holding the session store
const SESSION_STORE_FILE: &str = "paytrack-session.json";

/// Bounds applied to the lockout duration, in seconds
const MIN_LOCKOUT_SECS: u64 = 30;
const MAX_LOCKOUT_SECS: u64 = 60;

/// PayTrack configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Where the local store lives; platform data dir when unset
    pub data_dir: Option<PathBuf>,

    /// Failed logins before the lock screen locks out
    pub max_attempts: u32,

    /// Lockout length in seconds
    pub lockout_secs: u64,

    /// Delay between the fourth digit and verification
    pub verify_delay_ms: u64,

    /// PIN accepted for settings changes while none is stored
    pub fallback_secret: String,

    /// PIN accepted for project deletion while none is stored
    pub delete_fallback_secret: String,

    /// How long a biometric prompt may stay open
    pub biometric_timeout_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            max_attempts: 4,
            lockout_secs: 60,
            verify_delay_ms: 150,
            fallback_secret: DEFAULT_FALLBACK_SECRET.to_string(),
            delete_fallback_secret: DEFAULT_DELETE_FALLBACK_SECRET.to_string(),
            biometric_timeout_secs: 60,
        }
    }
}

impl AppConfig {
    /// Resolve the config file path
    pub fn config_file_path() -> Option<PathBuf> {
        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            if !path.is_empty() {
                return Some(PathBuf::from(path));
            }
        }
        dirs::config_dir().map(|d| d.join(APP_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    /// Load configuration, falling back to defaults
    pub fn load() -> Self {
        let path = match Self::config_file_path() {
            Some(p) => p,
            None => {
                tracing::warn!("Could not determine config directory, using defaults");
                return Self::default();
            }
        };

        if !path.exists() {
            tracing::debug!("No config at {:?}, using defaults", path);
            return Self::default();
        }

        Self::load_from(&path).unwrap_or_else(|e| {
            tracing::warn!("Failed to load config {:?}: {}", path, e);
            Self::default()
        })
    }

    /// Load configuration from a specific file
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::Io(e.to_string()))?;
        serde_json::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Write configuration to a specific file
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::Io(e.to_string()))?;
        }
        let contents =
            serde_json::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))?;
        fs::write(path, contents).map_err(|e| ConfigError::Io(e.to_string()))?;

        tracing::debug!("Saved config to {:?}", path);
        Ok(())
    }

    /// Lockout length, clamped to 30..=60 seconds
    pub fn lockout_duration(&self) -> Duration {
        Duration::from_secs(self.lockout_secs.clamp(MIN_LOCKOUT_SECS, MAX_LOCKOUT_SECS))
    }

    pub fn verify_delay(&self) -> Duration {
        Duration::from_millis(self.verify_delay_ms)
    }

    pub fn biometric_timeout(&self) -> Duration {
        Duration::from_secs(self.biometric_timeout_secs)
    }

    /// Attempts before lockout, at least one
    pub fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }

    /// Directory of the local store
    pub fn data_dir(&self) -> Result<PathBuf, ConfigError> {
        match &self.data_dir {
            Some(dir) => Ok(dir.clone()),
            None => dirs::data_dir()
                .map(|d| d.join(APP_DIR_NAME))
                .ok_or(ConfigError::NoDataDir),
        }
    }

    /// Path of the local store file
    pub fn local_store_path(&self) -> Result<PathBuf, ConfigError> {
        Ok(self.data_dir()?.join(LOCAL_STORE_FILE))
    }

    /// Path of the session store file
    ///
    /// Lives in the runtime directory when there is one so that it does not
    /// survive a logout or reboot.
    pub fn session_store_path(&self) -> PathBuf {
        dirs::runtime_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join(SESSION_STORE_FILE)
    }

    /// Open the file-backed local and session stores
    pub fn open_stores(&self) -> Result<Stores, ConfigError> {
        let local = JsonFileStore::open(self.local_store_path()?)?;
        let session = JsonFileStore::open(self.session_store_path())?;
        Ok(Stores::new(Arc::new(local), Arc::new(session)))
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Could not determine data directory")]
    NoDataDir,

    #[error("IO error: {0}")]
    Io(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Storage error: {0}")]
    Store(#[from] StoreError),
}
