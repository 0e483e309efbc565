//! PayTrack Core - Storage, session and dashboard services
//!
//! This crate holds everything the PayTrack dashboard does on top of a flat
//! key-value store:
//! - The [`KeyValueStore`] capability with in-memory and file-backed stores
//! - The stored PIN secret and the session flag
//! - Project ("tracker") management with undoable deletion
//! - Global settings: themes, currency, language, reminders, PIN change
//! - Theme color math for custom themes
//!
//! The PIN lock screen itself lives in `paytrack-gate`.

pub mod config;
pub mod error;
pub mod keys;
pub mod model;
pub mod ports;
pub mod projects;
pub mod secret;
pub mod session;
pub mod settings;
pub mod storage;
pub mod theme;

pub use config::{AppConfig, ConfigError};
pub use error::{Result, StoreError};
pub use model::{
    GlobalSettings, Project, ProjectKind, ProjectSettings, ReminderSettings, SavedTheme,
    ThemeConfig,
};
pub use ports::{Localizer, Navigator, View};
pub use projects::{ProjectBook, ProjectError, UndoTicket, UndoWindow};
pub use session::{SessionError, SessionFlag};
pub use settings::{SettingsError, SettingsService};
pub use storage::{JsonFileStore, KeyValueStore, MemoryStore, SharedStore, Stores};
pub use theme::{ResolvedTheme, Rgb, ThemeError, ThemeStyle};

/// Length of the unlock PIN
pub const PIN_LENGTH: usize = 4;
