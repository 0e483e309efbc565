//! Key names used in the local and session stores
//!
//! These names are shared with the tracker pages that read the same store,
//! so they MUST NOT change.

/// The 4-digit unlock PIN (local store)
pub const SECRET: &str = "dashboardDeletePassword";

/// Session grant flag (session store)
pub const SESSION: &str = "paytrackUserSession";

/// Whether biometric unlock was enabled in settings (local store)
pub const BIOMETRIC_ENABLED: &str = "biometricEnabled";

/// Serialized [`crate::GlobalSettings`] (local store)
pub const GLOBAL_SETTINGS: &str = "dashboardGlobalSettings";

/// Serialized project list (local store)
pub const PROJECTS: &str = "allTrackerProjects";

/// Project opened by the tracker page (session store)
pub const CURRENT_PROJECT: &str = "currentProjectId";

/// Date an installment was last recorded, `YYYY-MM-DD` (local store)
pub const LAST_INSTALLMENT_ADDED: &str = "lastInstallmentAddedDate";

/// Date the reminder banner was last dismissed, `YYYY-MM-DD` (local store)
pub const LAST_REMINDER_DISMISSED: &str = "lastReminderDismissedDate";

/// Per-project settings record
pub fn project_settings(id: i64) -> String {
    format!("project_{}_settings", id)
}

/// Per-project installment ledger
pub fn project_installment(id: i64) -> String {
    format!("project_{}_installment", id)
}

/// Per-project expense ledger
pub fn project_expense(id: i64) -> String {
    format!("project_{}_expense", id)
}
