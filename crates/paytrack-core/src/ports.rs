//! Collaborators provided by the host surface
//!
//! The rendering layer and the translation helper are not part of this crate.
//! Services talk to them through these traits.

/// Top-level views the host can show
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    /// PIN lock screen
    Lock,
    /// Project dashboard (protected)
    Dashboard,
    /// Settings page (protected)
    Settings,
}

/// Replaces the current view; there is no way back to the caller
pub trait Navigator: Send + Sync {
    fn replace_view(&self, view: View);
}

/// Translation helper
pub trait Localizer: Send + Sync {
    /// Translate the static text of the current view
    fn translate_page(&self);

    /// Current language code
    fn language(&self) -> String;

    /// Switch language and re-translate
    fn set_language(&self, code: &str);
}
