//! Terminal implementations of the host collaborators

use std::io::Write;
use std::sync::Mutex;

use paytrack_core::{Localizer, Navigator, View};
use paytrack_gate::{Feedback, Notice, Severity};

/// Prints notices to stdout
#[derive(Debug, Default)]
pub struct TerminalFeedback;

impl Feedback for TerminalFeedback {
    fn notify(&self, notice: &Notice) {
        let mut out = std::io::stdout().lock();
        // Countdown ticks overwrite each other on one line
        let _ = match (notice, notice.severity()) {
            (Notice::LockoutTick { .. }, _) => write!(out, "\r{}   ", notice),
            (Notice::LockoutEnded, _) => writeln!(out, "\r{}          ", notice),
            (_, Severity::Success) => writeln!(out, "✓ {}", notice),
            (_, Severity::Error) => writeln!(out, "✗ {}", notice),
            (_, Severity::Info) => writeln!(out, "{}", notice),
        };
        let _ = out.flush();
    }
}

/// Reports view changes
#[derive(Debug, Default)]
pub struct TerminalNavigator;

impl Navigator for TerminalNavigator {
    fn replace_view(&self, view: View) {
        match view {
            View::Dashboard => println!("Dashboard unlocked. Try `paytrack projects list`."),
            View::Lock => println!("Locked. Run `paytrack unlock` to continue."),
            View::Settings => println!("Opening settings."),
        }
    }
}

/// Remembers the selected language; the terminal has no translated text
#[derive(Debug)]
pub struct TerminalLocalizer {
    language: Mutex<String>,
}

impl TerminalLocalizer {
    pub fn new(language: Option<&str>) -> Self {
        Self {
            language: Mutex::new(language.unwrap_or("en").to_string()),
        }
    }
}

impl Localizer for TerminalLocalizer {
    fn translate_page(&self) {
        tracing::debug!("Page language: {}", self.language());
    }

    fn language(&self) -> String {
        self.language
            .lock()
            .map(|l| l.clone())
            .unwrap_or_else(|_| "en".to_string())
    }

    fn set_language(&self, code: &str) {
        if let Ok(mut language) = self.language.lock() {
            *language = code.to_string();
        }
        self.translate_page();
    }
}
