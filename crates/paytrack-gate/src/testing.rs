//! Recording doubles for the host collaborators

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use paytrack_core::{Localizer, Navigator, View};

use crate::feedback::{Feedback, Notice};

/// Keeps every notice it is given
#[derive(Debug, Default)]
pub struct RecordingFeedback {
    notices: Mutex<Vec<Notice>>,
    clears: AtomicUsize,
}

impl RecordingFeedback {
    pub fn notices(&self) -> Vec<Notice> {
        self.notices.lock().map(|n| n.clone()).unwrap_or_default()
    }

    pub fn last(&self) -> Option<Notice> {
        self.notices.lock().ok().and_then(|n| n.last().cloned())
    }

    pub fn clear_count(&self) -> usize {
        self.clears.load(Ordering::SeqCst)
    }
}

impl Feedback for RecordingFeedback {
    fn notify(&self, notice: &Notice) {
        if let Ok(mut notices) = self.notices.lock() {
            notices.push(notice.clone());
        }
    }

    fn clear(&self) {
        self.clears.fetch_add(1, Ordering::SeqCst);
    }
}

/// Keeps every view it is asked to show
#[derive(Debug, Default)]
pub struct RecordingNavigator {
    views: Mutex<Vec<View>>,
}

impl RecordingNavigator {
    pub fn views(&self) -> Vec<View> {
        self.views.lock().map(|v| v.clone()).unwrap_or_default()
    }
}

impl Navigator for RecordingNavigator {
    fn replace_view(&self, view: View) {
        if let Ok(mut views) = self.views.lock() {
            views.push(view);
        }
    }
}

/// Localizer with a fixed language that counts page translations
#[derive(Debug, Default)]
pub struct NoopLocalizer {
    translations: AtomicUsize,
    language: Mutex<Option<String>>,
}

impl NoopLocalizer {
    pub fn translations(&self) -> usize {
        self.translations.load(Ordering::SeqCst)
    }
}

impl Localizer for NoopLocalizer {
    fn translate_page(&self) {
        self.translations.fetch_add(1, Ordering::SeqCst);
    }

    fn language(&self) -> String {
        self.language
            .lock()
            .ok()
            .and_then(|l| l.clone())
            .unwrap_or_else(|| "en".to_string())
    }

    fn set_language(&self, code: &str) {
        if let Ok(mut language) = self.language.lock() {
            *language = Some(code.to_string());
        }
        self.translate_page();
    }
}
