//! Persisted data model
//!
//! Field names follow the JSON written by the tracker pages (camelCase).

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// What a project tracks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectKind {
    /// Day-to-day income and expenses
    Expense,
    /// Installment plan with a monthly reminder
    Installment,
}

impl ProjectKind {
    /// Human-readable label
    pub fn label(&self) -> &'static str {
        match self {
            ProjectKind::Expense => "Finance Tracker",
            ProjectKind::Installment => "Installment Tracker",
        }
    }
}

impl std::str::FromStr for ProjectKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "expense" => Ok(ProjectKind::Expense),
            "installment" => Ok(ProjectKind::Installment),
            other => Err(format!("unknown project type: {}", other)),
        }
    }
}

/// A tracker shown on the dashboard
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    /// Creation time in Unix milliseconds, unique within the list
    pub id: i64,
    /// Display name (trimmed, never empty)
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ProjectKind,
}

/// Settings record written for every new project
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectSettings {
    pub expense_mode: bool,
    pub theme: String,
    pub dynamic_progress_bar: bool,
    pub progress_bar_color: String,
    #[serde(default)]
    pub custom_banks: Vec<Value>,
    #[serde(default)]
    pub custom_expense_types: Vec<Value>,
}

impl ProjectSettings {
    /// Defaults for a freshly created project
    pub fn initial(kind: ProjectKind) -> Self {
        Self {
            expense_mode: kind == ProjectKind::Expense,
            theme: "blue".to_string(),
            dynamic_progress_bar: false,
            progress_bar_color: "green".to_string(),
            custom_banks: Vec::new(),
            custom_expense_types: Vec::new(),
        }
    }
}

/// A custom theme: one solid color or a two-color gradient
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThemeConfig {
    #[serde(default)]
    pub is_gradient: bool,
    /// Start color, `#`-prefixed hex
    pub color1: String,
    /// End color, only for gradients
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color2: Option<String>,
    /// CSS gradient direction, e.g. `to right` or `135deg`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direction: Option<String>,
}

impl ThemeConfig {
    /// Solid-color theme
    pub fn solid(color1: impl Into<String>) -> Self {
        Self {
            is_gradient: false,
            color1: color1.into(),
            color2: None,
            direction: None,
        }
    }

    /// Two-color gradient theme
    pub fn gradient(
        color1: impl Into<String>,
        color2: impl Into<String>,
        direction: impl Into<String>,
    ) -> Self {
        Self {
            is_gradient: true,
            color1: color1.into(),
            color2: Some(color2.into()),
            direction: Some(direction.into()),
        }
    }
}

/// A named custom theme kept in the settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedTheme {
    /// `custom-<millis>`
    pub id: String,
    pub name: String,
    #[serde(flatten)]
    pub config: ThemeConfig,
}

/// Monthly installment reminder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReminderSettings {
    pub enabled: bool,
    /// Day of month, 1-28
    #[serde(default = "default_reminder_day")]
    pub day_of_month: u32,
}

fn default_reminder_day() -> u32 {
    1
}

/// Dashboard-wide settings
///
/// Fields this crate does not know about are carried through untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalSettings {
    /// Selected theme: `default`, a preset name, `custom` or a saved theme id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_theme_config: Option<ThemeConfig>,

    #[serde(default)]
    pub saved_themes: Vec<SavedTheme>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency_symbol: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub installment_reminder: Option<ReminderSettings>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl GlobalSettings {
    /// Selected theme name, `default` when unset
    pub fn theme_name(&self) -> &str {
        self.theme.as_deref().unwrap_or("default")
    }

    /// Selected currency code, `USD` when unset
    pub fn currency_code(&self) -> &str {
        self.currency.as_deref().unwrap_or("USD")
    }

    /// Find a saved theme by id
    pub fn saved_theme(&self, id: &str) -> Option<&SavedTheme> {
        self.saved_themes.iter().find(|t| t.id == id)
    }
}
