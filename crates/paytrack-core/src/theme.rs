//! Theme color math
//!
//! Custom themes are one or two user-entered hex colors. The dashboard derives
//! a background gradient and picks light or dark foreground colors from the
//! perceived luminance of the start color.

use std::fmt;

use crate::model::{GlobalSettings, ThemeConfig};

/// Direction used for solid-color themes
const SOLID_DIRECTION: &str = "135deg";

/// Percent a solid color is shifted to make its gradient partner
const SOLID_SHIFT_PERCENT: i32 = 15;

/// Theme errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ThemeError {
    #[error("Not a valid HEX code: {0}")]
    InvalidHex(String),
}

/// An 8-bit RGB color
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    /// Parse `#rgb`, `#rrggbb`, `rgb` or `rrggbb`, any case
    pub fn parse(hex: &str) -> Result<Self, ThemeError> {
        let digits = hex.strip_prefix('#').unwrap_or(hex);
        if !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(ThemeError::InvalidHex(hex.to_string()));
        }

        let expanded: String = match digits.len() {
            3 => digits.chars().flat_map(|c| [c, c]).collect(),
            6 => digits.to_string(),
            _ => return Err(ThemeError::InvalidHex(hex.to_string())),
        };

        let channel = |i: usize| {
            u8::from_str_radix(&expanded[i..i + 2], 16)
                .map_err(|_| ThemeError::InvalidHex(hex.to_string()))
        };

        Ok(Self {
            r: channel(0)?,
            g: channel(2)?,
            b: channel(4)?,
        })
    }

    /// Perceived luminance in [0, 1] (ITU-R BT.601 weights)
    pub fn luminance(&self) -> f64 {
        (0.299 * f64::from(self.r) + 0.587 * f64::from(self.g) + 0.114 * f64::from(self.b))
            / 255.0
    }

    /// Whether foreground text on this color should be light
    pub fn is_dark(&self) -> bool {
        self.luminance() < 0.5
    }

    /// Shift every channel by `floor(255 * percent / 100)`, clamped
    pub fn adjust(&self, percent: i32) -> Self {
        let amount = (255.0 * f64::from(percent) / 100.0).floor() as i32;
        let shift = |c: u8| (i32::from(c) + amount).clamp(0, 255) as u8;
        Self {
            r: shift(self.r),
            g: shift(self.g),
            b: shift(self.b),
        }
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// Whether `color` is a 3 or 6 digit hex code, optionally `#`-prefixed
pub fn is_valid_hex(color: &str) -> bool {
    Rgb::parse(color).is_ok()
}

/// Perceived luminance of a hex color
pub fn luminance(hex: &str) -> Result<f64, ThemeError> {
    Ok(Rgb::parse(hex)?.luminance())
}

/// Lighten (positive) or darken (negative) a hex color by a percentage
pub fn adjust_color(hex: &str, percent: i32) -> Result<String, ThemeError> {
    Ok(Rgb::parse(hex)?.adjust(percent).to_string())
}

/// Style variables derived from a custom theme
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThemeStyle {
    /// CSS background value
    pub background: String,
    pub header_text: &'static str,
    pub header_subtext: &'static str,
    pub icon_filter: &'static str,
    pub button_bg: &'static str,
    pub button_hover_bg: &'static str,
}

impl ThemeStyle {
    /// Derive the style for a custom theme
    ///
    /// A gradient without a usable second color is rendered as a solid theme.
    pub fn derive(config: &ThemeConfig) -> Result<Self, ThemeError> {
        let start = Rgb::parse(&config.color1)?;

        let gradient_end = match (&config.color2, config.is_gradient) {
            (Some(color2), true) => Some(color2.as_str()),
            _ => None,
        };

        let background = match gradient_end {
            Some(end) => {
                Rgb::parse(end)?;
                let direction = config.direction.as_deref().unwrap_or(SOLID_DIRECTION);
                format!("linear-gradient({}, {}, {})", direction, config.color1, end)
            }
            None => {
                let shift = if start.luminance() > 0.5 {
                    -SOLID_SHIFT_PERCENT
                } else {
                    SOLID_SHIFT_PERCENT
                };
                format!(
                    "linear-gradient({}, {}, {})",
                    SOLID_DIRECTION,
                    config.color1,
                    start.adjust(shift)
                )
            }
        };

        Ok(if start.is_dark() {
            Self {
                background,
                header_text: "white",
                header_subtext: "rgba(255, 255, 255, 0.8)",
                icon_filter: "brightness(0) invert(1)",
                button_bg: "rgba(255, 255, 255, 0.2)",
                button_hover_bg: "rgba(255, 255, 255, 0.3)",
            }
        } else {
            Self {
                background,
                header_text: "#1f2937",
                header_subtext: "rgba(0, 0, 0, 0.7)",
                icon_filter: "none",
                button_bg: "rgba(0, 0, 0, 0.05)",
                button_hover_bg: "rgba(0, 0, 0, 0.1)",
            }
        })
    }

    /// Swatch background for a theme button (no derived partner color)
    pub fn swatch(config: &ThemeConfig) -> String {
        match (&config.color2, config.is_gradient) {
            (Some(color2), true) => format!(
                "linear-gradient({}, {}, {})",
                config.direction.as_deref().unwrap_or(SOLID_DIRECTION),
                config.color1,
                color2
            ),
            _ => config.color1.clone(),
        }
    }
}

/// What the host should render for a theme name
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedTheme {
    /// Stock look
    Default,
    /// One of the built-in named themes
    Preset(String),
    /// A custom or saved theme
    Custom(ThemeStyle),
}

/// Resolve a theme name against the settings
///
/// Unknown saved-theme ids and broken custom colors fall back to the default.
pub fn resolve(settings: &GlobalSettings, name: &str) -> ResolvedTheme {
    let config = if name.starts_with("custom-") {
        settings.saved_theme(name).map(|t| &t.config)
    } else if name == "custom" {
        settings.custom_theme_config.as_ref()
    } else if name == "default" || name.is_empty() {
        None
    } else {
        return ResolvedTheme::Preset(name.to_string());
    };

    match config.map(ThemeStyle::derive) {
        Some(Ok(style)) => ResolvedTheme::Custom(style),
        Some(Err(e)) => {
            tracing::warn!("Ignoring theme {}: {}", name, e);
            ResolvedTheme::Default
        }
        None => ResolvedTheme::Default,
    }
}
