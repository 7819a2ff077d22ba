//! Chart colour themes.
//!
//! The theme only restyles markers and axes; it never changes which
//! markers are shown.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Light or dark palette.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ThemeMode {
    /// Dark text on light background
    #[default]
    Light,
    /// Light text on dark background
    Dark,
}

impl std::fmt::Display for ThemeMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ThemeMode::Light => write!(f, "light"),
            ThemeMode::Dark => write!(f, "dark"),
        }
    }
}

impl FromStr for ThemeMode {
    type Err = ThemeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "light" => Ok(ThemeMode::Light),
            "dark" => Ok(ThemeMode::Dark),
            other => Err(ThemeError::UnknownMode(other.to_string())),
        }
    }
}

/// Colours handed to the chart renderer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartTheme {
    /// Palette this theme was built from
    pub mode: ThemeMode,
    /// Axis domain line
    pub axis_stroke: String,
    /// Tick labels
    pub tick_text: String,
    /// Legend and event marker labels
    pub legend_text: String,
    /// Grid lines
    pub grid_stroke: String,
    /// Tooltip background
    pub tooltip_background: String,
    /// Tooltip text
    pub tooltip_text: String,
}

impl ChartTheme {
    /// Default light palette.
    #[must_use]
    pub fn light() -> Self {
        Self {
            mode: ThemeMode::Light,
            axis_stroke: "transparent".to_string(),
            tick_text: "#333333".to_string(),
            legend_text: "#333333".to_string(),
            grid_stroke: "#dddddd".to_string(),
            tooltip_background: "#ffffff".to_string(),
            tooltip_text: "inherit".to_string(),
        }
    }

    /// Dark palette.
    #[must_use]
    pub fn dark() -> Self {
        Self {
            mode: ThemeMode::Dark,
            axis_stroke: "#526271".to_string(),
            tick_text: "#8d9cab".to_string(),
            legend_text: "#8d9cab".to_string(),
            grid_stroke: "#888".to_string(),
            tooltip_background: "#000".to_string(),
            tooltip_text: "#ddd".to_string(),
        }
    }

    /// Palette for the given mode.
    #[must_use]
    pub fn for_mode(mode: ThemeMode) -> Self {
        match mode {
            ThemeMode::Light => Self::light(),
            ThemeMode::Dark => Self::dark(),
        }
    }
}

impl Default for ChartTheme {
    fn default() -> Self {
        Self::light()
    }
}

/// Errors that can occur when selecting a theme.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ThemeError {
    /// Mode name is neither `light` nor `dark`
    #[error("unknown theme mode: {0}")]
    UnknownMode(String),
}
