#![forbid(unsafe_code)]

//! Visualizer configuration.
//!
//! Every field has a default matching the stock behavior, so an empty file
//! (or `VisualizerConfig::default()`) reproduces it.
//!
//! ```toml
//! toggle_duration_ms = 250
//! easing = "linear"
//! whitespace_glyph = "·"
//!
//! [monospace]
//! char_width = 7.0
//! line_height = 14.0
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::animation::Easing;
use crate::builder::WHITESPACE_GLYPH;
use crate::measure::MonospaceConfig;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("whitespace_glyph must not be empty")]
    EmptyGlyph,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisualizerConfig {
    /// Length of one expand/collapse transition.
    pub toggle_duration_ms: u64,
    pub easing: Easing,
    /// Shown in the ribbon in place of whitespace runs.
    pub whitespace_glyph: String,
    /// Cell metrics used when measuring with a monospace grid.
    pub monospace: MonospaceConfig,
}

impl Default for VisualizerConfig {
    fn default() -> Self {
        Self {
            toggle_duration_ms: 500,
            easing: Easing::default(),
            whitespace_glyph: WHITESPACE_GLYPH.to_string(),
            monospace: MonospaceConfig::default(),
        }
    }
}

impl VisualizerConfig {
    #[must_use]
    pub fn toggle_duration(&self) -> Duration {
        Duration::from_millis(self.toggle_duration_ms)
    }

    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validate()
    }

    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(s)?;
        config.validate()
    }

    /// Load from disk; `.json` files are parsed as JSON, anything else as TOML.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        if path.extension().is_some_and(|ext| ext == "json") {
            Self::from_json_str(&content)
        } else {
            Self::from_toml_str(&content)
        }
    }

    fn validate(self) -> Result<Self, ConfigError> {
        if self.whitespace_glyph.is_empty() {
            return Err(ConfigError::EmptyGlyph);
        }
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_is_default() {
        assert_eq!(
            VisualizerConfig::from_toml_str("").unwrap(),
            VisualizerConfig::default()
        );
    }

    #[test]
    fn partial_toml_overrides_fields() {
        let config = VisualizerConfig::from_toml_str(
            r#"
            toggle_duration_ms = 250
            easing = "linear"

            [monospace]
            char_width = 7.0
            "#,
        )
        .unwrap();
        assert_eq!(config.toggle_duration(), Duration::from_millis(250));
        assert_eq!(config.easing, Easing::Linear);
        assert_eq!(config.monospace.char_width, 7.0);
        assert_eq!(config.monospace.line_height, 16.0);
        assert_eq!(config.whitespace_glyph, "\u{b7}");
    }

    #[test]
    fn json_is_accepted() {
        let config = VisualizerConfig::from_json_str(r#"{ "easing": "cubic-in-out" }"#).unwrap();
        assert_eq!(config.easing, Easing::CubicInOut);
    }

    #[test]
    fn empty_glyph_is_rejected() {
        let err = VisualizerConfig::from_toml_str(r#"whitespace_glyph = """#).unwrap_err();
        assert!(matches!(err, ConfigError::EmptyGlyph));
    }
}
