//! Tunables of the split layout engine.
//!
//! [`SplitLayoutConfig`] groups every constant the engine would otherwise
//! hardcode. With the `config-files` feature it can be loaded from TOML or
//! JSON:
//!
//! ```toml
//! # splitdock.toml
//! divider_size = 6
//! center_fraction = 0.4
//!
//! [grid]
//! line_snap_threshold = 0.2
//! ```
//!
//! ```rust,ignore
//! let config = SplitLayoutConfig::from_toml_file("splitdock.toml")?;
//! ```

#[cfg(feature = "config-files")]
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Engine configuration. Every field has a usable default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitLayoutConfig {
    /// Thickness of a divider in pixels.
    pub divider_size: i32,
    /// Fraction of each leaf axis, centered, that resolves to a stacking drop.
    pub center_fraction: f64,
    /// Pixels outside the surface still accepted as an edge drop.
    pub side_snap_size: i32,
    /// Lower clamp for dividers computed for a drop; the upper clamp is
    /// `1 - put_divider_min`.
    pub put_divider_min: f64,
    /// Grid-to-tree conversion parameters.
    pub grid: GridConfig,
}

impl Default for SplitLayoutConfig {
    fn default() -> Self {
        Self {
            divider_size: 4,
            center_fraction: 0.5,
            side_snap_size: 20,
            put_divider_min: 0.25,
            grid: GridConfig::default(),
        }
    }
}

/// Parameters of the greedy grid merge.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    /// Maximum normalized distance between a merge midpoint and a hint line
    /// for the divider to snap onto the line.
    pub line_snap_threshold: f64,
    /// Cost added for every hint line a merge would cut through.
    pub line_penalty: f64,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            line_snap_threshold: 0.25,
            line_penalty: 1.0,
        }
    }
}

impl SplitLayoutConfig {
    /// Load from a TOML string.
    #[cfg(feature = "config-files")]
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.checked()
    }

    /// Load from a TOML file on disk.
    #[cfg(feature = "config-files")]
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&content)
    }

    /// Load from a JSON string.
    #[cfg(feature = "config-files")]
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(s)?;
        config.checked()
    }

    /// Load from a JSON file on disk.
    #[cfg(feature = "config-files")]
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&content)
    }

    /// Validate all parameters are within acceptable ranges.
    ///
    /// Returns a list of validation errors. An empty list means the config
    /// is valid.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.divider_size < 0 {
            errors.push(format!(
                "divider_size must be >= 0, got {}",
                self.divider_size
            ));
        }

        if !(self.center_fraction >= 0.0 && self.center_fraction <= 1.0) {
            errors.push(format!(
                "center_fraction must be in [0, 1], got {}",
                self.center_fraction
            ));
        }

        if self.side_snap_size < 0 {
            errors.push(format!(
                "side_snap_size must be >= 0, got {}",
                self.side_snap_size
            ));
        }

        if !(self.put_divider_min >= 0.0 && self.put_divider_min <= 0.5) {
            errors.push(format!(
                "put_divider_min must be in [0, 0.5], got {}",
                self.put_divider_min
            ));
        }

        if !(self.grid.line_snap_threshold >= 0.0 && self.grid.line_snap_threshold <= 1.0) {
            errors.push(format!(
                "grid.line_snap_threshold must be in [0, 1], got {}",
                self.grid.line_snap_threshold
            ));
        }

        if !(self.grid.line_penalty >= 0.0 && self.grid.line_penalty.is_finite()) {
            errors.push(format!(
                "grid.line_penalty must be a finite value >= 0, got {}",
                self.grid.line_penalty
            ));
        }

        errors
    }

    /// Return `self` if it validates, otherwise the list of problems.
    pub fn checked(self) -> Result<Self, ConfigError> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(self)
        } else {
            Err(ConfigError::Validation(errors))
        }
    }
}

/// Errors from loading or validating a [`SplitLayoutConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O error reading a file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parse error.
    #[cfg(feature = "config-files")]
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    /// JSON parse error.
    #[cfg(feature = "config-files")]
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
    /// Validation errors.
    #[error("validation errors: {}", .0.join("; "))]
    Validation(Vec<String>),
}
