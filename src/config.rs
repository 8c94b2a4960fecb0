//! Weft Configuration Module
//!
//! Persistent user settings stored in `~/.config/weft/config.toml`.
//!
//! ## Priority Order (highest to lowest)
//!
//! 1. Environment variables (`WEFT_COLUMN_SPACING`, `WEFT_ROW_SPACING`)
//! 2. Config file (`~/.config/weft/config.toml`)
//! 3. Defaults
//!
//! ```toml
//! [layout]
//! column_spacing = 400.0
//! row_spacing = 150.0
//! input_spacing = 30.0
//!
//! [fleet]
//! small = 3
//! large = 5
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, WeftError};
use crate::layout::LayoutConfig;
use crate::machines::FleetMaxima;

pub const COLUMN_SPACING_ENV: &str = "WEFT_COLUMN_SPACING";
pub const ROW_SPACING_ENV: &str = "WEFT_ROW_SPACING";

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct WeftConfig {
    /// Editor spacing used when laying out a new version
    #[serde(default)]
    pub layout: LayoutConfig,

    /// Fleet maxima used when no fleet file is given
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fleet: Option<FleetMaxima>,
}

impl WeftConfig {
    /// Returns `~/.config/weft/` on Unix, `%APPDATA%/weft/` on Windows
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("weft")
    }

    pub fn config_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    /// Load configuration from the default path
    ///
    /// Returns default config if file doesn't exist.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    /// Returns error if the file exists but is malformed.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|e| WeftError::ConfigError {
            reason: format!("Failed to read config file: {e}"),
        })?;

        toml::from_str(&content).map_err(|e| WeftError::ConfigError {
            reason: format!("Failed to parse config file: {e}"),
        })
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path())
    }

    /// Creates the parent directory if it doesn't exist.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            if !dir.as_os_str().is_empty() && !dir.exists() {
                fs::create_dir_all(dir).map_err(|e| WeftError::ConfigError {
                    reason: format!("Failed to create config directory: {e}"),
                })?;
            }
        }

        let content = toml::to_string_pretty(self).map_err(|e| WeftError::ConfigError {
            reason: format!("Failed to serialize config: {e}"),
        })?;

        fs::write(path, content).map_err(|e| WeftError::ConfigError {
            reason: format!("Failed to write config file: {e}"),
        })
    }

    /// Merge with environment variables
    pub fn with_env(self) -> Result<Self> {
        self.with_env_from(|name| std::env::var(name).ok())
    }

    /// Merge with variables from `lookup`; empty values are ignored
    pub fn with_env_from<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(spacing) = spacing_var(&lookup, COLUMN_SPACING_ENV)? {
            self.layout.column_spacing = spacing;
        }
        if let Some(spacing) = spacing_var(&lookup, ROW_SPACING_ENV)? {
            self.layout.row_spacing = spacing;
        }
        Ok(self)
    }
}

fn spacing_var<F>(lookup: &F, name: &str) -> Result<Option<f64>>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = lookup(name).filter(|v| !v.trim().is_empty()) else {
        return Ok(None);
    };
    match raw.trim().parse::<f64>() {
        Ok(value) if value.is_finite() && value >= 0.0 => Ok(Some(value)),
        _ => Err(WeftError::ConfigError {
            reason: format!("{name} must be a non-negative number, got '{raw}'"),
        }),
    }
}
