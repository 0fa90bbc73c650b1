//! Station configuration
//!
//! Operator-editable TOML file in the platform config directory. Everything
//! has a default so a fresh install can scan offline without any setup.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

fn default_scanner_id() -> String {
    "station".to_string()
}

fn default_dedup_window_ms() -> i64 {
    crate::session::DEFAULT_DEDUP_WINDOW_MS
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Base URL of the membership API used for badge resolution. When unset
    /// the station runs with format-only offline resolution.
    pub api_base_url: Option<String>,
    /// Identifier reported for this device in session rows and reports
    #[serde(default = "default_scanner_id")]
    pub scanner_id: String,
    /// Default location label for recorded scans
    pub location: Option<String>,
    /// Default event id attached to new sessions
    pub event_id: Option<i64>,
    /// Duplicate suppression window in milliseconds
    #[serde(default = "default_dedup_window_ms")]
    pub dedup_window_ms: i64,
    /// When set, the scan command asks for this code before opening a session
    pub access_code: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: None,
            scanner_id: default_scanner_id(),
            location: None,
            event_id: None,
            dedup_window_ms: default_dedup_window_ms(),
            access_code: None,
        }
    }
}

impl Config {
    /// Load the config from the default path, falling back to defaults when
    /// the file does not exist yet.
    pub fn load() -> Result<Self> {
        Self::load_from(&config_path()?)
    }

    /// Load the config from an explicit path.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        Ok(config)
    }

    /// Write the config, creating the parent directory if needed.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
        Ok(())
    }
}

/// Default config file location.
pub fn config_path() -> Result<PathBuf> {
    let dirs = directories::ProjectDirs::from("", "", "doorscan")
        .context("Failed to determine a config directory for this platform")?;
    Ok(dirs.config_dir().join("config.toml"))
}
