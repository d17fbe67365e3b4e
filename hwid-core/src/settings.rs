//! Application Settings
//!
//! Persistent settings stored as JSON in ~/.config/hwid/settings.json.
//! Every field has a default, so a missing file or a partial file is fine.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::constants::paths::{user_config_dir, SETTINGS_FILE, STORE_FILE};
use crate::error::{HwidError, Result};
use crate::fingerprint::{BuilderOptions, MatchPolicy};
use crate::store::{read_bounded, write_atomic};

/// Log levels accepted in `log_level`
pub const LOG_LEVELS: &[&str] = &["error", "warn", "info", "debug", "trace"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Enrollment store location; `None` means `<config dir>/fingerprint_store.json`
    #[serde(default)]
    pub store_path: Option<PathBuf>,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Also compare against legacy CPU blocks when verifying
    #[serde(default = "default_true")]
    pub accept_legacy_formats: bool,

    /// Leave hypervisor adapters out of the fingerprint
    #[serde(default = "default_true")]
    pub skip_virtual_macs: bool,

    #[serde(default)]
    pub policy: MatchPolicy,
}

fn default_log_level() -> String { "info".to_string() }
fn default_true() -> bool { true }

impl Default for Settings {
    fn default() -> Self {
        Self {
            store_path: None,
            log_level: default_log_level(),
            accept_legacy_formats: true,
            skip_virtual_macs: true,
            policy: MatchPolicy::default(),
        }
    }
}

impl Settings {
    /// Settings file path in the default config directory
    pub fn default_path() -> Result<PathBuf> {
        let dir = user_config_dir()
            .ok_or_else(|| HwidError::config("Could not determine config directory"))?;
        Ok(dir.join(SETTINGS_FILE))
    }

    /// Load from the default config directory
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::default_path()?)
    }

    /// Load `settings.json` from `dir`
    pub fn load_from_dir(dir: &Path) -> Result<Self> {
        Self::load_from(&dir.join(SETTINGS_FILE))
    }

    /// Load and validate; a missing file yields defaults
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = ?path, "No settings file, using defaults");
            return Ok(Self::default());
        }

        let content = read_bounded(path)?;
        let settings: Self = serde_json::from_str(&content)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Save atomically to `path`
    pub fn save_to(&self, path: &Path) -> Result<()> {
        self.validate()?;
        let json = serde_json::to_string_pretty(self)?;
        write_atomic(path, json.as_bytes())
    }

    pub fn validate(&self) -> Result<()> {
        self.policy.validate()?;
        if !LOG_LEVELS.contains(&self.log_level.to_lowercase().as_str()) {
            return Err(HwidError::invalid_config(
                "log_level",
                format!("'{}' is not one of {}", self.log_level, LOG_LEVELS.join(", ")),
            ));
        }
        Ok(())
    }

    /// Store path: explicit setting, else next to the settings in `config_dir`
    pub fn resolve_store_path(&self, config_dir: Option<&Path>) -> Result<PathBuf> {
        if let Some(ref path) = self.store_path {
            return Ok(path.clone());
        }
        match config_dir {
            Some(dir) => Ok(dir.join(STORE_FILE)),
            None => {
                let dir = user_config_dir().ok_or_else(|| {
                    HwidError::MissingConfig("store_path (no config directory)".to_string())
                })?;
                Ok(dir.join(STORE_FILE))
            }
        }
    }

    /// Builder tuning derived from these settings
    pub fn builder_options(&self) -> BuilderOptions {
        BuilderOptions {
            skip_virtual_macs: self.skip_virtual_macs,
            ..BuilderOptions::default()
        }
    }
}
