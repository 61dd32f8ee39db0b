//! Configuration system for igx.
//!
//! Provides layered configuration from multiple sources:
//!
//! 1. **Compiled defaults** - Sensible defaults built into the binary
//! 2. **User config file** - `~/.config/igx/config.toml`
//! 3. **Environment variables** - `IGX_*` prefix
//! 4. **CLI arguments** - Highest priority, always wins
//!
//! Analysis thresholds are deliberately not configurable so that numbers
//! from different runs stay comparable.
//!
//! # Example Configuration File
//!
//! ```toml
//! [paths]
//! archive = "~/Downloads/instagram-export.zip"
//!
//! [analysis]
//! owner_name = "Jane Doe"
//! infer_owner = false
//!
//! [output]
//! format = "text"
//! colors = true
//! ```

use crate::error::{IgxError, Result};
use crate::session::OwnerIdentity;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Main configuration structure for igx.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub paths: PathsConfig,
    pub analysis: AnalysisConfig,
    pub output: OutputConfig,
}

/// Path configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Default export location, a `.zip` or an unpacked directory.
    /// Environment variable: `IGX_ARCHIVE`
    pub archive: Option<PathBuf>,
}

/// Who owns the export.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Display name of the account owner, exactly as it appears in messages.
    /// Environment variable: `IGX_OWNER`
    pub owner_name: Option<String>,

    /// Guess the owner from participant frequency when no name is set.
    pub infer_owner: bool,
}

/// Output formatting configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Default output format: text, json, json-pretty, csv.
    pub format: String,

    /// Enable colored output.
    pub colors: bool,

    /// Suppress non-essential output (progress spinners, etc.).
    pub quiet: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: "text".to_string(),
            colors: true,
            quiet: false,
        }
    }
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables
    /// 2. User config file (~/.config/igx/config.toml)
    /// 3. Compiled defaults
    ///
    /// An unreadable config file is logged and ignored.
    #[must_use]
    pub fn load() -> Self {
        let mut config = Self::default();

        if let Some(path) = Self::user_config_path() {
            if path.exists() {
                match Self::load_from_file(&path) {
                    Ok(user_config) => config.merge(user_config),
                    Err(e) => warn!("{e}"),
                }
            } else {
                debug!("Config file not found: {}", path.display());
            }
        }

        config.apply_env_overrides();

        debug!("Configuration loaded: {:?}", config);
        config
    }

    /// Load configuration from a specific file.
    ///
    /// # Errors
    ///
    /// Returns [`IgxError::ConfigError`] if the file cannot be read or parsed.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| IgxError::ConfigError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        let config = toml::from_str(&content).map_err(|e| IgxError::ConfigError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        info!("Loaded config from: {}", path.display());
        Ok(config)
    }

    /// Get the path to the user configuration file.
    #[must_use]
    pub fn user_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("igx").join("config.toml"))
    }

    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply `IGX_*` overrides from any variable source.
    fn apply_overrides<F>(&mut self, var: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(archive) = var("IGX_ARCHIVE") {
            self.paths.archive = Some(PathBuf::from(archive));
        }
        if let Some(owner) = var("IGX_OWNER").filter(|o| !o.trim().is_empty()) {
            self.analysis.owner_name = Some(owner);
        }
        if let Some(format) = var("IGX_FORMAT") {
            self.output.format = format;
        }
        if var("IGX_NO_COLOR").is_some() || var("NO_COLOR").is_some() {
            self.output.colors = false;
        }
        if var("IGX_QUIET").is_some() {
            self.output.quiet = true;
        }
    }

    /// Merge another config into this one (other takes precedence).
    pub fn merge(&mut self, other: Self) {
        if other.paths.archive.is_some() {
            self.paths.archive = other.paths.archive;
        }

        if other.analysis.owner_name.is_some() {
            self.analysis.owner_name = other.analysis.owner_name;
        }
        self.analysis.infer_owner = other.analysis.infer_owner;

        self.output.format = other.output.format;
        self.output.colors = other.output.colors;
        self.output.quiet = other.output.quiet;
    }

    /// Resolve who owns the export.
    ///
    /// # Errors
    ///
    /// Returns [`IgxError::OwnerUnknown`] when no name is configured and
    /// inference is off.
    pub fn owner_identity(&self) -> Result<OwnerIdentity> {
        match &self.analysis.owner_name {
            Some(name) if !name.trim().is_empty() => Ok(OwnerIdentity::Named(name.clone())),
            _ if self.analysis.infer_owner => Ok(OwnerIdentity::Inferred),
            _ => Err(IgxError::OwnerUnknown {
                reason: "no owner name configured and inference is disabled".to_string(),
            }),
        }
    }

    /// Save the current configuration to the user config file.
    ///
    /// # Errors
    ///
    /// Returns an error if the config directory cannot be determined,
    /// the parent directory cannot be created, or the file cannot be written.
    pub fn save(&self) -> Result<PathBuf> {
        let config_path = Self::user_config_path().ok_or_else(|| IgxError::ConfigError {
            path: PathBuf::from("~/.config/igx/config.toml"),
            reason: "Could not determine config directory".to_string(),
        })?;

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| IgxError::path_error("create", parent, e))?;
        }

        let content = toml::to_string_pretty(self).map_err(|e| IgxError::ConfigError {
            path: config_path.clone(),
            reason: e.to_string(),
        })?;

        std::fs::write(&config_path, content)
            .map_err(|e| IgxError::path_error("write", &config_path, e))?;
        info!("Saved config to: {}", config_path.display());
        Ok(config_path)
    }

    /// Generate a default configuration file content.
    #[must_use]
    pub fn default_config_content() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}
