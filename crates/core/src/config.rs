//! Configuration management
//!
//! This module handles loading, saving, and migrating the shelf configuration file.
//! The configuration file is stored in TOML format at ~/.config/shelf/config.toml,
//! or under `$SHELF_CONFIG_DIR` when that variable is set.
//!
//! The configuration is loaded once when a command starts. Store and catalog
//! adapters receive the values they need at construction; changing the file
//! takes effect the next time a session is opened.
//!
//! PROTECTED FILE: Changes to schema_version require migration support.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::placeholder::{DEFAULT_MARKER_NAME, DirectoryMarker, MarkerVisibility};
use crate::profile::Profile;

/// Current configuration schema version
///
/// IMPORTANT: Bumping this version requires:
/// 1. Adding a migration step in `ConfigManager::migrate`
/// 2. Updating migration tests
/// 3. Marking the change as BREAKING
pub const SCHEMA_VERSION: u32 = 1;

/// Environment variable overriding the configuration directory
pub const CONFIG_DIR_ENV: &str = "SHELF_CONFIG_DIR";

/// Default output format
const DEFAULT_OUTPUT: &str = "human";

/// Default color setting
const DEFAULT_COLOR: &str = "auto";

/// Default number of entries requested per list call
pub const DEFAULT_PAGE_LIMIT: usize = 1000;

/// Default origin of the preview page used by share links
const DEFAULT_SHARE_ORIGIN: &str = "http://localhost:3000";

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Schema version for migration support
    pub schema_version: u32,

    /// Default settings
    #[serde(default)]
    pub defaults: Defaults,

    /// Configured storage profiles
    #[serde(default)]
    pub profiles: Vec<Profile>,
}

/// Default settings for shelf behavior
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Defaults {
    /// Output format: "human" or "json"
    #[serde(default = "default_output")]
    pub output: String,

    /// Color mode: "auto", "always", or "never"
    #[serde(default = "default_color")]
    pub color: String,

    /// Show progress bars
    #[serde(default = "default_true")]
    pub progress: bool,

    /// Entries requested per list call; larger folders are not fully enumerated
    #[serde(default = "default_page_limit")]
    pub page_limit: usize,

    /// File name of the zero-byte folder marker
    #[serde(default = "default_marker_name")]
    pub marker_name: String,

    /// Whether folder markers appear in listings
    #[serde(default)]
    pub marker_visibility: MarkerVisibility,

    /// Origin of the preview page share links point at
    #[serde(default = "default_share_origin")]
    pub share_origin: String,
}

fn default_output() -> String {
    DEFAULT_OUTPUT.to_string()
}

fn default_color() -> String {
    DEFAULT_COLOR.to_string()
}

fn default_true() -> bool {
    true
}

fn default_page_limit() -> usize {
    DEFAULT_PAGE_LIMIT
}

fn default_marker_name() -> String {
    DEFAULT_MARKER_NAME.to_string()
}

fn default_share_origin() -> String {
    DEFAULT_SHARE_ORIGIN.to_string()
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
            progress: true,
            page_limit: default_page_limit(),
            marker_name: default_marker_name(),
            marker_visibility: MarkerVisibility::default(),
            share_origin: default_share_origin(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            defaults: Defaults::default(),
            profiles: Vec::new(),
        }
    }
}

impl Config {
    /// Reject settings the engines cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.defaults.page_limit == 0 {
            return Err(Error::Config("page_limit must be at least 1".into()));
        }
        crate::path::validate_name(&self.defaults.marker_name)
            .map_err(|e| Error::Config(format!("marker_name: {e}")))?;
        url::Url::parse(&self.defaults.share_origin)?;
        Ok(())
    }
}

/// Settings shared by the listing and transfer engines
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineSettings {
    /// Owner whose catalog rows are merged into views
    pub owner_id: String,
    /// Folder marker object
    pub marker: DirectoryMarker,
    /// Whether markers appear in listings
    pub marker_visibility: MarkerVisibility,
    /// Entries requested per list call
    pub page_limit: usize,
}

impl EngineSettings {
    pub fn new(defaults: &Defaults, owner_id: impl Into<String>) -> Self {
        Self {
            owner_id: owner_id.into(),
            marker: DirectoryMarker::new(defaults.marker_name.clone()),
            marker_visibility: defaults.marker_visibility,
            page_limit: defaults.page_limit,
        }
    }

    #[cfg(test)]
    pub(crate) fn for_test() -> Self {
        let defaults = Defaults {
            page_limit: 100,
            ..Defaults::default()
        };
        Self::new(&defaults, "owner")
    }
}

/// Configuration manager handles loading and saving config
#[derive(Debug)]
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    /// Create a new ConfigManager with the default config path
    pub fn new() -> Result<Self> {
        if let Some(dir) = std::env::var_os(CONFIG_DIR_ENV) {
            return Ok(Self::with_path(PathBuf::from(dir).join("config.toml")));
        }
        let config_dir = dirs::config_dir()
            .ok_or_else(|| Error::Config("Could not determine config directory".into()))?;
        let config_path = config_dir.join("shelf").join("config.toml");
        Ok(Self { config_path })
    }

    /// Create a ConfigManager with a custom path (useful for testing)
    pub fn with_path(path: PathBuf) -> Self {
        Self { config_path: path }
    }

    /// Get the configuration file path
    pub fn config_path(&self) -> &PathBuf {
        &self.config_path
    }

    /// Load configuration from disk
    ///
    /// If the configuration file doesn't exist, returns a default configuration.
    /// If the schema version doesn't match, attempts migration.
    pub fn load(&self) -> Result<Config> {
        if !self.config_path.exists() {
            return Ok(Config::default());
        }

        let content = std::fs::read_to_string(&self.config_path)?;
        let mut config: Config = toml::from_str(&content)?;

        if config.schema_version < SCHEMA_VERSION {
            config = self.migrate(config)?;
        } else if config.schema_version > SCHEMA_VERSION {
            return Err(Error::Config(format!(
                "Configuration file version {} is newer than supported version {}. Please upgrade shelf.",
                config.schema_version, SCHEMA_VERSION
            )));
        }

        config.validate()?;
        tracing::debug!(path = %self.config_path.display(), "loaded configuration");
        Ok(config)
    }

    /// Save configuration to disk
    ///
    /// Creates parent directories if they don't exist.
    /// Sets file permissions to 600 (owner read/write only).
    pub fn save(&self, config: &Config) -> Result<()> {
        if let Some(parent) = self.config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(config)?;
        std::fs::write(&self.config_path, content)?;

        // Profiles hold credentials
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let permissions = std::fs::Permissions::from_mode(0o600);
            std::fs::set_permissions(&self.config_path, permissions)?;
        }

        Ok(())
    }

    /// Migrate configuration from older schema version
    fn migrate(&self, config: Config) -> Result<Config> {
        let mut config = config;
        tracing::info!(
            from = config.schema_version,
            to = SCHEMA_VERSION,
            "migrating configuration"
        );
        config.schema_version = SCHEMA_VERSION;
        Ok(config)
    }
}
