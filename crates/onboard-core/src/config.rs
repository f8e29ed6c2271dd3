//! Application configuration
//!
//! Configuration is loaded from:
//! 1. Default values
//! 2. Config file (~/.config/onboard/config.toml)
//! 3. Environment variables (ONBOARD_* prefix)
//!
//! Environment variables take precedence over config file values.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

/// Environment variable prefix
const ENV_PREFIX: &str = "ONBOARD";

/// Form identifier sent with every submission
pub const DEFAULT_FORM_NAME: &str = "caprock-onboarding";

/// Endpoint used when none is configured (local Netlify dev server)
pub const DEFAULT_ENDPOINT_URL: &str = "http://localhost:8888/?no-cache=1";

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Directory for data storage (SQLite store, exports)
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Remote submission endpoint
    #[serde(default = "default_endpoint_url")]
    pub endpoint_url: String,

    /// Value of the `form-name` field on the wire
    #[serde(default = "default_form_name")]
    pub form_name: String,

    /// Quiescence window before an autosave is written
    #[serde(default = "default_autosave_debounce_ms")]
    pub autosave_debounce_ms: u64,

    /// How many records per collection are exploded into indexed wire fields
    #[serde(default = "default_wire_record_limit")]
    pub wire_record_limit: usize,

    /// Per-request timeout; transport default when unset
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,

    /// Connectivity probe interval for `watch`
    #[serde(default = "default_probe_interval_secs")]
    pub probe_interval_secs: u64,

    /// Log level for the CLI (error, warn, info, debug, trace)
    #[serde(default)]
    pub log_level: Option<String>,

    /// Write logs to this file instead of stderr
    #[serde(default)]
    pub log_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            endpoint_url: default_endpoint_url(),
            form_name: default_form_name(),
            autosave_debounce_ms: default_autosave_debounce_ms(),
            wire_record_limit: default_wire_record_limit(),
            request_timeout_secs: None,
            probe_interval_secs: default_probe_interval_secs(),
            log_level: None,
            log_file: None,
        }
    }
}

impl Config {
    /// Load configuration from default location and environment
    ///
    /// Order of precedence (highest to lowest):
    /// 1. Environment variables (ONBOARD_DATA_DIR, ONBOARD_ENDPOINT_URL, ...)
    /// 2. Config file (~/.config/onboard/config.toml or ONBOARD_CONFIG)
    /// 3. Default values
    pub fn load() -> Result<Self> {
        Self::load_from_path(&Self::config_file_path())
    }

    /// Load configuration, preferring an explicit path given on the command line
    pub fn load_with_cli_override(path: Option<&PathBuf>) -> Result<Self> {
        match path {
            Some(path) => Self::load_from_path(path),
            None => Self::load(),
        }
    }

    /// Load configuration from a specific path
    ///
    /// Environment variables are still applied as overrides.
    /// If the file doesn't exist, defaults are used.
    pub fn load_from_path(path: &PathBuf) -> Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {:?}", path))?;
            toml::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {:?}", path))?
        } else {
            Self::default()
        };

        config.apply_env_overrides();
        config.ensure_data_dir()?;
        Ok(config)
    }

    /// Load configuration from a TOML string (useful for testing)
    pub fn load_from_str(toml_content: &str) -> Result<Self> {
        let mut config: Config =
            toml::from_str(toml_content).context("Failed to parse config TOML")?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var(format!("{}_DATA_DIR", ENV_PREFIX)) {
            self.data_dir = PathBuf::from(val);
        }

        if let Ok(val) = std::env::var(format!("{}_ENDPOINT_URL", ENV_PREFIX)) {
            if !val.is_empty() {
                self.endpoint_url = val;
            }
        }

        if let Ok(val) = std::env::var(format!("{}_FORM_NAME", ENV_PREFIX)) {
            if !val.is_empty() {
                self.form_name = val;
            }
        }

        // Unparseable numbers are ignored rather than clobbering the file value
        if let Ok(val) = std::env::var(format!("{}_AUTOSAVE_DEBOUNCE_MS", ENV_PREFIX)) {
            if let Ok(ms) = val.parse() {
                self.autosave_debounce_ms = ms;
            }
        }

        if let Ok(val) = std::env::var(format!("{}_WIRE_RECORD_LIMIT", ENV_PREFIX)) {
            if let Ok(limit) = val.parse() {
                self.wire_record_limit = limit;
            }
        }

        if let Ok(val) = std::env::var(format!("{}_LOG", ENV_PREFIX)) {
            self.log_level = if val.is_empty() { None } else { Some(val) };
        }
    }

    /// Ensure data directory exists
    fn ensure_data_dir(&self) -> Result<()> {
        if !self.data_dir.exists() {
            std::fs::create_dir_all(&self.data_dir)
                .with_context(|| format!("Failed to create data directory: {:?}", self.data_dir))?;
        }
        Ok(())
    }

    /// Set a single key from its string form (used by `config set`)
    pub fn set_value(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "data_dir" => self.data_dir = PathBuf::from(value),
            "endpoint_url" => {
                url::Url::parse(value)
                    .with_context(|| format!("Invalid endpoint URL: {}", value))?;
                self.endpoint_url = value.to_string();
            }
            "form_name" => self.form_name = value.to_string(),
            "autosave_debounce_ms" => {
                self.autosave_debounce_ms = value
                    .parse()
                    .with_context(|| format!("Invalid number of milliseconds: {}", value))?;
            }
            "wire_record_limit" => {
                self.wire_record_limit = value
                    .parse()
                    .with_context(|| format!("Invalid record limit: {}", value))?;
            }
            "request_timeout_secs" => {
                self.request_timeout_secs = if value.is_empty() {
                    None
                } else {
                    Some(
                        value
                            .parse()
                            .with_context(|| format!("Invalid timeout: {}", value))?,
                    )
                };
            }
            "probe_interval_secs" => {
                self.probe_interval_secs = value
                    .parse()
                    .with_context(|| format!("Invalid probe interval: {}", value))?;
            }
            "log_level" => {
                self.log_level = if value.is_empty() {
                    None
                } else {
                    Some(value.to_string())
                };
            }
            "log_file" => {
                self.log_file = if value.is_empty() {
                    None
                } else {
                    Some(PathBuf::from(value))
                };
            }
            _ => bail!(
                "Unknown config key '{}'. Valid keys: data_dir, endpoint_url, form_name, \
                 autosave_debounce_ms, wire_record_limit, request_timeout_secs, \
                 probe_interval_secs, log_level, log_file",
                key
            ),
        }
        Ok(())
    }

    /// Save configuration to the given file
    pub fn save_to(&self, config_path: &PathBuf) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(config_path, content)
            .with_context(|| format!("Failed to write config file: {:?}", config_path))?;
        Ok(())
    }

    /// Get the config file path
    ///
    /// Can be overridden with ONBOARD_CONFIG environment variable
    pub fn config_file_path() -> PathBuf {
        if let Ok(path) = std::env::var(format!("{}_CONFIG", ENV_PREFIX)) {
            return PathBuf::from(path);
        }

        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("onboard")
            .join("config.toml")
    }

    /// Get the path to the SQLite store
    pub fn store_path(&self) -> PathBuf {
        self.data_dir.join("store.db")
    }

    /// Default location for an export written at `millis` since the epoch
    pub fn export_path(&self, millis: i64) -> PathBuf {
        self.data_dir
            .join(format!("{}-export-{}.json", self.form_name, millis))
    }

    pub fn autosave_debounce(&self) -> Duration {
        Duration::from_millis(self.autosave_debounce_ms)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }

    pub fn probe_interval(&self) -> Duration {
        Duration::from_secs(self.probe_interval_secs.max(1))
    }
}

/// Get the default data directory
fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("onboard")
}

fn default_endpoint_url() -> String {
    DEFAULT_ENDPOINT_URL.to_string()
}

fn default_form_name() -> String {
    DEFAULT_FORM_NAME.to_string()
}

fn default_autosave_debounce_ms() -> u64 {
    400
}

fn default_wire_record_limit() -> usize {
    5
}

fn default_probe_interval_secs() -> u64 {
    15
}
