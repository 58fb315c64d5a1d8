//! Optional JSON configuration
//!
//! ```json
//! {
//!   "store_path": "class.bin",
//!   "default_extension": "bin",
//!   "sync_writes": true,
//!   "log_level": "warn"
//! }
//! ```
//!
//! Every field is optional. Without `--config` the defaults apply.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::errors::{CliError, CliResult};
use crate::observability::Severity;
use crate::store::StoreOptions;

/// Configuration file structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Store used when a command has no `--file` (optional)
    #[serde(default)]
    pub store_path: Option<String>,

    /// Extension `create` appends when missing (default "bin")
    #[serde(default = "default_extension")]
    pub default_extension: String,

    /// fsync after every write (default true)
    #[serde(default = "default_sync_writes")]
    pub sync_writes: bool,

    /// Minimum log severity (default "warn")
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_extension() -> String {
    "bin".to_string()
}
fn default_sync_writes() -> bool {
    true
}
fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store_path: None,
            default_extension: default_extension(),
            sync_writes: default_sync_writes(),
            log_level: default_log_level(),
        }
    }
}

impl Config {
    /// Load configuration from file
    pub fn load(path: &Path) -> CliResult<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| CliError::config_error(format!("Failed to read config: {}", e)))?;

        Self::from_json(&content)
    }

    /// Parse and validate configuration text
    pub fn from_json(content: &str) -> CliResult<Self> {
        let config: Config = serde_json::from_str(content)
            .map_err(|e| CliError::config_error(format!("Invalid config JSON: {}", e)))?;

        config.validate()?;

        Ok(config)
    }

    /// Load from `path` when given, defaults otherwise
    pub fn load_or_default(path: Option<&Path>) -> CliResult<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    fn validate(&self) -> CliResult<()> {
        let extension = self.default_extension.trim_start_matches('.');
        if extension.is_empty() {
            return Err(CliError::config_error("default_extension must not be empty"));
        }
        if extension.contains(|c: char| c == '/' || c == '\\') {
            return Err(CliError::config_error(format!(
                "Invalid default_extension: '{}'",
                self.default_extension
            )));
        }

        if Severity::parse(&self.log_level).is_none() {
            return Err(CliError::config_error(format!(
                "Invalid log_level: '{}'. Must be one of trace, info, warn, error, fatal.",
                self.log_level
            )));
        }

        if let Some(ref store_path) = self.store_path {
            if store_path.is_empty() {
                return Err(CliError::config_error("store_path must not be empty"));
            }
        }

        Ok(())
    }

    /// Minimum log severity
    pub fn severity(&self) -> Severity {
        Severity::parse(&self.log_level).unwrap_or(Severity::Warn)
    }

    /// Options handed to every store
    pub fn store_options(&self) -> StoreOptions {
        StoreOptions {
            sync_writes: self.sync_writes,
        }
    }

    /// Append the default extension to `name` unless it already ends with it
    pub fn with_extension(&self, name: &str) -> PathBuf {
        let suffix = format!(".{}", self.default_extension.trim_start_matches('.'));
        if name.ends_with(&suffix) {
            PathBuf::from(name)
        } else {
            PathBuf::from(format!("{}{}", name, suffix))
        }
    }

    /// Pick the store file: explicit flag first, then `store_path`
    pub fn resolve_store(&self, file: Option<&Path>) -> CliResult<PathBuf> {
        file.map(Path::to_path_buf)
            .or_else(|| self.store_path.as_ref().map(PathBuf::from))
            .ok_or(CliError::NoStorePath)
    }
}
