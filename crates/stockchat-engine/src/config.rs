//! Configuration types for the chat client.
//!
//! Configuration is a small JSON file. Every field has a default, so a
//! missing file or a partial file both work. The backend URL can be
//! overridden from the environment, which is how a development setup points
//! the client at a different backend without editing the file.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use url::Url;

/// Backend base URL used when nothing else is configured.
pub const DEFAULT_API_URL: &str = "http://localhost:5001";

/// Environment variable that overrides the configured backend URL.
pub const API_URL_ENV: &str = "STOCKCHAT_API_URL";

/// Path of the query endpoint relative to the backend base URL.
pub const QUERY_PATH: &str = "api/query";

/// Path of the CSV upload endpoint relative to the backend base URL.
pub const UPLOAD_PATH: &str = "api/stocks/upload_csv";

/// Main configuration for the chat client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Base URL of the backend serving `/api/query`.
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Log level for the file logger (`error`, `warn`, `info`, `debug`, `trace`).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Where log output is written. The terminal belongs to the TUI.
    #[serde(default = "default_log_file")]
    pub log_file: PathBuf,
}

fn default_api_url() -> String {
    DEFAULT_API_URL.into()
}

fn default_log_level() -> String {
    "info".into()
}

fn default_log_file() -> PathBuf {
    PathBuf::from("stockchat.log")
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            log_level: default_log_level(),
            log_file: default_log_file(),
        }
    }
}

impl Config {
    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::Io)?;
        serde_json::from_str(&content).map_err(ConfigError::Parse)
    }

    /// Save configuration to a file.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = serde_json::to_string_pretty(self).map_err(ConfigError::Serialize)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(ConfigError::Io)?;
        }
        std::fs::write(path, content).map_err(ConfigError::Io)
    }

    /// Load the file if it exists, fall back to defaults otherwise, then
    /// apply the environment override.
    pub fn resolve(path: &Path) -> Result<Self, ConfigError> {
        let config = if path.exists() {
            Self::load(path)?
        } else {
            Self::default()
        };
        Ok(config.with_env_override(std::env::var(API_URL_ENV).ok()))
    }

    /// Replace the backend URL with `value` when it is set and non-blank.
    #[must_use]
    pub fn with_env_override(mut self, value: Option<String>) -> Self {
        if let Some(url) = value.filter(|v| !v.trim().is_empty()) {
            self.api_url = url.trim().to_string();
        }
        self
    }

    /// Replace the backend URL.
    #[must_use]
    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    /// Point the backend URL at a different port.
    pub fn with_port(mut self, port: u16) -> Result<Self, ConfigError> {
        let mut url = self.base_url()?;
        url.set_port(Some(port))
            .map_err(|()| ConfigError::CannotSetPort(self.api_url.clone()))?;
        self.api_url = url.to_string();
        Ok(self)
    }

    /// Parsed backend base URL, always ending in `/` so relative joins keep
    /// any path prefix.
    pub fn base_url(&self) -> Result<Url, ConfigError> {
        let mut raw = self.api_url.trim().to_string();
        if !raw.ends_with('/') {
            raw.push('/');
        }
        let url = Url::parse(&raw).map_err(|source| ConfigError::InvalidUrl {
            url: self.api_url.clone(),
            source,
        })?;
        if url.cannot_be_a_base() {
            return Err(ConfigError::NotABase(self.api_url.clone()));
        }
        Ok(url)
    }

    /// Full URL of the query endpoint.
    pub fn query_endpoint(&self) -> Result<Url, ConfigError> {
        self.endpoint(QUERY_PATH)
    }

    /// Full URL of the CSV upload endpoint.
    pub fn upload_endpoint(&self) -> Result<Url, ConfigError> {
        self.endpoint(UPLOAD_PATH)
    }

    fn endpoint(&self, path: &str) -> Result<Url, ConfigError> {
        let base = self.base_url()?;
        base.join(path).map_err(|source| ConfigError::InvalidUrl {
            url: self.api_url.clone(),
            source,
        })
    }
}

/// Errors that can occur when working with configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// I/O error reading or writing config.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Error parsing config JSON.
    #[error("Parse error: {0}")]
    Parse(#[source] serde_json::Error),

    /// Error serializing config to JSON.
    #[error("Serialize error: {0}")]
    Serialize(#[source] serde_json::Error),

    /// The backend URL does not parse.
    #[error("Invalid API URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    /// The backend URL cannot carry paths (e.g. `mailto:`).
    #[error("API URL '{0}' cannot be used as a base URL")]
    NotABase(String),

    /// The backend URL has no host to attach a port to.
    #[error("Cannot set a port on API URL '{0}'")]
    CannotSetPort(String),
}
