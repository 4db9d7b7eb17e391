//! Environment configuration
//!
//! Settings that do not belong on the command line (the maps API key, the cache
//! location and the HTTP timeout) come from the environment, optionally seeded
//! from a `.env` file.

use std::env;
use std::num::ParseIntError;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use thiserror::Error;

/// Maps API key
pub const API_KEY_VAR: &str = "GOOGLE_MAPS_KEY";

/// Overrides the cache directory
pub const CACHE_DIR_VAR: &str = "APTSCOUT_CACHE_DIR";

/// HTTP timeout in whole seconds
pub const HTTP_TIMEOUT_VAR: &str = "APTSCOUT_HTTP_TIMEOUT_SECS";

const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/// Cache directory used when no other location is available
const FALLBACK_CACHE_DIR: &str = "cache";

/// Errors that can occur while reading the environment
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The timeout variable is not a whole number of seconds
    #[error("APTSCOUT_HTTP_TIMEOUT_SECS must be a whole number of seconds, got '{value}': {source}")]
    InvalidTimeout { value: String, source: ParseIntError },
}

/// Application configuration loaded from environment variables
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Maps API key; `None` puts the maps side in dry-run mode
    pub api_key: Option<String>,
    pub cache_dir: Option<PathBuf>,
    pub http_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            cache_dir: None,
            http_timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
        }
    }
}

impl Config {
    /// Loads configuration from the process environment
    ///
    /// A `.env` file in the working directory is read first if present.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds configuration from an arbitrary variable lookup
    ///
    /// Empty values are treated as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let http_timeout = match get(HTTP_TIMEOUT_VAR) {
            Some(value) => {
                let secs = value
                    .trim()
                    .parse()
                    .map_err(|source| ConfigError::InvalidTimeout {
                        value: value.clone(),
                        source,
                    })?;
                Duration::from_secs(secs)
            }
            None => Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
        };

        Ok(Self {
            api_key: get(API_KEY_VAR),
            cache_dir: get(CACHE_DIR_VAR).map(PathBuf::from),
            http_timeout,
        })
    }

    /// Picks the cache directory
    ///
    /// # Behavior
    /// Uses the first of: `cli_override`, the environment override, the
    /// platform cache directory, `./cache`.
    pub fn resolve_cache_dir(&self, cli_override: Option<&Path>) -> PathBuf {
        cli_override
            .map(Path::to_path_buf)
            .or_else(|| self.cache_dir.clone())
            .or_else(|| ProjectDirs::from("", "", "aptscout").map(|dirs| dirs.cache_dir().to_path_buf()))
            .unwrap_or_else(|| PathBuf::from(FALLBACK_CACHE_DIR))
    }
}
