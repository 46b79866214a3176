//! Service configuration
//!
//! Settings are read from `config.json` in the XDG config directory
//! (`~/.config/gamesvc/` on Linux). A missing file means defaults; command-line
//! flags are applied on top by the CLI.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur when loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file exists but could not be read
    #[error("Failed to read config file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The config file is not valid JSON for `ServiceConfig`
    #[error("Invalid config file {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Runtime settings for the game service client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Base URL of the game service; `None` uses the built-in mock backend
    pub base_url: Option<String>,
    /// How long cached responses are considered fresh
    pub cache_ttl_secs: u64,
    /// Per-request HTTP timeout
    pub request_timeout_secs: u64,
    /// Artificial latency added to every mock backend call
    pub mock_latency_ms: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            cache_ttl_secs: 300,      // 5 minutes
            request_timeout_secs: 10,
            mock_latency_ms: 0,
        }
    }
}

impl ServiceConfig {
    /// Returns the XDG-compliant config file path
    ///
    /// Returns `None` if the config directory cannot be determined (e.g., no home directory).
    pub fn default_path() -> Option<PathBuf> {
        let project_dirs = ProjectDirs::from("", "", "gamesvc")?;
        Some(project_dirs.config_dir().join("config.json"))
    }

    /// Loads configuration from `path`, falling back to defaults if it doesn't exist
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Loads from the default path, or returns defaults when there is none
    pub fn load_default() -> Result<Self, ConfigError> {
        match Self::default_path() {
            Some(path) => Self::load(&path),
            None => Ok(Self::default()),
        }
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn mock_latency(&self) -> Duration {
        Duration::from_millis(self.mock_latency_ms)
    }
}
