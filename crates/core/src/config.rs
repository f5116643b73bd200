//! Configuration file handling
//!
//! Every field is optional; a missing file or a missing table falls back to
//! the defaults below.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_POLL_INTERVAL_MS: u64 = 500;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Which Linux backend to use
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinuxBackend {
    /// D-Bus inside a sandbox, playerctl otherwise
    #[default]
    Auto,
    Playerctl,
    Dbus,
}

impl LinuxBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            LinuxBackend::Auto => "auto",
            LinuxBackend::Playerctl => "playerctl",
            LinuxBackend::Dbus => "dbus",
        }
    }
}

/// Error type for invalid backend strings
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("invalid linux backend `{0}` (expected auto, playerctl or dbus)")]
pub struct ParseBackendError(String);

impl FromStr for LinuxBackend {
    type Err = ParseBackendError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "auto" => Ok(LinuxBackend::Auto),
            "playerctl" => Ok(LinuxBackend::Playerctl),
            "dbus" => Ok(LinuxBackend::Dbus),
            _ => Err(ParseBackendError(s.to_string())),
        }
    }
}

/// Settings for the background listener
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListenerConfig {
    pub poll_interval_ms: u64,
    pub linux_backend: LinuxBackend,
    /// macOS apps queried in priority order
    pub mac_players: Vec<String>,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            linux_backend: LinuxBackend::Auto,
            mac_players: vec!["Spotify".to_string(), "Music".to_string()],
        }
    }
}

impl ListenerConfig {
    /// Poll interval, never shorter than 50ms
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(50))
    }
}

/// Settings for the on-screen notification
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToastConfig {
    pub display_ms: u64,
    pub fade_out_ms: u64,
    pub title_max_chars: usize,
    pub artist_max_chars: usize,
}

impl Default for ToastConfig {
    fn default() -> Self {
        Self {
            display_ms: 5000,
            fade_out_ms: 600,
            title_max_chars: 25,
            artist_max_chars: 30,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub listener: ListenerConfig,
    pub toast: ToastConfig,
}

impl Config {
    pub fn from_toml(path: &Path, text: &str) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load a config file, failing if it does not exist
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(path, &text)
    }

    /// Load a config file, or defaults when it does not exist
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::debug!("No config file at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        Self::load(path)
    }
}
