//! Configuration loading and music folder resolution
//!
//! Resolution follows a fixed priority order:
//! 1. Command-line argument (highest priority, applied by the binary)
//! 2. Environment variable (applied by the binary via clap)
//! 3. TOML config file
//! 4. Compiled default (fallback)

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Default command endpoint.
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:2806";

/// Default idle-poll interval in milliseconds.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 500;

/// Daemon configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Address the command server binds to
    pub bind_addr: String,

    /// Root folder scanned for tracks at startup
    pub music_dir: PathBuf,

    /// Shuffle the playlist once after scanning
    pub shuffle: bool,

    /// Idle-poll interval for track-completion detection (milliseconds)
    pub poll_interval_ms: u64,

    /// Optional read timeout for the command connection (seconds).
    /// Off by default: a stalled client then holds the connection slot
    /// until it disconnects.
    pub client_read_timeout_secs: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            music_dir: default_music_dir(),
            shuffle: true,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            client_read_timeout_secs: None,
        }
    }
}

impl Config {
    /// Load configuration from an explicit file, from the platform config
    /// file locations, or fall back to compiled defaults when no file exists.
    ///
    /// An explicit path that cannot be read or parsed is an error; a missing
    /// default-location file is not.
    pub fn load(explicit: Option<&Path>) -> Result<Config> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }
        match default_config_file() {
            Some(path) => Self::from_file(&path),
            None => Ok(Config::default()),
        }
    }

    fn from_file(path: &Path) -> Result<Config> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read {}: {}", path.display(), e)))?;
        toml::from_str(&raw)
            .map_err(|e| Error::Config(format!("failed to parse {}: {}", path.display(), e)))
    }
}

/// Locate the platform config file, if one exists.
///
/// Tries `<config dir>/phonod/config.toml` first, then `/etc/phonod/config.toml`
/// on Linux.
fn default_config_file() -> Option<PathBuf> {
    if let Some(path) = dirs::config_dir().map(|d| d.join("phonod").join("config.toml")) {
        if path.exists() {
            return Some(path);
        }
    }
    if cfg!(target_os = "linux") {
        let system = PathBuf::from("/etc/phonod/config.toml");
        if system.exists() {
            return Some(system);
        }
    }
    None
}

/// OS-dependent default music folder
fn default_music_dir() -> PathBuf {
    dirs::audio_dir()
        .or_else(|| dirs::home_dir().map(|d| d.join("Music")))
        .unwrap_or_else(|| PathBuf::from("."))
}
