//! Bootstrap configuration loading
//!
//! Settings sources, highest priority first:
//! 1. Command-line arguments (applied by the binary)
//! 2. Environment variables (`HERTZ_CONFIG`, `HERTZ_PORT`, `RUST_LOG`)
//! 3. TOML configuration file
//! 4. Built-in defaults (code constants)
//!
//! A missing configuration file is not fatal: the service logs a warning and
//! starts on defaults. A file that exists but does not parse is an error.

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "HERTZ_CONFIG";

const CONFIG_DIR_NAME: &str = "hertz";
const CONFIG_FILE_NAME: &str = "config.toml";
const SYSTEM_CONFIG_PATH: &str = "/etc/hertz/config.toml";

/// Bootstrap configuration loaded from TOML
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct TomlConfig {
    /// HTTP command surface port
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub playback: PlaybackConfig,

    #[serde(default)]
    pub resolver: ResolverConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error) or a full EnvFilter directive
    #[serde(default = "default_log_level")]
    pub level: String,
}

/// Per-session playback defaults
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct PlaybackConfig {
    /// Volume new sessions start with (0.0-1.0)
    #[serde(default = "default_volume")]
    pub default_volume: f32,

    /// How long a driver may take to acknowledge a start
    #[serde(default = "default_start_timeout_secs")]
    pub start_timeout_secs: u64,

    /// Render length the timed driver assumes when a track reports no duration
    #[serde(default = "default_unknown_duration_secs")]
    pub unknown_duration_secs: u64,

    /// EventBus capacity
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,
}

/// Track resolver settings
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ResolverConfig {
    /// yt-dlp executable (name on PATH or absolute path)
    #[serde(default = "default_yt_dlp_path")]
    pub yt_dlp_path: PathBuf,

    /// Upper bound on one yt-dlp lookup
    #[serde(default = "default_resolve_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_port() -> u16 {
    5750
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_volume() -> f32 {
    0.5
}

fn default_start_timeout_secs() -> u64 {
    15
}

fn default_unknown_duration_secs() -> u64 {
    180
}

fn default_event_capacity() -> usize {
    256
}

fn default_yt_dlp_path() -> PathBuf {
    PathBuf::from("yt-dlp")
}

fn default_resolve_timeout_secs() -> u64 {
    30
}

impl Default for TomlConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            logging: LoggingConfig::default(),
            playback: PlaybackConfig::default(),
            resolver: ResolverConfig::default(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            default_volume: default_volume(),
            start_timeout_secs: default_start_timeout_secs(),
            unknown_duration_secs: default_unknown_duration_secs(),
            event_capacity: default_event_capacity(),
        }
    }
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            yt_dlp_path: default_yt_dlp_path(),
            timeout_secs: default_resolve_timeout_secs(),
        }
    }
}

impl TomlConfig {
    /// Parse configuration from TOML text and validate it
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: TomlConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&content)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))
    }

    /// Resolve and load configuration with graceful degradation
    ///
    /// `cli_path` (from `--config`) wins over the environment, which wins
    /// over the per-user and system locations. An explicitly named file must
    /// exist; an absent default file falls back to built-in defaults.
    pub fn resolve(cli_path: Option<&Path>) -> Result<Self> {
        if let Some(path) = cli_path {
            info!("Loading configuration from {}", path.display());
            return Self::load(path);
        }

        if let Some(path) = std::env::var_os(CONFIG_ENV_VAR).map(PathBuf::from) {
            info!("Loading configuration from {} ({})", path.display(), CONFIG_ENV_VAR);
            return Self::load(&path);
        }

        match locate_config_file() {
            Some(path) => {
                info!("Loading configuration from {}", path.display());
                Self::load(&path)
            }
            None => {
                warn!("No configuration file found, using built-in defaults");
                Ok(Self::default())
            }
        }
    }

    /// Check value ranges that serde cannot express
    pub fn validate(&self) -> Result<()> {
        let volume = self.playback.default_volume;
        if !(0.0..=1.0).contains(&volume) {
            return Err(Error::Config(format!(
                "playback.default_volume must be within 0.0-1.0, got {}",
                volume
            )));
        }
        if self.playback.start_timeout_secs == 0 {
            return Err(Error::Config(
                "playback.start_timeout_secs must be greater than zero".to_string(),
            ));
        }
        if self.playback.event_capacity == 0 {
            return Err(Error::Config(
                "playback.event_capacity must be greater than zero".to_string(),
            ));
        }
        if self.resolver.timeout_secs == 0 {
            return Err(Error::Config(
                "resolver.timeout_secs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Find the first existing default config file for this platform
///
/// Looks at `<config dir>/hertz/config.toml` (e.g. `~/.config/hertz` on
/// Linux), then `/etc/hertz/config.toml` on Unix.
pub fn locate_config_file() -> Option<PathBuf> {
    let user_config = dirs::config_dir().map(|d| d.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME));
    if let Some(path) = user_config {
        if path.exists() {
            return Some(path);
        }
    }

    if cfg!(unix) {
        let system_config = PathBuf::from(SYSTEM_CONFIG_PATH);
        if system_config.exists() {
            return Some(system_config);
        }
    }

    None
}
