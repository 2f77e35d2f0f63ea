use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use serde::{Deserialize, Serialize};

use crate::serial::interface::{BAUD_RATE, DEFAULT_DEVICE_PATH, INIT_COMMAND, READ_TIMEOUT};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Runtime settings, loaded from TOML. Every field has a default.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub serial: SerialConfig,
    pub icon: IconConfig,
    pub display: DisplayConfig,
    pub reconnect: ReconnectConfig,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SerialConfig {
    #[serde(default = "SerialConfig::default_device_path")]
    pub device_path: String,
    #[serde(default = "SerialConfig::default_baud_rate")]
    pub baud_rate: u32,
    #[serde(default = "SerialConfig::default_read_timeout_ms")]
    pub read_timeout_ms: u64,
    /// Sent once after every successful open
    #[serde(default = "SerialConfig::default_init_command")]
    pub init_command: String,
}

impl SerialConfig {
    fn default_device_path() -> String {
        DEFAULT_DEVICE_PATH.to_string()
    }
    fn default_baud_rate() -> u32 {
        BAUD_RATE
    }
    fn default_read_timeout_ms() -> u64 {
        READ_TIMEOUT.as_millis() as u64
    }
    fn default_init_command() -> String {
        String::from_utf8_lossy(INIT_COMMAND).into_owned()
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            device_path: Self::default_device_path(),
            baud_rate: Self::default_baud_rate(),
            read_timeout_ms: Self::default_read_timeout_ms(),
            init_command: Self::default_init_command(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct IconConfig {
    #[serde(default = "IconConfig::default_path")]
    pub path: PathBuf,
}

impl IconConfig {
    fn default_path() -> PathBuf {
        PathBuf::from("battery_icon.png")
    }
}

impl Default for IconConfig {
    fn default() -> Self {
        Self { path: Self::default_path() }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DisplayConfig {
    #[serde(default = "DisplayConfig::default_refresh_interval_ms")]
    pub refresh_interval_ms: u64,
}

impl DisplayConfig {
    fn default_refresh_interval_ms() -> u64 {
        1000
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.refresh_interval_ms)
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self { refresh_interval_ms: Self::default_refresh_interval_ms() }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReconnectConfig {
    #[serde(default = "ReconnectConfig::default_initial_delay_ms")]
    pub initial_delay_ms: u64,
    #[serde(default = "ReconnectConfig::default_max_delay_ms")]
    pub max_delay_ms: u64,
}

impl ReconnectConfig {
    fn default_initial_delay_ms() -> u64 {
        500
    }
    fn default_max_delay_ms() -> u64 {
        30_000
    }
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            initial_delay_ms: Self::default_initial_delay_ms(),
            max_delay_ms: Self::default_max_delay_ms(),
        }
    }
}

impl Config {
    /// Load from `path`, or use defaults when no path is given
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let txt = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let cfg = Self::from_toml(&txt)?;
        log::info!("Loaded config from {}", path.display());
        Ok(cfg)
    }

    pub fn from_toml(txt: &str) -> Result<Self> {
        let mut cfg: Config = toml::from_str(txt)?;
        cfg.sanitize();
        Ok(cfg)
    }

    /// Replace zero/empty values that would stall the pipeline
    fn sanitize(&mut self) {
        if self.serial.device_path.trim().is_empty() {
            self.serial.device_path = SerialConfig::default_device_path();
        }
        if self.serial.baud_rate == 0 {
            self.serial.baud_rate = SerialConfig::default_baud_rate();
        }
        if self.serial.read_timeout_ms == 0 {
            self.serial.read_timeout_ms = SerialConfig::default_read_timeout_ms();
        }
        if self.display.refresh_interval_ms == 0 {
            self.display.refresh_interval_ms = DisplayConfig::default_refresh_interval_ms();
        }
        if self.reconnect.initial_delay_ms == 0 {
            self.reconnect.initial_delay_ms = ReconnectConfig::default_initial_delay_ms();
        }
        if self.reconnect.max_delay_ms < self.reconnect.initial_delay_ms {
            self.reconnect.max_delay_ms = self.reconnect.initial_delay_ms;
        }
    }
}
