//! Configuration file support for timerfit.
//!
//! Configuration is loaded from `$XDG_CONFIG_HOME/timerfit/config.toml`.

use crate::run::ResumePolicy;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub timer: TimerConfig,

    #[serde(default)]
    pub resume: ResumePolicy,
}

/// Data storage configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

/// Quick-start presets used when a timer command omits its durations
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TimerConfig {
    #[serde(default = "default_fixed_seconds")]
    pub fixed_seconds: u64,

    #[serde(default = "default_work_seconds")]
    pub work_seconds: u64,

    #[serde(default = "default_rest_seconds")]
    pub rest_seconds: u64,

    #[serde(default = "default_rounds")]
    pub rounds: u32,
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            fixed_seconds: default_fixed_seconds(),
            work_seconds: default_work_seconds(),
            rest_seconds: default_rest_seconds(),
            rounds: default_rounds(),
        }
    }
}

// Default value functions
fn default_data_dir() -> PathBuf {
    let base = dirs::data_local_dir().unwrap_or_else(|| {
        std::env::var_os("HOME")
            .map(|home| PathBuf::from(home).join(".local/share"))
            .unwrap_or_else(|| PathBuf::from("."))
    });
    base.join("timerfit")
}

fn default_fixed_seconds() -> u64 {
    60
}

fn default_work_seconds() -> u64 {
    20
}

fn default_rest_seconds() -> u64 {
    10
}

fn default_rounds() -> u32 {
    8
}

impl Config {
    /// Load configuration from the standard config path
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path();
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            tracing::debug!(
                "No config file found at {:?}, using defaults",
                config_path
            );
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        tracing::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Reject presets the timer engine would refuse to run
    pub fn validate(&self) -> Result<()> {
        if self.timer.fixed_seconds == 0 {
            return Err(Error::Config("timer.fixed_seconds must be positive".into()));
        }
        if self.timer.work_seconds == 0 {
            return Err(Error::Config("timer.work_seconds must be positive".into()));
        }
        if self.timer.rounds == 0 {
            return Err(Error::Config("timer.rounds must be at least 1".into()));
        }
        Ok(())
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        let base = dirs::config_dir().unwrap_or_else(|| {
            std::env::var_os("HOME")
                .map(|home| PathBuf::from(home).join(".config"))
                .unwrap_or_else(|| PathBuf::from("."))
        });
        base.join("timerfit").join("config.toml")
    }

    /// Save the current configuration to the default path
    pub fn save(&self) -> Result<()> {
        let config_path = Self::default_config_path();
        self.save_to(&config_path)
    }

    /// Save the current configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, contents)?;
        tracing::info!("Saved config to {:?}", path);
        Ok(())
    }
}
