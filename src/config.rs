use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::game::{Surface, DEFAULT_HEIGHT, DEFAULT_WIDTH, MAX_SURFACE_SIZE, MIN_SURFACE_SIZE};

pub const CONFIG_ENV_VAR: &str = "BLOCKFALL_CONFIG";

// Used when no platform config directory is available
const FALLBACK_CONFIG_PATH: &str = "config/blockfall.toml";

const DEFAULT_TICK_MS: u64 = 90;
const DEFAULT_LOG_FILE: &str = "blockfall.log";
const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to write config file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("surface {width}x{height} is out of range, both sides must be within {min}..={max}")]
    InvalidSurface {
        width: i16,
        height: i16,
        min: i16,
        max: i16,
    },
    #[error("tick_ms must be greater than zero")]
    InvalidTick,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub width: i16,
    pub height: i16,
    pub tick_ms: u64,
    pub seed: Option<u64>,
    pub log_file: PathBuf,
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            tick_ms: DEFAULT_TICK_MS,
            seed: None,
            log_file: PathBuf::from(DEFAULT_LOG_FILE),
            log_level: DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}

impl Config {
    pub fn surface(&self) -> Surface {
        Surface::new(self.width, self.height)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let allowed = MIN_SURFACE_SIZE..=MAX_SURFACE_SIZE;
        if !allowed.contains(&self.width) || !allowed.contains(&self.height) {
            return Err(ConfigError::InvalidSurface {
                width: self.width,
                height: self.height,
                min: MIN_SURFACE_SIZE,
                max: MAX_SURFACE_SIZE,
            });
        }
        if self.tick_ms == 0 {
            return Err(ConfigError::InvalidTick);
        }
        Ok(())
    }

    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }
}

/// Loads the config from `path`. A missing file yields the defaults.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        return Ok(Config::default());
    }
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Config::from_toml(&contents)
}

/// Writes `config` to `path`, creating parent directories as needed.
pub fn save_config_to(path: &Path, config: &Config) -> Result<(), ConfigError> {
    let write_err = |source| ConfigError::Write {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent).map_err(write_err)?;
        }
    }
    fs::write(path, config.to_toml()?).map_err(write_err)
}

pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_file_path())
}

pub fn config_file_path() -> PathBuf {
    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        return PathBuf::from(path);
    }

    if let Some(config_dir) = dirs::config_dir() {
        config_dir.join("blockfall").join("config.toml")
    } else {
        PathBuf::from(FALLBACK_CONFIG_PATH)
    }
}
