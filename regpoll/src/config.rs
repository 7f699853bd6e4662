//! Configuration management for regpoll.
//!
//! Every setting has a built-in default matching the reference board, so the
//! daemon runs with no configuration at all. A JSON file named by
//! `REGPOLL_CONFIG` replaces the defaults field by field, and
//! `REGPOLL_I2C_DEV` overrides the device node last.

use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::hw_trait::{BusConfig, DeviceConfig};

/// Environment variable naming a JSON configuration file.
pub const CONFIG_ENV: &str = "REGPOLL_CONFIG";

/// Environment variable overriding [`Config::i2c_dev`].
pub const I2C_DEV_ENV: &str = "REGPOLL_I2C_DEV";

/// Main configuration structure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Bus electrical parameters
    pub bus: BusConfig,

    /// The polled peripheral
    pub device: DeviceConfig,

    /// Character device of the bus controller. Defaults to
    /// `/dev/i2c-<bus.port>`.
    pub i2c_dev: Option<PathBuf>,
}

impl Config {
    /// Load configuration from the file in `REGPOLL_CONFIG`, or defaults,
    /// then apply environment overrides.
    pub fn load() -> Result<Self> {
        let mut config = match env::var_os(CONFIG_ENV) {
            Some(path) => Self::load_from(Path::new(&path))?,
            None => Self::default(),
        };

        if let Some(dev) = env::var_os(I2C_DEV_ENV) {
            config.i2c_dev = Some(PathBuf::from(dev));
        }

        Ok(config)
    }

    /// Load configuration from a specific JSON file.
    pub fn load_from(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
        serde_json::from_str(&text)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))
    }

    /// Device node to open for the configured bus.
    pub fn i2c_dev_path(&self) -> PathBuf {
        self.i2c_dev
            .clone()
            .unwrap_or_else(|| PathBuf::from(format!("/dev/i2c-{}", self.bus.port)))
    }
}
