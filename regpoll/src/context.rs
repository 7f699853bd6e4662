//! Bus and device initialization.
//!
//! [`Context::init`] is the single startup step: it creates the bus, attaches
//! the polled device to it, and returns both handles in a [`Context`] that is
//! passed by reference to everything that runs afterwards. Nothing is
//! retried; the caller decides whether a failure is fatal.

use thiserror::Error;

use crate::config::Config;
use crate::hw_trait::{I2c, I2cBus, I2cError};
#[cfg(target_os = "linux")]
use crate::transport::i2cdev::LinuxI2c;
use crate::peripheral::RegisterDevice;
use crate::tracing::prelude::*;

/// Initialization failures.
#[derive(Error, Debug)]
pub enum InitError {
    #[error("Failed to create I2C bus {port}: {source}")]
    Bus {
        port: u8,
        #[source]
        source: I2cError,
    },
    #[error("Failed to attach device 0x{address:02X}: {source}")]
    Device {
        address: u8,
        #[source]
        source: I2cError,
    },
}

/// Handles created at startup, live for the rest of the process.
pub struct Context {
    pub bus: I2cBus,
    pub device: RegisterDevice,
}

impl Context {
    /// Create the bus on `driver`, then attach the configured device.
    pub async fn init<D: I2c + 'static>(driver: D, config: &Config) -> Result<Self, InitError> {
        let bus = I2cBus::new(driver, &config.bus)
            .await
            .map_err(|source| InitError::Bus {
                port: config.bus.port,
                source,
            })?;

        let device = bus
            .add_device(&config.device)
            .map_err(|source| InitError::Device {
                address: config.device.address,
                source,
            })?;

        info!("I2C master initialized");
        Ok(Self {
            bus,
            device: RegisterDevice::new(device),
        })
    }

    /// Open the adapter named by `config` and initialize on it.
    #[cfg(target_os = "linux")]
    pub async fn open(config: &Config) -> crate::error::Result<Self> {
        let path = config.i2c_dev_path();
        debug!("Opening {}", path.display());
        let driver = LinuxI2c::open(&path)?;
        Ok(Self::init(driver, config).await?)
    }
}
