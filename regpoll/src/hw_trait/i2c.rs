//! I2C hardware abstraction trait.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::Result;

/// Highest glitch filter threshold, in source clock cycles, that a bus
/// controller is expected to support.
pub const MAX_GLITCH_IGNORE_CNT: u8 = 7;

/// I2C-specific errors
#[derive(Debug, thiserror::Error)]
pub enum I2cError {
    /// No acknowledgment from device
    #[error("No acknowledgment from device at address 0x{0:02x}")]
    NoAck(u8),

    /// Bus arbitration lost
    #[error("Bus arbitration lost")]
    ArbitrationLost,

    /// Bus error
    #[error("Bus error")]
    BusError,

    /// Transaction did not complete in time
    #[error("Transaction timed out")]
    Timeout,

    /// Address outside the usable 7-bit range
    #[error("Invalid 7-bit device address 0x{0:02x}")]
    InvalidAddress(u8),

    /// Bus or device parameters rejected
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Errors from the underlying device node
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Electrical and timing parameters of an I2C master bus.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct BusConfig {
    /// Controller (port) number
    pub port: u8,
    /// Data line GPIO
    pub sda_pin: u8,
    /// Clock line GPIO
    pub scl_pin: u8,
    /// Bus clock in Hz
    pub frequency_hz: u32,
    /// Pulses shorter than this many source clock cycles are ignored
    pub glitch_ignore_cnt: u8,
    /// Enable the controller's internal pull-ups on SDA and SCL
    pub internal_pullup: bool,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            port: 0,
            sda_pin: 19,
            scl_pin: 18,
            frequency_hz: 400_000,
            glitch_ignore_cnt: 7,
            internal_pullup: true,
        }
    }
}

impl BusConfig {
    /// Check that the parameters describe a usable bus.
    pub fn validate(&self) -> Result<()> {
        if self.sda_pin == self.scl_pin {
            return Err(I2cError::InvalidConfig(format!(
                "SDA and SCL share pin {}",
                self.sda_pin
            )));
        }
        if self.frequency_hz == 0 {
            return Err(I2cError::InvalidConfig("bus frequency is zero".into()));
        }
        if self.glitch_ignore_cnt > MAX_GLITCH_IGNORE_CNT {
            return Err(I2cError::InvalidConfig(format!(
                "glitch filter threshold {} exceeds {}",
                self.glitch_ignore_cnt, MAX_GLITCH_IGNORE_CNT
            )));
        }
        Ok(())
    }
}

/// Binding of a peripheral to a bus.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct DeviceConfig {
    /// 7-bit device address
    pub address: u8,
    /// SCL speed used when talking to this device, in Hz
    pub scl_speed_hz: u32,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            address: 0x3A,
            scl_speed_hz: 400_000,
        }
    }
}

impl DeviceConfig {
    /// Check the address against the 7-bit range, excluding the reserved
    /// blocks 0x00-0x07 and 0x78-0x7F.
    pub fn validate(&self) -> Result<()> {
        if !(0x08..=0x77).contains(&self.address) {
            return Err(I2cError::InvalidAddress(self.address));
        }
        if self.scl_speed_hz == 0 {
            return Err(I2cError::InvalidConfig("device SCL speed is zero".into()));
        }
        Ok(())
    }
}

/// I2C bus abstraction
#[async_trait]
pub trait I2c: Send + Sync {
    /// Write data to an I2C device.
    async fn write(&mut self, addr: u8, data: &[u8]) -> Result<()>;

    /// Write data then read from an I2C device (repeated start).
    async fn write_read(&mut self, addr: u8, write: &[u8], read: &mut [u8]) -> Result<()>;

    /// Set the I2C bus frequency in Hz.
    async fn set_frequency(&mut self, hz: u32) -> Result<()>;

    /// Apply bus parameters before first use.
    async fn configure(&mut self, config: &BusConfig) -> Result<()> {
        config.validate()?;
        self.set_frequency(config.frequency_hz).await
    }
}
