//! Register-mapped I2C peripheral.
//!
//! The device exposes byte-addressed registers. A write sends the register
//! address followed by one value byte. A read sends the register address,
//! then after a repeated start clocks out four bytes.

use crate::hw_trait::{I2cDevice, Result};
use crate::tracing::prelude::*;

/// Width of a register read, in bytes.
pub const READ_LEN: usize = 4;

/// Driver for a register-mapped peripheral.
#[derive(Clone)]
pub struct RegisterDevice {
    i2c: I2cDevice,
}

impl RegisterDevice {
    pub fn new(i2c: I2cDevice) -> Self {
        Self { i2c }
    }

    pub fn address(&self) -> u8 {
        self.i2c.address()
    }

    /// Write a single register.
    pub async fn write_register(&self, reg: u8, value: u8) -> Result<()> {
        match self.i2c.transmit(&[reg, value], None).await {
            Ok(()) => {
                info!("Write OK: Reg 0x{:02X} <= 0x{:02X}", reg, value);
                Ok(())
            }
            Err(e) => {
                error!("Write FAIL: {}", e);
                Err(e)
            }
        }
    }

    /// Read a single register into `data`.
    ///
    /// The register address write and the data read form one transaction.
    /// On failure `data` holds whatever the bus delivered, so callers should
    /// clear it beforehand and trust only the returned status.
    pub async fn read_register(&self, reg: u8, data: &mut [u8; READ_LEN]) -> Result<()> {
        match self.i2c.transmit_receive(&[reg], data, None).await {
            Ok(()) => {
                info!("Read OK: Reg 0x{:02X} => {:02X?}", reg, data);
                Ok(())
            }
            Err(e) => {
                error!("Read FAIL: {}", e);
                Err(e)
            }
        }
    }
}
