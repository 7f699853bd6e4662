//! Hardware abstraction layer traits.
//!
//! This module defines the I2C interface trait that lets the register driver
//! work with different underlying implementations, whether the Linux
//! `/dev/i2c-N` character device or a recording mock in tests, plus the bus
//! and device handles built on top of it.

pub mod bus;
pub mod i2c;

#[cfg(test)]
pub mod mock;

pub use bus::{I2cBus, I2cDevice};
pub use i2c::{BusConfig, DeviceConfig, I2c, I2cError};

/// Convenience type alias for Results of hardware operations.
pub type Result<T> = std::result::Result<T, I2cError>;
