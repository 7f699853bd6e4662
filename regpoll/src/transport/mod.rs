//! Physical transport layer for bus connections.
//!
//! This module holds the concrete [`I2c`](crate::hw_trait::I2c)
//! implementations that reach real hardware. They carry no knowledge of the
//! devices on the bus.

#[cfg(target_os = "linux")]
pub mod i2cdev;
