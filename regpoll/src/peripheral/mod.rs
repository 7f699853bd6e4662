//! Peripheral drivers.
//!
//! Drivers here talk to a device through an [`I2cDevice`](crate::hw_trait::I2cDevice)
//! handle and know nothing about the bus backend underneath.

pub mod register_device;

pub use register_device::RegisterDevice;
