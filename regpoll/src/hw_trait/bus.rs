//! Shared I2C bus and per-device handles.
//!
//! An [`I2cBus`] owns a configured driver behind a lock. Devices are attached
//! with [`I2cBus::add_device`], which is the only way to obtain an
//! [`I2cDevice`], so a device handle always refers to a bus that was created
//! successfully. Each transaction holds the bus lock for its whole duration,
//! which keeps a combined write-read atomic with respect to other users of
//! the same bus.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time;

use super::{BusConfig, DeviceConfig, I2c, I2cError, Result};
use crate::tracing::prelude::*;

struct BusInner {
    driver: Box<dyn I2c>,
    frequency_hz: u32,
}

impl BusInner {
    // Switch the bus clock to the speed a device was attached with.
    async fn select_speed(&mut self, hz: u32) -> Result<()> {
        if self.frequency_hz != hz {
            trace!("Switching bus clock {} Hz -> {} Hz", self.frequency_hz, hz);
            self.driver.set_frequency(hz).await?;
            self.frequency_hz = hz;
        }
        Ok(())
    }
}

/// Handle to an initialized I2C master bus.
///
/// Cloning the handle shares the same underlying driver.
#[derive(Clone)]
pub struct I2cBus {
    inner: Arc<Mutex<BusInner>>,
    port: u8,
}

impl I2cBus {
    /// Apply `config` to `driver` and take ownership of it.
    pub async fn new<D: I2c + 'static>(mut driver: D, config: &BusConfig) -> Result<Self> {
        driver.configure(config).await?;
        debug!(
            "I2C bus {} up: SDA={} SCL={} {} Hz, glitch filter {}, pull-ups {}",
            config.port,
            config.sda_pin,
            config.scl_pin,
            config.frequency_hz,
            config.glitch_ignore_cnt,
            if config.internal_pullup { "on" } else { "off" },
        );

        Ok(Self {
            inner: Arc::new(Mutex::new(BusInner {
                driver: Box::new(driver),
                frequency_hz: config.frequency_hz,
            })),
            port: config.port,
        })
    }

    /// Controller number this bus was created on.
    pub fn port(&self) -> u8 {
        self.port
    }

    /// Attach a device at a fixed address and clock speed.
    pub fn add_device(&self, config: &DeviceConfig) -> Result<I2cDevice> {
        config.validate()?;
        debug!(
            "Attached device 0x{:02X} at {} Hz to bus {}",
            config.address, config.scl_speed_hz, self.port
        );
        Ok(I2cDevice {
            bus: self.clone(),
            address: config.address,
            scl_speed_hz: config.scl_speed_hz,
        })
    }
}

/// Handle binding a device address and SCL speed to an [`I2cBus`].
#[derive(Clone)]
pub struct I2cDevice {
    bus: I2cBus,
    address: u8,
    scl_speed_hz: u32,
}

impl I2cDevice {
    pub fn address(&self) -> u8 {
        self.address
    }

    /// Write `data` to the device in one transaction.
    ///
    /// `timeout` of `None` waits for the transaction indefinitely.
    pub async fn transmit(&self, data: &[u8], timeout: Option<Duration>) -> Result<()> {
        with_timeout(timeout, async {
            let mut bus = self.bus.inner.lock().await;
            bus.select_speed(self.scl_speed_hz).await?;
            bus.driver.write(self.address, data).await
        })
        .await
    }

    /// Write `write` then read `read.len()` bytes, joined by a repeated
    /// start so no other transaction can interleave.
    ///
    /// `timeout` of `None` waits for the transaction indefinitely.
    pub async fn transmit_receive(
        &self,
        write: &[u8],
        read: &mut [u8],
        timeout: Option<Duration>,
    ) -> Result<()> {
        with_timeout(timeout, async {
            let mut bus = self.bus.inner.lock().await;
            bus.select_speed(self.scl_speed_hz).await?;
            bus.driver.write_read(self.address, write, read).await
        })
        .await
    }
}

async fn with_timeout<T>(
    timeout: Option<Duration>,
    transaction: impl Future<Output = Result<T>>,
) -> Result<T> {
    match timeout {
        None => transaction.await,
        Some(limit) => time::timeout(limit, transaction)
            .await
            .map_err(|_| I2cError::Timeout)?,
    }
}
