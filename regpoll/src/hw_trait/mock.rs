//! Recording I2C driver for tests.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use super::{BusConfig, I2c, I2cError, Result};

/// I2C transaction type for logging
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum I2cTransaction {
    /// Write transaction
    Write { addr: u8, data: Vec<u8> },
    /// Write-Read transaction
    WriteRead {
        addr: u8,
        write_data: Vec<u8>,
        read_len: usize,
    },
}

#[derive(Default)]
struct MockState {
    transactions: Vec<I2cTransaction>,
    read_data: VecDeque<u8>,
    failures: VecDeque<I2cError>,
    fail_configure: bool,
    config: Option<BusConfig>,
    frequency: u32,
    frequency_changes: usize,
    delay: Option<Duration>,
}

/// Mock I2C driver.
///
/// Records all transactions for test verification and allows pre-programming
/// read data and failures. Clones share state, so a test can keep one clone
/// after handing another to a bus.
#[derive(Clone, Default)]
pub struct MockI2c {
    state: Arc<Mutex<MockState>>,
}

impl MockI2c {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get transaction log
    pub fn transactions(&self) -> Vec<I2cTransaction> {
        self.state.lock().unwrap().transactions.clone()
    }

    /// Queue bytes returned by subsequent reads
    pub fn push_read_data(&self, data: &[u8]) {
        self.state.lock().unwrap().read_data.extend(data);
    }

    /// Make the next transaction fail with `error`
    pub fn fail_next(&self, error: I2cError) {
        self.state.lock().unwrap().failures.push_back(error);
    }

    /// Make `configure` fail
    pub fn fail_configure(&self) {
        self.state.lock().unwrap().fail_configure = true;
    }

    /// Make every transaction take `delay` to complete
    pub fn set_delay(&self, delay: Duration) {
        self.state.lock().unwrap().delay = Some(delay);
    }

    /// Bus parameters applied by `configure`, if any
    pub fn config(&self) -> Option<BusConfig> {
        self.state.lock().unwrap().config.clone()
    }

    pub fn frequency(&self) -> u32 {
        self.state.lock().unwrap().frequency
    }

    /// Number of `set_frequency` calls
    pub fn frequency_changes(&self) -> usize {
        self.state.lock().unwrap().frequency_changes
    }

    // Record a transaction and return the failure queued for it, if any.
    async fn begin(&self, transaction: I2cTransaction) -> Result<()> {
        let delay = {
            let mut state = self.state.lock().unwrap();
            state.transactions.push(transaction);
            state.delay
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        match self.state.lock().unwrap().failures.pop_front() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    fn fill(&self, buffer: &mut [u8]) {
        let mut state = self.state.lock().unwrap();
        let to_read = buffer.len().min(state.read_data.len());
        for (slot, byte) in buffer.iter_mut().zip(state.read_data.drain(..to_read)) {
            *slot = byte;
        }
    }
}

#[async_trait]
impl I2c for MockI2c {
    async fn write(&mut self, addr: u8, data: &[u8]) -> Result<()> {
        self.begin(I2cTransaction::Write {
            addr,
            data: data.to_vec(),
        })
        .await
    }

    async fn write_read(&mut self, addr: u8, write: &[u8], read: &mut [u8]) -> Result<()> {
        self.begin(I2cTransaction::WriteRead {
            addr,
            write_data: write.to_vec(),
            read_len: read.len(),
        })
        .await?;
        self.fill(read);
        Ok(())
    }

    async fn set_frequency(&mut self, hz: u32) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.frequency = hz;
        state.frequency_changes += 1;
        Ok(())
    }

    async fn configure(&mut self, config: &BusConfig) -> Result<()> {
        if self.state.lock().unwrap().fail_configure {
            return Err(I2cError::BusError);
        }
        config.validate()?;
        self.state.lock().unwrap().config = Some(config.clone());
        self.set_frequency(config.frequency_hz).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_i2c_write() {
        let mut i2c = MockI2c::new();
        i2c.write(0x50, &[0x01, 0x02, 0x03]).await.unwrap();

        assert_eq!(
            i2c.transactions(),
            vec![I2cTransaction::Write {
                addr: 0x50,
                data: vec![0x01, 0x02, 0x03]
            }]
        );
    }

    #[tokio::test]
    async fn test_mock_i2c_write_read() {
        let mut i2c = MockI2c::new();
        i2c.push_read_data(&[0x12, 0x34]);

        let mut read_buf = [0u8; 2];
        i2c.write_read(0x52, &[0xA0], &mut read_buf).await.unwrap();

        assert_eq!(read_buf, [0x12, 0x34]);
        assert_eq!(
            i2c.transactions(),
            vec![I2cTransaction::WriteRead {
                addr: 0x52,
                write_data: vec![0xA0],
                read_len: 2
            }]
        );
    }

    #[tokio::test]
    async fn test_mock_i2c_injected_failure_is_one_shot() {
        let mut i2c = MockI2c::new();
        i2c.fail_next(I2cError::NoAck(0x50));

        assert!(matches!(
            i2c.write(0x50, &[0x00]).await,
            Err(I2cError::NoAck(0x50))
        ));
        i2c.write(0x50, &[0x00]).await.unwrap();
        assert_eq!(i2c.transactions().len(), 2);
    }
}
