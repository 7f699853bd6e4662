//! Linux I2C character device backend.
//!
//! Talks to `/dev/i2c-N` with the `I2C_RDWR` ioctl, which submits all
//! segments of a transfer to the adapter as one message list. A write-read is
//! therefore a single bus transaction joined by a repeated start.
//!
//! Pin assignment, pull-ups, glitch filtering and the bus clock belong to the
//! device tree on Linux. [`LinuxI2c::configure`](I2c::configure) checks and
//! logs the requested parameters but cannot change them.

use async_trait::async_trait;
use nix::errno::Errno;
use std::fs::{File, OpenOptions};
use std::io;
use std::os::fd::AsRawFd;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::hw_trait::{BusConfig, I2c, I2cError, Result};
use crate::tracing::prelude::*;

mod ffi {
    /// `i2c_msg.flags` bit marking a read segment
    pub const I2C_M_RD: u16 = 0x0001;

    /// Layout of `struct i2c_msg` from `<linux/i2c.h>`
    #[repr(C)]
    pub struct I2cMsg {
        pub addr: u16,
        pub flags: u16,
        pub len: u16,
        pub buf: *mut u8,
    }

    /// Layout of `struct i2c_rdwr_ioctl_data` from `<linux/i2c-dev.h>`
    #[repr(C)]
    pub struct I2cRdwrData {
        pub msgs: *mut I2cMsg,
        pub nmsgs: u32,
    }

    nix::ioctl_readwrite_bad!(i2c_rdwr, 0x0707, I2cRdwrData);
}

use ffi::{i2c_rdwr, I2cMsg, I2cRdwrData, I2C_M_RD};

/// One direction of a transfer.
struct Segment {
    read: bool,
    data: Vec<u8>,
}

/// I2C master on a Linux adapter.
pub struct LinuxI2c {
    file: Arc<File>,
    path: PathBuf,
    frequency_hz: u32,
}

impl LinuxI2c {
    /// Open the adapter's character device.
    pub fn open(path: &Path) -> Result<Self> {
        let file = OpenOptions::new().read(true).write(true).open(path)?;
        debug!("Opened {}", path.display());
        Ok(Self {
            file: Arc::new(file),
            path: path.to_path_buf(),
            frequency_hz: 0,
        })
    }

    // Run one I2C_RDWR transfer on the blocking pool and hand back the
    // segments, read buffers filled in.
    async fn transfer(&self, addr: u8, segments: Vec<Segment>) -> Result<Vec<Segment>> {
        for segment in &segments {
            if segment.data.len() > u16::MAX as usize {
                return Err(I2cError::Io(io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("segment of {} bytes is too long", segment.data.len()),
                )));
            }
        }

        let file = Arc::clone(&self.file);
        tokio::task::spawn_blocking(move || {
            let mut segments = segments;
            rdwr(&file, addr, &mut segments)
                .map(|()| segments)
                .map_err(|errno| errno_to_error(addr, errno))
        })
        .await
        .map_err(|e| I2cError::Io(io::Error::other(e)))?
    }
}

// Write `write`, then read `read_len` bytes after a repeated start.
fn write_read_segments(write: &[u8], read_len: usize) -> Vec<Segment> {
    vec![
        Segment {
            read: false,
            data: write.to_vec(),
        },
        Segment {
            read: true,
            data: vec![0; read_len],
        },
    ]
}

// Kernel message list for `segments`, in order. Each message borrows its
// segment's buffer.
fn messages(addr: u8, segments: &mut [Segment]) -> Vec<I2cMsg> {
    segments
        .iter_mut()
        .map(|segment| I2cMsg {
            addr: u16::from(addr),
            flags: if segment.read { I2C_M_RD } else { 0 },
            len: segment.data.len() as u16,
            buf: segment.data.as_mut_ptr(),
        })
        .collect()
}

fn rdwr(file: &File, addr: u8, segments: &mut [Segment]) -> nix::Result<()> {
    let mut msgs = messages(addr, segments);
    let mut request = I2cRdwrData {
        msgs: msgs.as_mut_ptr(),
        nmsgs: msgs.len() as u32,
    };

    // SAFETY: every msg points into a live Vec of exactly `len` bytes, and
    // both `msgs` and `segments` outlive the call.
    unsafe { i2c_rdwr(file.as_raw_fd(), &mut request) }?;
    Ok(())
}

/// Map errno values from i2c-dev onto bus errors.
fn errno_to_error(addr: u8, errno: Errno) -> I2cError {
    match errno {
        Errno::ENXIO | Errno::EREMOTEIO => I2cError::NoAck(addr),
        Errno::EAGAIN => I2cError::ArbitrationLost,
        Errno::ETIMEDOUT => I2cError::Timeout,
        other => I2cError::Io(other.into()),
    }
}

#[async_trait]
impl I2c for LinuxI2c {
    async fn write(&mut self, addr: u8, data: &[u8]) -> Result<()> {
        self.transfer(
            addr,
            vec![Segment {
                read: false,
                data: data.to_vec(),
            }],
        )
        .await?;
        Ok(())
    }

    async fn write_read(&mut self, addr: u8, write: &[u8], read: &mut [u8]) -> Result<()> {
        let segments = self
            .transfer(addr, write_read_segments(write, read.len()))
            .await?;
        read.copy_from_slice(&segments[1].data);
        Ok(())
    }

    async fn set_frequency(&mut self, hz: u32) -> Result<()> {
        if self.frequency_hz != 0 && self.frequency_hz != hz {
            debug!(
                "{}: clock change to {} Hz requested; adapter clock is fixed",
                self.path.display(),
                hz
            );
        }
        self.frequency_hz = hz;
        Ok(())
    }

    async fn configure(&mut self, config: &BusConfig) -> Result<()> {
        config.validate()?;
        info!(
            "{}: expecting SDA={} SCL={} at {} Hz, glitch filter {}, pull-ups {} (set by device tree)",
            self.path.display(),
            config.sda_pin,
            config.scl_pin,
            config.frequency_hz,
            config.glitch_ignore_cnt,
            if config.internal_pullup { "on" } else { "off" },
        );
        self.frequency_hz = config.frequency_hz;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn test_open_missing_node() {
        let result = LinuxI2c::open(Path::new("/dev/i2c-does-not-exist"));
        match result {
            Err(I2cError::Io(e)) => assert_eq!(e.kind(), io::ErrorKind::NotFound),
            Err(e) => panic!("unexpected error: {e}"),
            Ok(_) => panic!("opened a missing device node"),
        }
    }

    #[test_case(Errno::ENXIO ; "no device")]
    #[test_case(Errno::EREMOTEIO ; "nack")]
    fn test_nack_errnos(errno: Errno) {
        assert!(matches!(errno_to_error(0x3A, errno), I2cError::NoAck(0x3A)));
    }

    #[test]
    fn test_other_errnos() {
        assert!(matches!(
            errno_to_error(0x3A, Errno::EAGAIN),
            I2cError::ArbitrationLost
        ));
        assert!(matches!(
            errno_to_error(0x3A, Errno::ETIMEDOUT),
            I2cError::Timeout
        ));
        assert!(matches!(
            errno_to_error(0x3A, Errno::EIO),
            I2cError::Io(_)
        ));
    }

    #[test]
    fn test_write_read_message_list() {
        let mut segments = write_read_segments(&[0x00], 4);
        let msgs = messages(0x3A, &mut segments);

        assert_eq!(msgs.len(), 2);

        assert_eq!(msgs[0].addr, 0x3A);
        assert_eq!(msgs[0].flags, 0);
        assert_eq!(msgs[0].len, 1);
        assert_eq!(msgs[0].buf, segments[0].data.as_mut_ptr());

        assert_eq!(msgs[1].addr, 0x3A);
        assert_eq!(msgs[1].flags, I2C_M_RD);
        assert_eq!(msgs[1].len, 4);
        assert_eq!(msgs[1].buf, segments[1].data.as_mut_ptr());

        assert_eq!(segments[0].data, [0x00]);
    }

    #[test]
    fn test_write_message_list() {
        let mut segments = vec![Segment {
            read: false,
            data: vec![0x02, 0x03],
        }];
        let msgs = messages(0x3A, &mut segments);

        assert_eq!(msgs.len(), 1);
        assert_eq!(msgs[0].flags, 0);
        assert_eq!(msgs[0].len, 2);
    }

    #[tokio::test]
    async fn test_configure_on_regular_file() {
        // Any readable and writable node will do for the non-ioctl paths.
        let file = tempfile::NamedTempFile::new().unwrap();
        let mut i2c = LinuxI2c::open(file.path()).unwrap();

        i2c.configure(&BusConfig::default()).await.unwrap();
        assert_eq!(i2c.frequency_hz, 400_000);

        let bad = BusConfig {
            sda_pin: 18,
            ..Default::default()
        };
        assert!(matches!(
            i2c.configure(&bad).await,
            Err(I2cError::InvalidConfig(_))
        ));
    }

    #[tokio::test]
    async fn test_transfer_on_regular_file_fails() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let mut i2c = LinuxI2c::open(file.path()).unwrap();

        // Not an i2c adapter: the ioctl is rejected (ENOTTY).
        let mut buf = [0u8; 4];
        assert!(matches!(
            i2c.write_read(0x3A, &[0x00], &mut buf).await,
            Err(I2cError::Io(_))
        ));
    }
}
