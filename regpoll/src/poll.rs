//! Register poll loop.
//!
//! Walks [`SEQUENCE`] forever: fixed delays interleaved with register reads
//! and writes against the device in the [`Context`]. Access failures are
//! already logged by the driver and do not interrupt the sequence.

use std::time::Duration;
use tokio::time;
use tokio_util::sync::CancellationToken;

use crate::context::Context;
use crate::peripheral::register_device::{RegisterDevice, READ_LEN};
use crate::tracing::prelude::*;

/// A register access against the polled device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Read a register into a cleared buffer
    Read(u8),
    /// Write a value to a register
    Write(u8, u8),
}

/// One step of the poll sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Suspend the task
    Delay(Duration),
    Access(Access),
}

/// The poll sequence, repeated without end.
pub const SEQUENCE: [Step; 9] = [
    Step::Delay(Duration::from_secs(3)),
    // Device identifier
    Step::Access(Access::Read(0x00)),
    Step::Delay(Duration::from_secs(3)),
    Step::Access(Access::Write(0x02, 0x03)),
    Step::Delay(Duration::from_secs(1)),
    Step::Access(Access::Write(0x03, 0x04)),
    Step::Delay(Duration::from_secs(3)),
    Step::Access(Access::Read(0x01)),
    Step::Delay(Duration::from_secs(3)),
];

/// Task entry point, owning the context for the life of the process.
pub async fn task(ctx: Context, running: CancellationToken) {
    trace!("Task started.");
    run(&ctx, &running).await;
    trace!("Task stopped.");
}

/// Run the poll sequence until `running` is cancelled.
///
/// Cancellation is only observed while waiting, so a register access in
/// progress always completes.
pub async fn run(ctx: &Context, running: &CancellationToken) {
    let mut value = [0u8; READ_LEN];

    for step in SEQUENCE.iter().cycle() {
        match *step {
            Step::Delay(duration) => {
                tokio::select! {
                    _ = time::sleep(duration) => {},
                    _ = running.cancelled() => break,
                }
            }
            Step::Access(access) => {
                // Failures are logged by the driver; the sequence goes on.
                let _ = perform(&ctx.device, access, &mut value).await;
            }
        }
    }
}

/// Perform one register access.
///
/// The read buffer is cleared first, so after a failed read it never holds
/// data from an earlier one.
pub async fn perform(
    device: &RegisterDevice,
    access: Access,
    value: &mut [u8; READ_LEN],
) -> crate::hw_trait::Result<()> {
    match access {
        Access::Read(reg) => {
            value.fill(0);
            device.read_register(reg, value).await
        }
        Access::Write(reg, data) => device.write_register(reg, data).await,
    }
}
