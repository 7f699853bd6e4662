//! Register polling daemon.
//!
//! Opens the configured Linux I2C adapter, attaches the peripheral and runs
//! the poll loop until SIGINT or SIGTERM.

use std::process::ExitCode;

use tokio::signal::unix::{self, SignalKind};
use tokio_util::{sync::CancellationToken, task::TaskTracker};

use regpoll::config::Config;
use regpoll::context::Context;
use regpoll::poll;
use regpoll::tracing::{self, prelude::*};

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    tracing::init_journald_or_stdout();

    let config = Config::load()?;

    let ctx = match Context::open(&config).await {
        Ok(ctx) => ctx,
        Err(e) => {
            error!("{}: {}", config.i2c_dev_path().display(), e);
            return Ok(ExitCode::FAILURE);
        }
    };

    let running = CancellationToken::new();
    let tracker = TaskTracker::new();
    tracker.spawn(poll::task(ctx, running.clone()));
    tracker.close();
    info!("Started.");

    let mut sigint = unix::signal(SignalKind::interrupt())?;
    let mut sigterm = unix::signal(SignalKind::terminate())?;
    tokio::select! {
        _ = sigint.recv() => {},
        _ = sigterm.recv() => {},
    }

    trace!("Shutting down.");
    running.cancel();

    tracker.wait().await;
    info!("Exiting.");
    Ok(ExitCode::SUCCESS)
}
