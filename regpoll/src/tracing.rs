//! Logging setup for the daemon.
//!
//! Call [`init_journald_or_stdout`] once at startup to install a subscriber.
//! Everything else uses `use crate::tracing::prelude::*` to reach the
//! `trace!()` through `error!()` macros.

use std::env;
use time::{format_description::BorrowedFormatItem, OffsetDateTime};
use tracing_subscriber::{
    filter::{EnvFilter, LevelFilter},
    fmt::{format::Writer, time::FormatTime},
    prelude::*,
};

pub mod prelude {
    #[allow(unused_imports)]
    pub use tracing::{debug, error, info, trace, warn};
}

use prelude::*;

/// Initialize logging.
///
/// Under systemd (`JOURNAL_STREAM` set) events go to journald; otherwise, or
/// if journald is unreachable, to stdout.
pub fn init_journald_or_stdout() {
    if env::var("JOURNAL_STREAM").is_ok() {
        match tracing_journald::layer() {
            Ok(layer) => tracing_subscriber::registry().with(layer).init(),
            Err(e) => {
                use_stdout();
                error!("Failed to initialize journald logging ({e}), using stdout.");
            }
        }
    } else {
        use_stdout();
    }
}

// Log to stdout filtered by RUST_LOG, defaulting to INFO so every register
// access result is visible.
fn use_stdout() {
    let env_filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .with_env_var("RUST_LOG")
        .from_env_lossy();

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_timer(LocalTimer))
        .init();
}

const TIMESTAMP: &[BorrowedFormatItem<'static>] =
    time::macros::format_description!("[hour]:[minute]:[second]");

// Local wall-clock time to the nearest second.
struct LocalTimer;

impl FormatTime for LocalTimer {
    fn format_time(&self, w: &mut Writer<'_>) -> std::fmt::Result {
        let now = OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc());
        let stamp = now.format(TIMESTAMP).map_err(|_| std::fmt::Error)?;
        write!(w, "{stamp}")
    }
}
