//! File-backed tracing setup.
//!
//! The terminal is in raw mode while the game runs, so stderr is unusable;
//! logs go to a file instead, and only when `DINO_LOG` asks for them
//! (e.g. `DINO_LOG=debug`).

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

const LOG_FILE: &str = "dino-tui.log";

/// Returns a guard that must stay alive for the duration of the program,
/// or `None` when logging is disabled.
pub fn init() -> Option<WorkerGuard> {
    let filter = std::env::var("DINO_LOG").ok()?;
    let appender = tracing_appender::rolling::never(".", LOG_FILE);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    tracing_subscriber::registry()
        .with(EnvFilter::new(filter))
        .with(fmt::layer().with_writer(writer).with_ansi(false))
        .init();
    Some(guard)
}
