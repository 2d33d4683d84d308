//! Tracing setup: stderr plus a daily rolling file under the logs directory.
//!
//! Level comes from `RUST_LOG` (default `info`); `BLUEPIC_DEBUG_LOG=1` forces `debug`.

use std::env;
use std::path::Path;

use fs_err as fs;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

const LOG_FILE_PREFIX: &str = "bluepic.log";

/// Installs the global subscriber. Keep the returned guard alive until exit so
/// buffered file output is flushed.
pub fn init(logs_dir: &Path) -> Option<WorkerGuard> {
    let filter = if debug_enabled(env::var("BLUEPIC_DEBUG_LOG").ok().as_deref()) {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    let stderr = fmt::layer().with_writer(std::io::stderr);

    if let Err(err) = fs::create_dir_all(logs_dir) {
        tracing_subscriber::registry().with(filter).with(stderr).init();
        tracing::warn!(error = %err, "Log directory unavailable, logging to stderr only");
        return None;
    }

    let appender = tracing_appender::rolling::daily(logs_dir, LOG_FILE_PREFIX);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    tracing_subscriber::registry()
        .with(filter)
        .with(stderr)
        .with(fmt::layer().with_ansi(false).with_writer(writer))
        .init();
    Some(guard)
}

fn debug_enabled(value: Option<&str>) -> bool {
    matches!(value, Some("1" | "true" | "TRUE" | "yes" | "YES"))
}
