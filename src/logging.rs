//! Tracing setup.
//!
//! Filtering follows `QUICKWRITE_LOG` (same syntax as `RUST_LOG`), defaulting
//! to `info`. Foreground commands log to stderr; the daemon worker logs to
//! `daemon.log` in the config directory since its stdio is detached.

use crate::config::{ensure_config_dir, LOG_FILENAME};
use crate::error::{QuickwriteError, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

pub const LOG_ENV: &str = "QUICKWRITE_LOG";

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Log to stderr. Safe to call more than once; later calls are no-ops.
pub fn init_stderr_logging() {
    let layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_filter(env_filter());

    let _ = tracing_subscriber::registry().with(layer).try_init();
}

/// Log to `<config>/daemon.log`. The returned guard flushes on drop and must
/// be held for as long as the daemon runs.
pub fn init_file_logging() -> Result<WorkerGuard> {
    let dir = ensure_config_dir()?;
    let appender = tracing_appender::rolling::never(dir, LOG_FILENAME);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let layer = fmt::layer()
        .with_writer(writer)
        .with_ansi(false)
        .with_target(true)
        .with_filter(env_filter());

    tracing_subscriber::registry()
        .with(layer)
        .try_init()
        .map_err(|e| QuickwriteError::Other(format!("failed to initialize logging: {}", e)))?;

    Ok(guard)
}
