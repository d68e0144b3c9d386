//! Log setup. The terminal belongs to the TUI, so logs go to a file.

use std::fs;
use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use crate::error::Result;

pub const LOG_FILE_NAME: &str = "keytempo.log";

/// Install the global subscriber writing to `log_dir/keytempo.log`.
///
/// `RUST_LOG` wins over `default_level` when set. The returned guard flushes
/// buffered lines on drop and must live as long as logging is wanted.
/// Returns `None` if a subscriber is already installed.
pub fn init(log_dir: &Path, default_level: &str) -> Result<Option<WorkerGuard>> {
    fs::create_dir_all(log_dir)?;

    let file_appender = tracing_appender::rolling::never(log_dir, LOG_FILE_NAME);
    let (writer, guard) = tracing_appender::non_blocking(file_appender);
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    match tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .try_init()
    {
        Ok(()) => Ok(Some(guard)),
        // already installed; dropping the guard shuts this writer down
        Err(_) => Ok(None),
    }
}
