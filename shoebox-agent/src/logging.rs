//! Process-wide tracing installation.
//!
//! Each run writes to its own file in the configured log directory. The
//! returned [`LogGuard`] must be held until shutdown: dropping it flushes the
//! background writer.

use std::fs::{self, File};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use thiserror::Error;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

const DEFAULT_FILTER: &str = "info";

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("unable to create log directory {path}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("unable to create log file {path}")]
    CreateFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("a global tracing subscriber is already installed")]
    AlreadyInstalled(#[source] tracing_subscriber::util::TryInitError),
}

#[derive(Debug)]
pub struct LogGuard {
    path: PathBuf,
    _worker: WorkerGuard,
}

impl LogGuard {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// `YYYY-MM-DD_HH-MM-SS_<nanos>.log`, unique per start.
pub fn log_file_name(now: DateTime<Local>) -> String {
    format!(
        "{}_{}.log",
        now.format("%Y-%m-%d_%H-%M-%S"),
        now.timestamp_subsec_nanos()
    )
}

/// Create this run's log file and install the global subscriber.
///
/// `RUST_LOG` overrides the default `info` filter. With `foreground` set, a
/// second layer mirrors everything to stderr.
pub fn install(log_dir: &Path, foreground: bool) -> Result<LogGuard, LoggingError> {
    fs::create_dir_all(log_dir).map_err(|source| LoggingError::CreateDir {
        path: log_dir.to_path_buf(),
        source,
    })?;

    let path = log_dir.join(log_file_name(Local::now()));
    let file = File::create(&path).map_err(|source| LoggingError::CreateFile {
        path: path.clone(),
        source,
    })?;
    let (writer, worker) = tracing_appender::non_blocking(file);

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let stderr_layer = foreground.then(|| fmt::layer().with_writer(std::io::stderr));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_ansi(false).with_writer(writer))
        .with(stderr_layer)
        .try_init()
        .map_err(LoggingError::AlreadyInstalled)?;

    Ok(LogGuard {
        path,
        _worker: worker,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Timelike};

    #[test]
    fn file_name_carries_timestamp_and_nanoseconds() {
        let now = Local
            .with_ymd_and_hms(2024, 5, 6, 7, 8, 9)
            .unwrap()
            .with_nanosecond(42)
            .unwrap();

        assert_eq!(log_file_name(now), "2024-05-06_07-08-09_42.log");
    }

    #[test]
    fn unwritable_directory_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, b"").unwrap();

        let err = install(&blocker.join("logs"), false).unwrap_err();
        assert!(matches!(err, LoggingError::CreateDir { .. }));
    }
}
