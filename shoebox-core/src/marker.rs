//! Single-instance exclusivity marker.
//!
//! The marker is a lock file that records the owning process id and holds an
//! exclusive advisory lock for as long as the agent runs. A marker whose
//! recorded id stops matching this process is considered tampered with and is
//! never removed by us, so an unrelated process's marker is not destroyed.

use std::fs::{self, File, OpenOptions, TryLockError};
use std::io::{Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU8, Ordering};

use thiserror::Error;
use tracing::{info, warn};

#[derive(Error, Debug)]
pub enum MarkerError {
    #[error("lock file {path} is held by another instance")]
    AlreadyHeld { path: PathBuf },

    #[error("not removing lock file {path} because it was externally tampered with ({reason})")]
    Tampered { path: PathBuf, reason: String },

    #[error("lock file {path} was already released")]
    Released { path: PathBuf },

    #[error("lock file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Lifecycle of an acquired marker. `Tampered` and `Released` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum MarkerState {
    Valid = 0,
    Tampered = 1,
    Released = 2,
}

impl MarkerState {
    fn from_raw(raw: u8) -> Self {
        match raw {
            0 => MarkerState::Valid,
            1 => MarkerState::Tampered,
            _ => MarkerState::Released,
        }
    }
}

/// An acquired lock file. Share it behind an `Arc` so the orchestrator can
/// validate it every cycle while the process entry point releases it.
#[derive(Debug)]
pub struct ExclusivityMarker {
    path: PathBuf,
    file: File,
    pid: u32,
    state: AtomicU8,
}

impl ExclusivityMarker {
    /// Create (or reuse) the lock file at `path`, lock it, and record the
    /// current process id.
    ///
    /// Fails with [`MarkerError::AlreadyHeld`] when another handle holds the
    /// lock. The existing contents are left untouched in that case.
    pub fn acquire(path: impl Into<PathBuf>) -> Result<Self, MarkerError> {
        let path = path.into();
        let io_error = |source| MarkerError::Io {
            path: path.clone(),
            source,
        };

        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(&path)
            .map_err(io_error)?;

        match file.try_lock() {
            Ok(()) => {}
            Err(TryLockError::WouldBlock) => {
                return Err(MarkerError::AlreadyHeld { path: path.clone() });
            }
            Err(TryLockError::Error(source)) => return Err(io_error(source)),
        }

        let pid = std::process::id();
        file.set_len(0).map_err(io_error)?;
        file.seek(SeekFrom::Start(0)).map_err(io_error)?;
        file.write_all(pid.to_string().as_bytes()).map_err(io_error)?;
        file.sync_all().map_err(io_error)?;

        info!(target: "marker", path = %path.display(), pid, "lock file created");

        Ok(Self {
            path,
            file,
            pid,
            state: AtomicU8::new(MarkerState::Valid as u8),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn pid(&self) -> u32 {
        self.pid
    }

    pub fn state(&self) -> MarkerState {
        MarkerState::from_raw(self.state.load(Ordering::Acquire))
    }

    /// Re-read the recorded process id and compare it with ours.
    ///
    /// A mismatch, unparseable contents, or an unreadable file moves the
    /// marker to [`MarkerState::Tampered`] for good.
    pub fn validate(&self) -> Result<(), MarkerError> {
        match self.state() {
            MarkerState::Valid => {}
            MarkerState::Tampered => {
                return Err(self.tampered("tampering was detected earlier"));
            }
            MarkerState::Released => {
                return Err(MarkerError::Released {
                    path: self.path.clone(),
                });
            }
        }

        let reason = match fs::read_to_string(&self.path) {
            Ok(contents) => match contents.parse::<u32>() {
                Ok(recorded) if recorded == self.pid => return Ok(()),
                Ok(recorded) => {
                    format!("recorded pid {recorded} does not match {}", self.pid)
                }
                Err(err) => {
                    format!("unable to convert recorded pid {contents:?}: {err}")
                }
            },
            Err(err) => format!("unable to read lock file: {err}"),
        };

        match self.transition(MarkerState::Valid, MarkerState::Tampered) {
            Ok(()) | Err(MarkerState::Tampered) => {
                warn!(target: "marker", path = %self.path.display(), %reason, "lock file tampered with");
                Err(self.tampered(&reason))
            }
            Err(_) => Err(MarkerError::Released {
                path: self.path.clone(),
            }),
        }
    }

    /// Delete the lock file, then unlock it.
    ///
    /// Refuses with [`MarkerError::Tampered`] when validation fails; the
    /// file is then left on disk for manual inspection.
    pub fn release(&self) -> Result<(), MarkerError> {
        self.validate()?;

        self.transition(MarkerState::Valid, MarkerState::Released)
            .map_err(|state| match state {
                MarkerState::Tampered => {
                    self.tampered("tampering was detected during release")
                }
                _ => MarkerError::Released {
                    path: self.path.clone(),
                },
            })?;

        let io_error = |source| MarkerError::Io {
            path: self.path.clone(),
            source,
        };
        fs::remove_file(&self.path).map_err(io_error)?;
        self.file.unlock().map_err(io_error)?;

        info!(target: "marker", path = %self.path.display(), "lock file removed");
        Ok(())
    }

    fn transition(
        &self,
        from: MarkerState,
        to: MarkerState,
    ) -> Result<(), MarkerState> {
        self.state
            .compare_exchange(
                from as u8,
                to as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .map(|_| ())
            .map_err(MarkerState::from_raw)
    }

    fn tampered(&self, reason: &str) -> MarkerError {
        MarkerError::Tampered {
            path: self.path.clone(),
            reason: reason.to_string(),
        }
    }
}
