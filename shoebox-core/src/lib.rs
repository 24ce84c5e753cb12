//! # Shoebox Core
//!
//! Core library for the Shoebox photo backup agent. It moves photos out of a
//! drop directory into one or more backup directories under content-derived
//! names, folding JPEG/HEIC pairs of the same shot into the HEIC.
//!
//! ## Architecture
//!
//! - [`marker`]: single-instance lock file holding the owner's pid
//! - [`shutdown`]: cooperative stop flag with an interruptible sleep
//! - [`metadata`]: capture date and file type lookups through `exiftool`
//! - [`naming`]: `YYYYMMDD_HHMMSS-<crc32>.<ext>` destination names
//! - [`dedup`]: JPEG/HEIC duplicate resolution, before and after copying
//! - [`notification`]: best-effort desktop notifications
//! - [`backup`]: the polling orchestrator tying it all together
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use shoebox_core::{
//!     BackupOrchestrator, BackupSettings, DesktopNotifier, ExclusivityMarker, ExifTool,
//!     ShutdownSignal,
//! };
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let marker = Arc::new(ExclusivityMarker::acquire("/tmp/shoebox.lock")?);
//! let shutdown = ShutdownSignal::new();
//! let _listener = shutdown.listen_for_termination();
//!
//! let orchestrator = BackupOrchestrator::new(
//!     BackupSettings {
//!         source: "/home/me/Camera".into(),
//!         destinations: vec!["/mnt/backup/photos".into()],
//!         poll_interval: Duration::from_secs(30),
//!     },
//!     Arc::new(ExifTool::default()),
//!     Arc::new(DesktopNotifier::default()),
//!     shutdown,
//!     Arc::clone(&marker),
//! );
//!
//! let summary = orchestrator.run().await?;
//! println!("copied {} files", summary.copied);
//! marker.release()?;
//! # Ok(())
//! # }
//! ```

#![allow(missing_docs)]

/// Polling backup routine and file transfer
pub mod backup;

/// JPEG/HEIC duplicate resolution
pub mod dedup;

/// Error types for the backup routine
pub mod error;

/// Directory snapshots taken at the start of each poll
pub mod listing;

/// Single-instance lock file
pub mod marker;

/// Photo metadata extraction
pub mod metadata;

/// Destination file naming and checksums
pub mod naming;

/// User-facing notifications
pub mod notification;

/// Cooperative cancellation
pub mod shutdown;

pub use backup::{BackupOrchestrator, BackupSettings, CycleOutcome, FileOutcome, RunSummary};
pub use dedup::{DuplicateResolver, PairKind, Pruned};
pub use error::{BackupError, CopyStage, Result};
pub use listing::{FileEntry, list_directory};
pub use marker::{ExclusivityMarker, MarkerError, MarkerState};
pub use metadata::{ExifTool, MetadataError, MetadataExtractor};
pub use naming::{CaptureRecord, DestinationName, DestinationNamer, TimestampSource};
pub use notification::{DesktopNotifier, LogNotifier, Notifier, Severity};
pub use shutdown::{ShutdownSignal, SleepOutcome};
