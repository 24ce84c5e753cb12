//! The polling backup routine.

use std::path::PathBuf;
use std::time::Duration;

pub mod orchestrator;
pub mod transfer;

pub use orchestrator::BackupOrchestrator;
pub use transfer::{BLACKLISTED_FILE_NAMES, copy_file, is_blacklisted};

/// Runtime knobs for [`BackupOrchestrator`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BackupSettings {
    /// Directory polled for new files.
    pub source: PathBuf,
    /// Every processed file is copied into each of these, in order.
    pub destinations: Vec<PathBuf>,
    /// Pause between polls once a cycle copies nothing.
    pub poll_interval: Duration,
}

/// What happened to one file during a cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileOutcome {
    Copied { duplicates_removed: usize },
    Skipped,
    Failed,
}

/// Counts for a single poll cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleOutcome {
    pub copied: u64,
    pub failed: u64,
    pub skipped: u64,
    pub duplicates_removed: u64,
    /// A stop request cut the cycle short.
    pub interrupted: bool,
}

impl CycleOutcome {
    fn record(&mut self, outcome: FileOutcome) {
        match outcome {
            FileOutcome::Copied { duplicates_removed } => {
                self.copied += 1;
                self.duplicates_removed += duplicates_removed as u64;
            }
            FileOutcome::Skipped => self.skipped += 1,
            FileOutcome::Failed => self.failed += 1,
        }
    }
}

/// Totals across every cycle of one [`BackupOrchestrator::run`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub cycles: u64,
    pub copied: u64,
    pub failed: u64,
    pub skipped: u64,
    pub duplicates_removed: u64,
}

impl RunSummary {
    fn absorb(&mut self, cycle: &CycleOutcome) {
        self.cycles += 1;
        self.copied += cycle.copied;
        self.failed += cycle.failed;
        self.skipped += cycle.skipped;
        self.duplicates_removed += cycle.duplicates_removed;
    }
}
