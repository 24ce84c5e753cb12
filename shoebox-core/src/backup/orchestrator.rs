use std::fmt;
use std::sync::Arc;

use tokio::fs;
use tracing::{debug, info, warn};

use super::transfer::{copy_file, is_blacklisted};
use super::{BackupSettings, CycleOutcome, FileOutcome, RunSummary};
use crate::dedup::DuplicateResolver;
use crate::error::{BackupError, Result};
use crate::listing::{FileEntry, list_directory};
use crate::marker::ExclusivityMarker;
use crate::metadata::MetadataExtractor;
use crate::naming::DestinationNamer;
use crate::notification::{Notifier, Severity};
use crate::shutdown::{ShutdownSignal, SleepOutcome};

/// Polls the source directory and moves files into the destinations.
///
/// Work is strictly sequential. The shutdown signal is consulted at the top of
/// every cycle, before every file, and during the sleep between polls.
pub struct BackupOrchestrator {
    settings: BackupSettings,
    namer: DestinationNamer,
    resolver: DuplicateResolver,
    notifier: Arc<dyn Notifier>,
    shutdown: ShutdownSignal,
    marker: Arc<ExclusivityMarker>,
}

impl fmt::Debug for BackupOrchestrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackupOrchestrator")
            .field("settings", &self.settings)
            .field("marker", &self.marker.path())
            .field("shutdown_requested", &self.shutdown.is_stopped())
            .finish()
    }
}

/// Successes and failures accumulated since the last notification.
#[derive(Debug, Default, Clone, Copy)]
struct PendingReport {
    copied: u64,
    failed: u64,
}

impl BackupOrchestrator {
    pub fn new(
        settings: BackupSettings,
        extractor: Arc<dyn MetadataExtractor>,
        notifier: Arc<dyn Notifier>,
        shutdown: ShutdownSignal,
        marker: Arc<ExclusivityMarker>,
    ) -> Self {
        Self {
            settings,
            namer: DestinationNamer::new(Arc::clone(&extractor)),
            resolver: DuplicateResolver::new(extractor),
            notifier,
            shutdown,
            marker,
        }
    }

    /// Poll until a stop is requested.
    ///
    /// A cycle that copied something is followed immediately by another one.
    /// Once a cycle copies nothing, the pending counts are reported (if any)
    /// and the loop sleeps for the poll interval. The only error is a marker
    /// that stopped validating, which ends the loop.
    pub async fn run(&self) -> Result<RunSummary> {
        let mut summary = RunSummary::default();
        let mut pending = PendingReport::default();

        loop {
            if self.should_stop() {
                break;
            }
            self.marker.validate()?;

            let cycle = self.run_cycle().await;
            summary.absorb(&cycle);
            pending.copied += cycle.copied;
            pending.failed += cycle.failed;

            if cycle.copied > 0 {
                continue;
            }

            self.report(pending).await;
            pending = PendingReport::default();

            if self.shutdown.resume_after(self.settings.poll_interval).await
                == SleepOutcome::Stopped
            {
                info!(target: "backup::cycle", "OS interrupt received, terminating");
                break;
            }
        }

        info!(
            target: "backup::summary",
            cycles = summary.cycles,
            copied = summary.copied,
            failed = summary.failed,
            skipped = summary.skipped,
            duplicates_removed = summary.duplicates_removed,
            "backup routine stopped"
        );
        Ok(summary)
    }

    /// Run exactly one cycle and report its counts.
    pub async fn run_once(&self) -> Result<CycleOutcome> {
        self.marker.validate()?;
        let cycle = self.run_cycle().await;
        self.report(PendingReport {
            copied: cycle.copied,
            failed: cycle.failed,
        })
        .await;
        Ok(cycle)
    }

    /// List, deduplicate, and process the source directory once.
    ///
    /// Never fails: listing and dedup problems yield an empty outcome, and
    /// per-file problems are counted as failures.
    pub async fn run_cycle(&self) -> CycleOutcome {
        let mut outcome = CycleOutcome::default();
        let source = &self.settings.source;

        let listing = match list_directory(source).await {
            Ok(listing) => listing,
            Err(source_err) => {
                let err = BackupError::Listing {
                    path: source.clone(),
                    source: source_err,
                };
                warn!(target: "backup::cycle", error = %err, "unable to access source directory");
                self.notifier
                    .notify(Severity::Warning, "Backup failed", &err.to_string())
                    .await;
                return outcome;
            }
        };
        info!(target: "backup::cycle", source = %source.display(), files = listing.len(), "opened source directory");

        let pruned = match self.resolver.prune(listing).await {
            Ok(pruned) => pruned,
            Err(err) => {
                warn!(
                    target: "backup::dedup",
                    error = %err,
                    "duplicate resolution failed, deferring batch to the next cycle"
                );
                return outcome;
            }
        };
        outcome.duplicates_removed += pruned.removed.len() as u64;

        for entry in &pruned.kept {
            if self.should_stop() {
                outcome.interrupted = true;
                break;
            }
            outcome.record(self.process_file(entry).await);
        }

        outcome
    }

    async fn process_file(&self, entry: &FileEntry) -> FileOutcome {
        if is_blacklisted(&entry.name) {
            info!(target: "backup::file", file = %entry.name, "not touching blacklisted file");
            return FileOutcome::Skipped;
        }

        info!(target: "backup::file", file = %entry.name, "processing file");
        match self.back_up(entry).await {
            Ok(duplicates_removed) => {
                info!(target: "backup::file", file = %entry.name, "processing file is finished");
                FileOutcome::Copied { duplicates_removed }
            }
            Err(err) => {
                warn!(target: "backup::file", file = %entry.name, error = %err, "backup failed");
                FileOutcome::Failed
            }
        }
    }

    /// Copy `entry` into every destination, then delete the source.
    ///
    /// The source is only deleted once every copy is durable. Returns the
    /// number of duplicates the post-copy check removed.
    async fn back_up(&self, entry: &FileEntry) -> Result<usize> {
        let name = self.namer.name_for(&entry.path).await?.to_string();
        debug!(target: "backup::file", file = %entry.name, destination_name = %name, "computed destination name");

        let mut duplicates_removed = 0;
        for destination_dir in &self.settings.destinations {
            let destination = std::path::absolute(destination_dir.join(&name))?;
            copy_file(&entry.path, &destination).await?;
            info!(
                target: "backup::file",
                from = %entry.path.display(),
                to = %destination.display(),
                "successfully backed up"
            );

            match self.resolver.check_destination(&destination).await {
                Ok(removed) => duplicates_removed += removed.len(),
                Err(err) => {
                    warn!(
                        target: "backup::dedup",
                        path = %destination.display(),
                        error = %err,
                        "post-copy duplicate check failed, keeping both files"
                    );
                }
            }
        }

        fs::remove_file(&entry.path)
            .await
            .map_err(|source| BackupError::RemoveSource {
                path: entry.path.clone(),
                source,
            })?;

        Ok(duplicates_removed)
    }

    async fn report(&self, pending: PendingReport) {
        if pending.copied == 0 && pending.failed == 0 {
            return;
        }

        info!(
            target: "backup::cycle",
            successes = pending.copied,
            failures = pending.failed,
            "processing finished"
        );

        let body = format!(
            "Successfully copied: {}\nFailed to copy: {}",
            pending.copied, pending.failed
        );
        if pending.failed > 0 {
            self.notifier
                .notify(Severity::Warning, "Backup completed with error", &body)
                .await;
        } else {
            self.notifier
                .notify(Severity::Info, "Backup completed successfully", &body)
                .await;
        }
    }

    fn should_stop(&self) -> bool {
        if self.shutdown.is_stopped() {
            info!(target: "backup::cycle", "stop requested, terminating");
            return true;
        }
        false
    }
}
