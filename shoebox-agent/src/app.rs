//! Process wiring: configuration, logging, marker, and the backup loop.

use std::sync::Arc;

use anyhow::Context;
use shoebox_config::{ConfigLoad, ConfigWarnings};
use shoebox_core::{
    BackupOrchestrator, DesktopNotifier, ExclusivityMarker, ExifTool, LogNotifier, Notifier,
    Severity, ShutdownSignal,
};
use tracing::{error, info, warn};

use crate::cli::Cli;
use crate::logging::{self, LogGuard};

/// How the agent finished, mapped to the process exit code by `main`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exit {
    Completed,
    Failed,
}

/// Run the agent until it is told to stop (or for one cycle with `--once`).
///
/// Startup failures are reported on stderr or in the log and as an error
/// notification. They never panic.
pub async fn run(cli: Cli) -> Exit {
    let ConfigLoad { config, warnings } = match load_config(&cli) {
        Ok(load) => load,
        Err(err) => {
            eprintln!("{err:#}");
            DesktopNotifier::default()
                .notify(Severity::Error, "Configuration problem", &format!("{err:#}"))
                .await;
            return Exit::Failed;
        }
    };

    let notifier: Arc<dyn Notifier> = if config.notifications.enabled {
        Arc::new(DesktopNotifier::new(config.notifications.command.clone()))
    } else {
        Arc::new(LogNotifier)
    };

    let log_guard = match install_logging(&cli, &config.log_dir) {
        Ok(guard) => guard,
        Err(err) => {
            eprintln!("{err:#}");
            notifier
                .notify(Severity::Error, "Logging problem", &format!("{err:#}"))
                .await;
            return Exit::Failed;
        }
    };
    info!(log_file = %log_guard.path().display(), "configured logger");
    if config.metadata.env_file_loaded {
        info!("loaded .env file");
    }
    info!(config = %config.metadata.config_path.display(), "configuration loaded");
    report_warnings(&warnings);

    let shutdown = ShutdownSignal::new();
    let listener = shutdown.listen_for_termination();
    info!("configured signal handler");

    let marker = match ExclusivityMarker::acquire(&config.lock_file)
        .context("unable to create lock file")
    {
        Ok(marker) => Arc::new(marker),
        Err(err) => {
            error!(error = %format!("{err:#}"), "startup aborted");
            notifier
                .notify(Severity::Error, "Lock file error", &format!("{err:#}"))
                .await;
            shutdown.request_stop();
            let _ = listener.await;
            return Exit::Failed;
        }
    };

    let orchestrator = BackupOrchestrator::new(
        config.backup_settings(),
        Arc::new(ExifTool::new(config.exiftool.clone())),
        Arc::clone(&notifier),
        shutdown.clone(),
        Arc::clone(&marker),
    );
    info!(
        source = %config.source.display(),
        destinations = config.destinations.len(),
        poll_interval = ?config.poll_interval,
        "starting backup routine"
    );

    let mut exit = Exit::Completed;
    let result = if cli.once {
        orchestrator.run_once().await.map(|cycle| {
            info!(
                copied = cycle.copied,
                failed = cycle.failed,
                skipped = cycle.skipped,
                duplicates_removed = cycle.duplicates_removed,
                "single cycle finished"
            );
        })
    } else {
        orchestrator.run().await.map(|_| ())
    };

    if let Err(err) = result {
        error!(error = %err, "backup routine stopped");
        notifier
            .notify(Severity::Error, "Backup stopped", &err.to_string())
            .await;
        exit = Exit::Failed;
    }

    shutdown.request_stop();
    if let Err(err) = listener.await {
        warn!(error = %err, "signal listener did not shut down cleanly");
    }
    drop(orchestrator);

    match marker.release() {
        Ok(()) => info!("lock file released"),
        Err(err) => {
            error!(error = %err, "unable to release lock file");
            notifier
                .notify(Severity::Error, "Lock file error", &err.to_string())
                .await;
            exit = Exit::Failed;
        }
    }

    info!("shutting down");
    drop(log_guard);
    exit
}

fn load_config(cli: &Cli) -> anyhow::Result<ConfigLoad> {
    cli.config_loader()
        .load()
        .context("unable to parse configuration")
}

fn install_logging(cli: &Cli, log_dir: &std::path::Path) -> anyhow::Result<LogGuard> {
    logging::install(log_dir, cli.foreground).context("unable to configure logging")
}

fn report_warnings(warnings: &ConfigWarnings) {
    for warning in &warnings.items {
        match &warning.hint {
            Some(hint) => {
                warn!(message = %warning.message, hint = %hint, "configuration warning")
            }
            None => warn!(message = %warning.message, "configuration warning"),
        }
    }
}
