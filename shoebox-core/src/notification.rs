//! Best-effort user notifications.
//!
//! Notifiers never report failure to the caller. Delivery problems are logged
//! and otherwise ignored.

use std::fmt;
use std::path::PathBuf;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, error, info, warn};

/// Longest body shown before truncation; desktop balloons clip beyond this.
pub const MAX_BODY_CHARS: usize = 61;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl Severity {
    fn urgency(self) -> &'static str {
        match self {
            Severity::Info => "low",
            Severity::Warning => "normal",
            Severity::Error => "critical",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
        };
        f.write_str(label)
    }
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, severity: Severity, title: &str, body: &str);
}

/// Writes notifications to the log only.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, severity: Severity, title: &str, body: &str) {
        match severity {
            Severity::Info => info!(target: "notify", %title, %body, "notification"),
            Severity::Warning => warn!(target: "notify", %title, %body, "notification"),
            Severity::Error => error!(target: "notify", %title, %body, "notification"),
        }
    }
}

/// Shows a desktop notification through a `notify-send` compatible command.
#[derive(Debug, Clone)]
pub struct DesktopNotifier {
    command: PathBuf,
    app_name: String,
}

impl Default for DesktopNotifier {
    fn default() -> Self {
        Self::new("notify-send")
    }
}

impl DesktopNotifier {
    pub fn new(command: impl Into<PathBuf>) -> Self {
        Self {
            command: command.into(),
            app_name: "shoebox".to_string(),
        }
    }
}

#[async_trait]
impl Notifier for DesktopNotifier {
    async fn notify(&self, severity: Severity, title: &str, body: &str) {
        LogNotifier.notify(severity, title, body).await;

        let result = Command::new(&self.command)
            .arg(format!("--urgency={}", severity.urgency()))
            .arg(format!("--app-name={}", self.app_name))
            .arg(title)
            .arg(truncate_body(body))
            .kill_on_drop(true)
            .output()
            .await;

        match result {
            Ok(output) if output.status.success() => {
                debug!(target: "notify", %severity, %title, "desktop notification sent");
            }
            Ok(output) => {
                warn!(
                    target: "notify",
                    status = %output.status,
                    stderr = %String::from_utf8_lossy(&output.stderr).trim(),
                    "notification command failed"
                );
            }
            Err(err) => {
                warn!(
                    target: "notify",
                    command = %self.command.display(),
                    error = %err,
                    "unable to run notification command"
                );
            }
        }
    }
}

/// Clip `body` to [`MAX_BODY_CHARS`] characters, marking the cut with `...`.
pub fn truncate_body(body: &str) -> String {
    match body.char_indices().nth(MAX_BODY_CHARS) {
        Some((cut, _)) => format!("{}...", &body[..cut]),
        None => body.to_string(),
    }
}
