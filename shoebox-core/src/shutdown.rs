//! Cooperative, one-shot stop signal.
//!
//! Every clone observes the same state. Once stopped, the signal never
//! returns to running.

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SleepOutcome {
    /// The full duration passed without a stop request.
    Elapsed,
    /// A stop request arrived before the duration passed.
    Stopped,
}

#[derive(Debug, Clone, Default)]
pub struct ShutdownSignal {
    token: CancellationToken,
}

impl ShutdownSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flip the signal to stopped. Idempotent and safe to call from any task.
    pub fn request_stop(&self) {
        if !self.token.is_cancelled() {
            info!(target: "shutdown", "stop requested");
        }
        self.token.cancel();
    }

    pub fn is_stopped(&self) -> bool {
        self.token.is_cancelled()
    }

    pub async fn wait_until_stopped(&self) {
        self.token.cancelled().await;
    }

    /// Wait until `duration` elapses or a stop is requested, whichever comes
    /// first. Only the caller is woken by the timer; the signal itself stays
    /// running.
    pub async fn resume_after(&self, duration: Duration) -> SleepOutcome {
        tokio::select! {
            biased;
            _ = self.token.cancelled() => SleepOutcome::Stopped,
            _ = tokio::time::sleep(duration) => SleepOutcome::Elapsed,
        }
    }

    /// Spawn a task that requests a stop on the first interrupt or terminate
    /// notification from the OS. The task ends once the signal is stopped
    /// for any reason.
    pub fn listen_for_termination(&self) -> JoinHandle<()> {
        let signal = self.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = signal.wait_until_stopped() => {}
                received = wait_for_termination() => match received {
                    Ok(name) => {
                        info!(target: "shutdown", signal = name, "OS termination request received");
                        signal.request_stop();
                    }
                    Err(err) => {
                        warn!(target: "shutdown", error = %err, "unable to listen for termination signals");
                    }
                },
            }
        })
    }
}

#[cfg(unix)]
async fn wait_for_termination() -> std::io::Result<&'static str> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut terminate = signal(SignalKind::terminate())?;
    tokio::select! {
        result = tokio::signal::ctrl_c() => result.map(|_| "SIGINT"),
        _ = terminate.recv() => Ok("SIGTERM"),
    }
}

#[cfg(not(unix))]
async fn wait_for_termination() -> std::io::Result<&'static str> {
    tokio::signal::ctrl_c().await.map(|_| "ctrl-c")
}
