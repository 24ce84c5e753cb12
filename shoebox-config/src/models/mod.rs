use std::path::PathBuf;
use std::time::Duration;

use shoebox_core::BackupSettings;

pub mod sources;

pub const DEFAULT_EXIFTOOL: &str = "exiftool";
pub const DEFAULT_NOTIFY_COMMAND: &str = "notify-send";

/// Fully resolved agent configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub metadata: ConfigMetadata,
    /// Directory receiving one log file per run.
    pub log_dir: PathBuf,
    pub lock_file: PathBuf,
    pub poll_interval: Duration,
    pub source: PathBuf,
    pub destinations: Vec<PathBuf>,
    pub exiftool: PathBuf,
    pub notifications: NotificationsConfig,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigMetadata {
    pub config_path: PathBuf,
    pub env_file_loaded: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationsConfig {
    pub enabled: bool,
    pub command: PathBuf,
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            command: PathBuf::from(DEFAULT_NOTIFY_COMMAND),
        }
    }
}

impl Config {
    pub fn backup_settings(&self) -> BackupSettings {
        BackupSettings {
            source: self.source.clone(),
            destinations: self.destinations.clone(),
            poll_interval: self.poll_interval,
        }
    }
}
