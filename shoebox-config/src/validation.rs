use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::models::Config;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigGuardRailError {
    #[error("configuration key \"{key}\" must not be empty")]
    EmptyPath { key: &'static str },
    #[error("at least one destination directory is required")]
    NoDestinations,
    #[error("destination #{index} must not be empty")]
    EmptyDestination { index: usize },
    #[error("destination {path} is the source directory")]
    DestinationIsSource { path: PathBuf },
    #[error("polling interval must be greater than zero")]
    ZeroPollInterval,
}

#[derive(Debug, Clone)]
pub struct ConfigWarning {
    pub message: String,
    pub hint: Option<String>,
}

#[derive(Debug, Default, Clone)]
pub struct ConfigWarnings {
    pub items: Vec<ConfigWarning>,
}

impl ConfigWarnings {
    pub fn push<S: Into<String>>(&mut self, message: S) {
        self.items.push(ConfigWarning {
            message: message.into(),
            hint: None,
        });
    }

    pub fn push_with_hint<S: Into<String>, H: Into<String>>(&mut self, message: S, hint: H) {
        self.items.push(ConfigWarning {
            message: message.into(),
            hint: Some(hint.into()),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Reject configurations the agent cannot run with and collect warnings for
/// ones it can run with but probably should not.
pub fn apply_guard_rails(config: &Config) -> Result<ConfigWarnings, ConfigGuardRailError> {
    let mut warnings = ConfigWarnings::default();

    for (key, path) in [
        ("logdir", &config.log_dir),
        ("lockfile", &config.lock_file),
        ("source", &config.source),
    ] {
        if is_blank(path) {
            return Err(ConfigGuardRailError::EmptyPath { key });
        }
    }

    if config.destinations.is_empty() {
        return Err(ConfigGuardRailError::NoDestinations);
    }

    for (index, destination) in config.destinations.iter().enumerate() {
        if is_blank(destination) {
            return Err(ConfigGuardRailError::EmptyDestination { index });
        }
        if same_directory(destination, &config.source) {
            return Err(ConfigGuardRailError::DestinationIsSource {
                path: destination.clone(),
            });
        }
        if !destination.is_dir() {
            warnings.push_with_hint(
                format!("destination {} is not an existing directory", destination.display()),
                "Every copy into it will fail until the directory is created or mounted",
            );
        }
    }

    if config.poll_interval.is_zero() {
        return Err(ConfigGuardRailError::ZeroPollInterval);
    }

    if !config.source.is_dir() {
        warnings.push(format!(
            "source {} is not an existing directory; polls will fail until it appears",
            config.source.display()
        ));
    }

    if !config.notifications.enabled {
        warnings.push("desktop notifications are disabled; summaries go to the log only");
    }

    Ok(warnings)
}

fn is_blank(path: &Path) -> bool {
    path.as_os_str().to_string_lossy().trim().is_empty()
}

fn same_directory(a: &Path, b: &Path) -> bool {
    match (std::path::absolute(a), std::path::absolute(b)) {
        (Ok(a), Ok(b)) => a.components().eq(b.components()),
        _ => a == b,
    }
}
