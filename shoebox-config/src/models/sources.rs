use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Environment variable naming the configuration file.
pub const CONFIG_PATH_ENV: &str = "SHOEBOX_CONFIG";

/// Raw configuration as written in the TOML file.
///
/// Key names are the flat lowercase spelling used by existing deployments.
/// Every top-level backup key is required and unknown keys are rejected.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub logdir: PathBuf,
    pub lockfile: PathBuf,
    /// Human readable duration such as `30s`, `5m` or `1h30m`.
    pub pollinginterval: String,
    pub source: PathBuf,
    pub destination: Vec<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exiftool: Option<PathBuf>,
    #[serde(default)]
    pub notifications: FileNotificationsConfig,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct FileNotificationsConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<PathBuf>,
}

/// Values read from the process environment.
#[derive(Debug, Default, Clone)]
pub struct EnvConfig {
    pub config_path: Option<PathBuf>,
}

impl EnvConfig {
    pub fn gather() -> Self {
        Self {
            config_path: std::env::var_os(CONFIG_PATH_ENV)
                .filter(|value| !value.is_empty())
                .map(PathBuf::from),
        }
    }
}
