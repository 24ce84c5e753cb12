use once_cell::sync::Lazy;
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::debug;

use crate::models::{
    Config, ConfigMetadata, DEFAULT_EXIFTOOL, NotificationsConfig,
    sources::{EnvConfig, FileConfig},
};
use crate::validation::{self, ConfigWarnings};

pub mod error;

use error::ConfigLoadError;

static DEFAULT_CONFIG_LOCATIONS: Lazy<Vec<PathBuf>> = Lazy::new(|| {
    vec![
        PathBuf::from("shoebox.toml"),
        PathBuf::from("config/shoebox.toml"),
        PathBuf::from("config.toml"),
    ]
});

#[derive(Debug, Default, Clone)]
pub struct ConfigLoaderOptions {
    pub config_path: Option<PathBuf>,
    pub env_file: Option<PathBuf>,
    /// Skip `.env` discovery entirely.
    pub skip_env_file: bool,
}

#[derive(Debug, Default)]
pub struct ConfigLoader {
    options: ConfigLoaderOptions,
}

#[derive(Debug)]
pub struct ConfigLoad {
    pub config: Config,
    pub warnings: ConfigWarnings,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: ConfigLoaderOptions) -> Self {
        Self { options }
    }

    pub fn with_config_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.options.config_path = Some(path.into());
        self
    }

    pub fn with_env_file<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.options.env_file = Some(path.into());
        self
    }

    pub fn without_env_file(mut self) -> Self {
        self.options.skip_env_file = true;
        self
    }

    /// Load `.env`, locate and parse the configuration file, then apply
    /// guard rails.
    pub fn load(&self) -> Result<ConfigLoad, ConfigLoadError> {
        let env_file_loaded = self.load_env_file()?;
        self.load_with_env(&EnvConfig::gather(), env_file_loaded)
    }

    /// Same as [`ConfigLoader::load`] with an explicit environment snapshot
    /// and no `.env` handling.
    pub fn load_with_env(
        &self,
        env: &EnvConfig,
        env_file_loaded: bool,
    ) -> Result<ConfigLoad, ConfigLoadError> {
        let path = self.resolve_path(env)?;
        let file_config = read_file_config(&path)?;
        let config = compose_config(
            file_config,
            ConfigMetadata {
                config_path: path,
                env_file_loaded,
            },
        )?;
        let warnings = validation::apply_guard_rails(&config)?;

        Ok(ConfigLoad { config, warnings })
    }

    fn load_env_file(&self) -> Result<bool, ConfigLoadError> {
        if self.options.skip_env_file {
            return Ok(false);
        }

        let loaded = match &self.options.env_file {
            Some(path) => dotenvy::from_path(path).map(|_| true),
            None => dotenvy::dotenv().map(|_| true),
        };

        match loaded {
            Ok(loaded) => Ok(loaded),
            Err(dotenvy::Error::Io(_)) => Ok(false),
            Err(err) => Err(err.into()),
        }
    }

    /// Pick the configuration file: explicit option, then the environment,
    /// then the first default candidate that exists.
    pub fn resolve_path(&self, env: &EnvConfig) -> Result<PathBuf, ConfigLoadError> {
        let mut source = ConfigPathSource::default();

        if let Some(explicit) = &self.options.config_path {
            source.explicit = Some(explicit.clone());
        } else if let Some(from_env) = &env.config_path {
            source.env = Some(from_env.clone());
        } else {
            source.default = DEFAULT_CONFIG_LOCATIONS
                .iter()
                .find(|candidate| candidate.is_file())
                .cloned();
        }

        match source.resolved_path() {
            Some((path, provenance)) => {
                if provenance.is_explicit() && !path.exists() {
                    return Err(ConfigLoadError::MissingConfig { path });
                }
                debug!(path = %path.display(), ?provenance, "resolved configuration path");
                Ok(path)
            }
            None => Err(ConfigLoadError::NoConfigFound {
                searched: DEFAULT_CONFIG_LOCATIONS
                    .iter()
                    .map(|candidate| candidate.display().to_string())
                    .collect::<Vec<_>>()
                    .join(", "),
            }),
        }
    }
}

fn read_file_config(path: &Path) -> Result<FileConfig, ConfigLoadError> {
    let contents = fs::read_to_string(path).map_err(|source| ConfigLoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    toml::from_str(&contents).map_err(|source| ConfigLoadError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn compose_config(
    file: FileConfig,
    metadata: ConfigMetadata,
) -> Result<Config, ConfigLoadError> {
    let FileConfig {
        logdir,
        lockfile,
        pollinginterval,
        source,
        destination,
        exiftool,
        notifications,
    } = file;

    let poll_interval = humantime::parse_duration(pollinginterval.trim()).map_err(|source| {
        ConfigLoadError::InvalidPollInterval {
            value: pollinginterval.clone(),
            source,
        }
    })?;

    let defaults = NotificationsConfig::default();

    Ok(Config {
        metadata,
        log_dir: logdir,
        lock_file: lockfile,
        poll_interval,
        source,
        destinations: destination,
        exiftool: exiftool.unwrap_or_else(|| PathBuf::from(DEFAULT_EXIFTOOL)),
        notifications: NotificationsConfig {
            enabled: notifications.enabled.unwrap_or(defaults.enabled),
            command: notifications.command.unwrap_or(defaults.command),
        },
    })
}

#[derive(Debug, Default)]
struct ConfigPathSource {
    explicit: Option<PathBuf>,
    env: Option<PathBuf>,
    default: Option<PathBuf>,
}

impl ConfigPathSource {
    fn resolved_path(&self) -> Option<(PathBuf, ConfigPathProvenance)> {
        if let Some(path) = &self.explicit {
            return Some((path.clone(), ConfigPathProvenance::Explicit));
        }
        if let Some(path) = &self.env {
            return Some((path.clone(), ConfigPathProvenance::Env));
        }
        if let Some(path) = &self.default {
            return Some((path.clone(), ConfigPathProvenance::Default));
        }
        None
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConfigPathProvenance {
    Explicit,
    Env,
    Default,
}

impl ConfigPathProvenance {
    fn is_explicit(self) -> bool {
        matches!(self, ConfigPathProvenance::Explicit | ConfigPathProvenance::Env)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_path_wins_over_environment() {
        let dir = tempfile::tempdir().unwrap();
        let explicit = dir.path().join("explicit.toml");
        let from_env = dir.path().join("env.toml");
        fs::write(&explicit, "").unwrap();
        fs::write(&from_env, "").unwrap();

        let loader = ConfigLoader::new().with_config_path(&explicit);
        let env = EnvConfig {
            config_path: Some(from_env.clone()),
        };
        assert_eq!(loader.resolve_path(&env).unwrap(), explicit);

        let loader = ConfigLoader::new();
        assert_eq!(loader.resolve_path(&env).unwrap(), from_env);
    }

    #[test]
    fn missing_explicit_or_env_path_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let gone = dir.path().join("gone.toml");

        let err = ConfigLoader::new()
            .with_config_path(&gone)
            .resolve_path(&EnvConfig::default())
            .unwrap_err();
        assert!(matches!(err, ConfigLoadError::MissingConfig { path } if path == gone));

        let err = ConfigLoader::new()
            .resolve_path(&EnvConfig {
                config_path: Some(gone.clone()),
            })
            .unwrap_err();
        assert!(matches!(err, ConfigLoadError::MissingConfig { .. }));
    }

    #[test]
    fn poll_interval_accepts_compound_durations() {
        let file: FileConfig = toml::from_str(
            r#"
            logdir = "/var/log/shoebox"
            lockfile = "/run/shoebox.lock"
            pollinginterval = "1h30m"
            source = "/srv/inbox"
            destination = ["/srv/photos"]
            "#,
        )
        .unwrap();

        let config = compose_config(
            file,
            ConfigMetadata {
                config_path: "shoebox.toml".into(),
                env_file_loaded: false,
            },
        )
        .unwrap();

        assert_eq!(config.poll_interval.as_secs(), 90 * 60);
        assert_eq!(config.exiftool, PathBuf::from("exiftool"));
        assert_eq!(config.notifications, NotificationsConfig::default());
    }
}
