use std::path::PathBuf;

use clap::Parser;
use shoebox_config::{ConfigLoader, ConfigLoaderOptions};

/// CLI entry point
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "shoebox-agent", version)]
#[command(about = "Moves photos from a drop folder into backup directories")]
pub struct Cli {
    /// Path to the configuration file (TOML)
    #[arg(short, long, env = "SHOEBOX_CONFIG")]
    pub config: Option<PathBuf>,

    /// Path to a .env file loaded before the configuration
    #[arg(long, env = "SHOEBOX_ENV_FILE")]
    pub env_file: Option<PathBuf>,

    /// Mirror log output to stderr
    #[arg(long)]
    pub foreground: bool,

    /// Run a single poll cycle and exit
    #[arg(long)]
    pub once: bool,
}

impl Cli {
    pub fn config_loader(&self) -> ConfigLoader {
        ConfigLoader::with_options(ConfigLoaderOptions {
            config_path: self.config.clone(),
            env_file: self.env_file.clone(),
            skip_env_file: false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shoebox_config::{ConfigLoadError, EnvConfig};

    #[test]
    fn parses_flags() {
        let cli = Cli::try_parse_from([
            "shoebox-agent",
            "--config",
            "/etc/shoebox.toml",
            "--foreground",
            "--once",
        ])
        .unwrap();

        assert_eq!(cli.config, Some(PathBuf::from("/etc/shoebox.toml")));
        assert!(cli.foreground);
        assert!(cli.once);
        assert_eq!(cli.env_file, None);
    }

    #[test]
    fn loader_resolves_the_config_flag() {
        let cli =
            Cli::try_parse_from(["shoebox-agent", "--config", "/nonexistent/shoebox.toml"])
                .unwrap();

        let err = cli
            .config_loader()
            .resolve_path(&EnvConfig::default())
            .unwrap_err();
        match err {
            ConfigLoadError::MissingConfig { path } => {
                assert_eq!(path, PathBuf::from("/nonexistent/shoebox.toml"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn rejects_unknown_flags() {
        assert!(Cli::try_parse_from(["shoebox-agent", "--daemonize"]).is_err());
    }
}
