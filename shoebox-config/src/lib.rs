//! Configuration library for Shoebox.
//!
//! Reads the agent's TOML file, resolves its location (explicit path,
//! `SHOEBOX_CONFIG`, or the default candidates), applies guard rails, and
//! hands out typed settings for the backup routine.

pub mod loader;
pub mod models;
pub mod validation;

pub use loader::{ConfigLoad, ConfigLoader, ConfigLoaderOptions, error::ConfigLoadError};
pub use models::sources::{EnvConfig, FileConfig, FileNotificationsConfig};
pub use models::{Config, ConfigMetadata, NotificationsConfig};
pub use validation::{ConfigGuardRailError, ConfigWarning, ConfigWarnings};
