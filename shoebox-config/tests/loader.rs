use std::path::{Path, PathBuf};
use std::time::Duration;

use shoebox_config::{
    ConfigGuardRailError, ConfigLoad, ConfigLoadError, ConfigLoader, EnvConfig,
};
use tempfile::TempDir;

struct Workspace {
    dir: TempDir,
}

impl Workspace {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("inbox")).unwrap();
        std::fs::create_dir(dir.path().join("photos")).unwrap();
        std::fs::create_dir(dir.path().join("mirror")).unwrap();
        Self { dir }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    fn write(&self, contents: &str) -> PathBuf {
        let path = self.path("shoebox.toml");
        std::fs::write(&path, contents).unwrap();
        path
    }

    fn base(&self) -> String {
        format!(
            r#"
logdir = "{logs}"
lockfile = "{lock}"
pollinginterval = "5m"
source = "{inbox}"
destination = ["{photos}", "{mirror}"]
"#,
            logs = self.path("logs").display(),
            lock = self.path("shoebox.lock").display(),
            inbox = self.path("inbox").display(),
            photos = self.path("photos").display(),
            mirror = self.path("mirror").display(),
        )
    }
}

fn load(path: &Path) -> Result<ConfigLoad, ConfigLoadError> {
    ConfigLoader::new()
        .with_config_path(path)
        .without_env_file()
        .load_with_env(&EnvConfig::default(), false)
}

#[test]
fn loads_complete_configuration() {
    let ws = Workspace::new();
    let path = ws.write(&ws.base());

    let ConfigLoad { config, warnings } = load(&path).unwrap();

    assert_eq!(config.metadata.config_path, path);
    assert_eq!(config.log_dir, ws.path("logs"));
    assert_eq!(config.lock_file, ws.path("shoebox.lock"));
    assert_eq!(config.poll_interval, Duration::from_secs(300));
    assert_eq!(config.source, ws.path("inbox"));
    assert_eq!(
        config.destinations,
        vec![ws.path("photos"), ws.path("mirror")]
    );
    assert!(config.notifications.enabled);
    assert!(warnings.is_empty());

    let settings = config.backup_settings();
    assert_eq!(settings.destinations.len(), 2);
    assert_eq!(settings.poll_interval, Duration::from_secs(300));
}

#[test]
fn optional_sections_override_defaults() {
    let ws = Workspace::new();
    let path = ws.write(&format!(
        "{}exiftool = \"/opt/exiftool/exiftool\"\n\n[notifications]\nenabled = false\ncommand = \"dunstify\"\n",
        ws.base()
    ));

    let ConfigLoad { config, warnings } = load(&path).unwrap();

    assert_eq!(config.exiftool, PathBuf::from("/opt/exiftool/exiftool"));
    assert!(!config.notifications.enabled);
    assert_eq!(config.notifications.command, PathBuf::from("dunstify"));
    assert_eq!(warnings.items.len(), 1);
}

#[test]
fn unknown_keys_are_rejected() {
    let ws = Workspace::new();
    let path = ws.write(&format!("{}retries = 3\n", ws.base()));

    let err = load(&path).unwrap_err();

    assert!(matches!(err, ConfigLoadError::Parse { .. }));
}

#[test]
fn every_backup_key_is_required() {
    let ws = Workspace::new();
    let base = ws.base();

    for key in ["logdir", "lockfile", "pollinginterval", "source", "destination"] {
        let trimmed: String = base
            .lines()
            .filter(|line| !line.starts_with(&format!("{key} =")))
            .map(|line| format!("{line}\n"))
            .collect();
        let path = ws.write(&trimmed);

        let err = load(&path).unwrap_err();
        match err {
            ConfigLoadError::Parse { source, .. } => {
                assert!(source.to_string().contains(key), "{key}: {source}");
            }
            other => panic!("{key}: unexpected error {other:?}"),
        }
    }
}

#[test]
fn malformed_interval_is_reported_with_its_value() {
    let ws = Workspace::new();
    let path = ws.write(&ws.base().replace("\"5m\"", "\"soon\""));

    let err = load(&path).unwrap_err();

    match err {
        ConfigLoadError::InvalidPollInterval { value, .. } => assert_eq!(value, "soon"),
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn zero_interval_trips_guard_rail() {
    let ws = Workspace::new();
    let path = ws.write(&ws.base().replace("\"5m\"", "\"0s\""));

    let err = load(&path).unwrap_err();

    assert!(matches!(
        err,
        ConfigLoadError::Invalid(ConfigGuardRailError::ZeroPollInterval)
    ));
}

#[test]
fn destination_must_differ_from_source() {
    let ws = Workspace::new();
    let inbox = ws.path("inbox").display().to_string();
    let path = ws.write(&ws.base().replace(
        &format!("\"{}\"]", ws.path("mirror").display()),
        &format!("\"{inbox}\"]"),
    ));

    let err = load(&path).unwrap_err();

    assert!(matches!(
        err,
        ConfigLoadError::Invalid(ConfigGuardRailError::DestinationIsSource { .. })
    ));
}

#[test]
fn explicit_path_that_does_not_exist_is_missing() {
    let ws = Workspace::new();

    let err = load(&ws.path("absent.toml")).unwrap_err();

    assert!(matches!(err, ConfigLoadError::MissingConfig { .. }));
}

#[test]
fn environment_path_is_used_without_explicit_option() {
    let ws = Workspace::new();
    let path = ws.write(&ws.base());
    let env = EnvConfig {
        config_path: Some(path.clone()),
    };

    let load = ConfigLoader::new()
        .without_env_file()
        .load_with_env(&env, false)
        .unwrap();

    assert_eq!(load.config.metadata.config_path, path);
}
