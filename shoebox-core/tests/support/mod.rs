#![allow(dead_code)]

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use shoebox_core::{
    BackupOrchestrator, BackupSettings, ExclusivityMarker, MetadataError, MetadataExtractor,
    Notifier, Severity, ShutdownSignal,
};
use tempfile::TempDir;

pub fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, mo, d)
        .unwrap()
        .and_hms_opt(h, mi, s)
        .unwrap()
}

#[derive(Debug, Clone, Default)]
struct Fixture {
    captured_at: Option<NaiveDateTime>,
    extension: Option<String>,
}

type LookupHook = Box<dyn Fn(&Path) + Send + Sync>;

/// Metadata keyed by file contents, so copies in a destination answer the
/// same way as their source.
#[derive(Default)]
pub struct FixtureExtractor {
    fixtures: Mutex<HashMap<Vec<u8>, Fixture>>,
    hooks: Mutex<Vec<LookupHook>>,
}

impl std::fmt::Debug for FixtureExtractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FixtureExtractor")
            .field("fixtures", &self.fixtures.lock().unwrap().len())
            .field("hooks", &self.hooks.lock().unwrap().len())
            .finish()
    }
}

impl FixtureExtractor {
    /// Run `hook` with the path of every metadata lookup, before the file is
    /// read.
    pub fn on_lookup(&self, hook: impl Fn(&Path) + Send + Sync + 'static) {
        self.hooks.lock().unwrap().push(Box::new(hook));
    }

    pub fn photo(&self, contents: &[u8], captured_at: NaiveDateTime, extension: &str) {
        self.insert(contents, Some(captured_at), Some(extension));
    }

    pub fn insert(
        &self,
        contents: &[u8],
        captured_at: Option<NaiveDateTime>,
        extension: Option<&str>,
    ) {
        self.fixtures.lock().unwrap().insert(
            contents.to_vec(),
            Fixture {
                captured_at,
                extension: extension.map(str::to_string),
            },
        );
    }

    async fn lookup(&self, path: &Path) -> Fixture {
        for hook in self.hooks.lock().unwrap().iter() {
            hook(path);
        }
        let contents = tokio::fs::read(path).await.unwrap_or_default();
        self.fixtures
            .lock()
            .unwrap()
            .get(&contents)
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait]
impl MetadataExtractor for FixtureExtractor {
    async fn capture_date(&self, path: &Path) -> Result<NaiveDateTime, MetadataError> {
        self.lookup(path)
            .await
            .captured_at
            .ok_or_else(|| MetadataError::Missing {
                field: "create date",
                path: path.to_path_buf(),
            })
    }

    async fn canonical_extension(&self, path: &Path) -> Result<String, MetadataError> {
        self.lookup(path)
            .await
            .extension
            .ok_or_else(|| MetadataError::Missing {
                field: "file type extension",
                path: path.to_path_buf(),
            })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sent {
    pub severity: Severity,
    pub title: String,
    pub body: String,
}

#[derive(Debug, Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<Sent>>,
}

impl RecordingNotifier {
    pub fn sent(&self) -> Vec<Sent> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, severity: Severity, title: &str, body: &str) {
        self.sent.lock().unwrap().push(Sent {
            severity,
            title: title.to_string(),
            body: body.to_string(),
        });
    }
}

/// Source, destination, and lock file in one temporary tree.
pub struct Harness {
    pub root: TempDir,
    pub source: PathBuf,
    pub destinations: Vec<PathBuf>,
    pub extractor: Arc<FixtureExtractor>,
    pub notifier: Arc<RecordingNotifier>,
    pub shutdown: ShutdownSignal,
    pub marker: Arc<ExclusivityMarker>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_destinations(1)
    }

    pub fn with_destinations(count: usize) -> Self {
        let root = tempfile::tempdir().unwrap();
        let source = root.path().join("camera");
        std::fs::create_dir(&source).unwrap();

        let destinations = (0..count)
            .map(|index| {
                let dir = root.path().join(format!("backup-{index}"));
                std::fs::create_dir(&dir).unwrap();
                dir
            })
            .collect();

        let marker = ExclusivityMarker::acquire(root.path().join("shoebox.lock")).unwrap();

        Self {
            root,
            source,
            destinations,
            extractor: Arc::new(FixtureExtractor::default()),
            notifier: Arc::new(RecordingNotifier::default()),
            shutdown: ShutdownSignal::new(),
            marker: Arc::new(marker),
        }
    }

    pub fn orchestrator(&self, poll_interval: Duration) -> BackupOrchestrator {
        BackupOrchestrator::new(
            BackupSettings {
                source: self.source.clone(),
                destinations: self.destinations.clone(),
                poll_interval,
            },
            self.extractor.clone(),
            self.notifier.clone(),
            self.shutdown.clone(),
            Arc::clone(&self.marker),
        )
    }

    pub fn drop_file(&self, name: &str, contents: &[u8]) -> PathBuf {
        let path = self.source.join(name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    pub fn destination(&self) -> &Path {
        &self.destinations[0]
    }
}

/// File names directly inside `dir`, sorted.
pub fn names_in(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

pub fn expected_name(captured_at: NaiveDateTime, contents: &[u8], extension: &str) -> String {
    format!(
        "{}-{:08x}.{}",
        captured_at.format("%Y%m%d_%H%M%S"),
        crc32fast::hash(contents),
        extension
    )
}
