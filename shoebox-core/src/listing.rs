use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::{debug, warn};

/// Snapshot of one regular file taken at the start of a poll cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    pub name: String,
    pub path: PathBuf,
}

impl FileEntry {
    /// Lowercase extension without the dot.
    pub fn extension(&self) -> Option<String> {
        self.path
            .extension()
            .map(|ext| ext.to_string_lossy().to_lowercase())
    }

    pub fn stem(&self) -> Option<&str> {
        self.path.file_stem().and_then(|stem| stem.to_str())
    }
}

/// List the regular files directly inside `dir`, sorted by name.
///
/// Directories are ignored. Entries that vanish or cannot be stat'd between
/// the directory read and the stat are skipped with a warning; only a failure
/// to read the directory itself is an error.
pub async fn list_directory(dir: &Path) -> std::io::Result<Vec<FileEntry>> {
    let dir = std::path::absolute(dir)?;
    let mut reader = fs::read_dir(&dir).await?;
    let mut entries = Vec::new();

    while let Some(entry) = reader.next_entry().await? {
        let path = entry.path();
        let metadata = match fs::metadata(&path).await {
            Ok(metadata) => metadata,
            Err(err) => {
                warn!(target: "backup::listing", path = %path.display(), error = %err, "unable to stat directory entry");
                continue;
            }
        };

        if !metadata.is_file() {
            debug!(target: "backup::listing", path = %path.display(), "skipping non-file entry");
            continue;
        }

        entries.push(FileEntry {
            name: entry.file_name().to_string_lossy().into_owned(),
            path,
        });
    }

    entries.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(entries)
}
