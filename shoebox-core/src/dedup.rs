//! JPEG/HEIC duplicate resolution.
//!
//! Phones that export both a HEIC original and a JPEG companion produce two
//! files for one photo. When both exist with the same capture time the JPEG is
//! removed and the HEIC is kept.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::fs;
use tracing::{debug, info, warn};

use crate::error::{BackupError, Result};
use crate::listing::FileEntry;
use crate::metadata::MetadataExtractor;
use crate::naming::DestinationName;

pub const JPEG_EXTENSION: &str = "jpg";
pub const HEIC_EXTENSION: &str = "heic";

/// Which side of a JPEG/HEIC pair a file is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairKind {
    Jpeg,
    Heic,
}

impl PairKind {
    pub fn from_extension(extension: &str) -> Option<Self> {
        if extension.eq_ignore_ascii_case(JPEG_EXTENSION) {
            Some(PairKind::Jpeg)
        } else if extension.eq_ignore_ascii_case(HEIC_EXTENSION) {
            Some(PairKind::Heic)
        } else {
            None
        }
    }

    pub fn of_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
    }

    pub fn counterpart(self) -> Self {
        match self {
            PairKind::Jpeg => PairKind::Heic,
            PairKind::Heic => PairKind::Jpeg,
        }
    }
}

/// Result of pruning one listing.
#[derive(Debug, Default)]
pub struct Pruned {
    /// Entries that continue to normal processing, in listing order.
    pub kept: Vec<FileEntry>,
    /// JPEG companions deleted from the source directory.
    pub removed: Vec<PathBuf>,
}

#[derive(Clone)]
pub struct DuplicateResolver {
    extractor: Arc<dyn MetadataExtractor>,
}

impl fmt::Debug for DuplicateResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DuplicateResolver").finish_non_exhaustive()
    }
}

impl DuplicateResolver {
    pub fn new(extractor: Arc<dyn MetadataExtractor>) -> Self {
        Self { extractor }
    }

    /// Delete every JPEG whose same-stem HEIC has an equal capture date and
    /// return the remaining listing.
    ///
    /// A capture-date lookup failure aborts the whole pass so no pair in the
    /// batch is judged on partial information. A JPEG that cannot be deleted
    /// is held back from this cycle rather than copied.
    pub async fn prune(&self, listing: Vec<FileEntry>) -> Result<Pruned> {
        let mut removed = Vec::new();
        let mut held_back = HashSet::new();

        let heic_by_stem: HashMap<&str, &FileEntry> = listing
            .iter()
            .filter(|entry| kind_of(entry) == Some(PairKind::Heic))
            .filter_map(|entry| entry.stem().map(|stem| (stem, entry)))
            .collect();

        for jpeg in listing
            .iter()
            .filter(|entry| kind_of(entry) == Some(PairKind::Jpeg))
        {
            let Some(heic) = jpeg.stem().and_then(|stem| heic_by_stem.get(stem)) else {
                continue;
            };

            if !fs::try_exists(&heic.path).await.unwrap_or(false) {
                debug!(target: "backup::dedup", heic = %heic.path.display(), "HEIC counterpart vanished, keeping JPEG");
                continue;
            }

            let jpeg_date = self.extractor.capture_date(&jpeg.path).await?;
            let heic_date = self.extractor.capture_date(&heic.path).await?;

            if jpeg_date != heic_date {
                debug!(
                    target: "backup::dedup",
                    jpeg = %jpeg.name,
                    heic = %heic.name,
                    %jpeg_date,
                    %heic_date,
                    "same stem but different capture time, keeping both"
                );
                continue;
            }

            match fs::remove_file(&jpeg.path).await {
                Ok(()) => {
                    info!(target: "backup::dedup", jpeg = %jpeg.name, heic = %heic.name, "removed duplicate JPEG");
                    removed.push(jpeg.path.clone());
                }
                Err(err) => {
                    warn!(
                        target: "backup::dedup",
                        jpeg = %jpeg.name,
                        error = %err,
                        "unable to remove duplicate JPEG, deferring it to the next cycle"
                    );
                    held_back.insert(jpeg.path.clone());
                }
            }
        }

        let kept = listing
            .into_iter()
            .filter(|entry| !removed.contains(&entry.path) && !held_back.contains(&entry.path))
            .collect();

        Ok(Pruned { kept, removed })
    }

    /// Post-copy check for a file that just landed in a destination directory.
    ///
    /// Companions are destination files with the same name timestamp and the
    /// opposite extension. When a companion's capture date equals the landed
    /// file's, the JPEG side is deleted: the landed file itself when it is the
    /// JPEG, otherwise every matching JPEG companion. Returns the deleted
    /// paths. Running the check again on the same directory deletes nothing.
    pub async fn check_destination(&self, landed: &Path) -> Result<Vec<PathBuf>> {
        let mut removed = Vec::new();
        let Some(kind) = PairKind::of_path(landed) else {
            return Ok(removed);
        };
        let Some(landed_name) = landed
            .file_name()
            .and_then(|name| name.to_str())
            .and_then(DestinationName::parse)
        else {
            return Ok(removed);
        };
        let Some(dir) = landed.parent() else {
            return Ok(removed);
        };

        let companions = find_companions(dir, &landed_name, kind.counterpart()).await?;
        if companions.is_empty() {
            return Ok(removed);
        }

        let landed_date = self.extractor.capture_date(landed).await?;

        for companion in companions {
            let companion_date = self.extractor.capture_date(&companion).await?;
            if companion_date != landed_date {
                continue;
            }

            let jpeg = match kind {
                PairKind::Jpeg => landed.to_path_buf(),
                PairKind::Heic => companion,
            };
            fs::remove_file(&jpeg)
                .await
                .map_err(|source| BackupError::RemoveDuplicate {
                    path: jpeg.clone(),
                    source,
                })?;
            info!(target: "backup::dedup", jpeg = %jpeg.display(), "removed duplicate JPEG from destination");
            removed.push(jpeg);

            if kind == PairKind::Jpeg {
                break;
            }
        }

        Ok(removed)
    }
}

fn kind_of(entry: &FileEntry) -> Option<PairKind> {
    entry
        .extension()
        .as_deref()
        .and_then(PairKind::from_extension)
}

async fn find_companions(
    dir: &Path,
    landed: &DestinationName,
    wanted: PairKind,
) -> Result<Vec<PathBuf>> {
    let mut reader = fs::read_dir(dir).await?;
    let mut companions = Vec::new();

    while let Some(entry) = reader.next_entry().await? {
        let file_name = entry.file_name();
        let Some(parsed) = file_name.to_str().and_then(DestinationName::parse) else {
            continue;
        };
        if parsed.captured_at() == landed.captured_at()
            && PairKind::from_extension(parsed.extension()) == Some(wanted)
        {
            companions.push(entry.path());
        }
    }

    companions.sort();
    Ok(companions)
}
