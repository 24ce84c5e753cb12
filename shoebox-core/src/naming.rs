//! Destination file names.
//!
//! Names have the form `YYYYMMDD_HHMMSS-<crc32 hex>.<ext>`. The format is an
//! on-disk contract: reprocessing the same file must yield the same name.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Local, NaiveDateTime};
use tokio::fs::File;
use tokio::io::AsyncReadExt;
use tracing::warn;

use crate::error::{BackupError, Result};
use crate::metadata::MetadataExtractor;

pub const DESTINATION_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

const TIMESTAMP_LEN: usize = 15;
const CHECKSUM_HEX_LEN: usize = 8;
const CHECKSUM_BUFFER_SIZE: usize = 64 * 1024;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DestinationName {
    captured_at: NaiveDateTime,
    checksum: u32,
    extension: String,
}

impl DestinationName {
    pub fn new(captured_at: NaiveDateTime, checksum: u32, extension: &str) -> Self {
        Self {
            captured_at,
            checksum,
            extension: extension.to_lowercase(),
        }
    }

    /// Parse a file name previously produced by this type. Returns `None`
    /// for anything else.
    pub fn parse(file_name: &str) -> Option<Self> {
        let (base, extension) = file_name.rsplit_once('.')?;
        let (timestamp, checksum) = base.split_once('-')?;

        if timestamp.len() != TIMESTAMP_LEN
            || checksum.len() != CHECKSUM_HEX_LEN
            || extension.is_empty()
            || extension.chars().any(|c| c.is_ascii_uppercase())
        {
            return None;
        }

        let captured_at =
            NaiveDateTime::parse_from_str(timestamp, DESTINATION_TIMESTAMP_FORMAT).ok()?;
        let checksum = u32::from_str_radix(checksum, 16).ok()?;

        Some(Self {
            captured_at,
            checksum,
            extension: extension.to_string(),
        })
    }

    pub fn captured_at(&self) -> NaiveDateTime {
        self.captured_at
    }

    pub fn checksum(&self) -> u32 {
        self.checksum
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }
}

impl fmt::Display for DestinationName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{:08x}.{}",
            self.captured_at.format(DESTINATION_TIMESTAMP_FORMAT),
            self.checksum,
            self.extension
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimestampSource {
    Metadata,
    ModificationTime,
}

/// Everything the namer learned about one file. Never cached across polls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureRecord {
    pub captured_at: NaiveDateTime,
    pub timestamp_source: TimestampSource,
    pub extension: String,
    pub checksum: u32,
}

impl CaptureRecord {
    pub fn destination_name(&self) -> DestinationName {
        DestinationName::new(self.captured_at, self.checksum, &self.extension)
    }
}

#[derive(Clone)]
pub struct DestinationNamer {
    extractor: Arc<dyn MetadataExtractor>,
}

impl fmt::Debug for DestinationNamer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DestinationNamer").finish_non_exhaustive()
    }
}

impl DestinationNamer {
    pub fn new(extractor: Arc<dyn MetadataExtractor>) -> Self {
        Self { extractor }
    }

    pub async fn name_for(&self, path: &Path) -> Result<DestinationName> {
        Ok(self.capture_record(path).await?.destination_name())
    }

    /// Checksum the file, then resolve its capture time and extension.
    ///
    /// A missing capture date falls back to the modification time. A missing
    /// extension fails the whole lookup: guessing it could mislabel the type.
    pub async fn capture_record(&self, path: &Path) -> Result<CaptureRecord> {
        let checksum = file_checksum(path)
            .await
            .map_err(|source| BackupError::Checksum {
                path: path.to_path_buf(),
                source,
            })?;

        let (captured_at, timestamp_source) = match self.extractor.capture_date(path).await {
            Ok(date) => (date, TimestampSource::Metadata),
            Err(err) => {
                warn!(
                    target: "backup::naming",
                    path = %path.display(),
                    error = %err,
                    "unable to obtain EXIF date, using modification time"
                );
                (modification_time(path).await?, TimestampSource::ModificationTime)
            }
        };

        let extension = self.extractor.canonical_extension(path).await?;

        Ok(CaptureRecord {
            captured_at,
            timestamp_source,
            extension: extension.to_lowercase(),
            checksum,
        })
    }
}

/// CRC-32 (IEEE) over the full file contents.
pub async fn file_checksum(path: &Path) -> std::io::Result<u32> {
    let mut file = File::open(path).await?;
    let mut hasher = crc32fast::Hasher::new();
    let mut buffer = vec![0u8; CHECKSUM_BUFFER_SIZE];

    loop {
        let read = file.read(&mut buffer).await?;
        if read == 0 {
            break;
        }
        hasher.update(&buffer[..read]);
    }

    Ok(hasher.finalize())
}

async fn modification_time(path: &Path) -> std::io::Result<NaiveDateTime> {
    let modified = tokio::fs::metadata(path).await?.modified()?;
    Ok(DateTime::<Local>::from(modified).naive_local())
}
