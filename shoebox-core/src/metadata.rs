//! Capture-date and file-type lookup.
//!
//! The orchestrator only depends on [`MetadataExtractor`]. [`ExifTool`] is the
//! production implementation and shells out to `exiftool`.

use std::path::{Path, PathBuf};
use std::process::ExitStatus;

use async_trait::async_trait;
use chrono::NaiveDateTime;
use thiserror::Error;
use tokio::process::Command;
use tracing::debug;

/// Date format requested from exiftool and parsed back.
pub const CAPTURE_DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

const CAPTURE_DATE_LEN: usize = 19;

#[derive(Error, Debug)]
pub enum MetadataError {
    #[error("unable to run {tool}: {source}")]
    Spawn {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{tool} exited with {status}: {stderr}")]
    ToolFailed {
        tool: String,
        status: ExitStatus,
        stderr: String,
    },

    #[error("no {field} available for {path}")]
    Missing { field: &'static str, path: PathBuf },

    #[error("invalid date/time format \"{0}\"")]
    InvalidDate(String),
}

/// Source of capture timestamps and canonical extensions.
///
/// Timestamps are naive wall-clock values, as embedded by cameras.
#[async_trait]
pub trait MetadataExtractor: Send + Sync {
    async fn capture_date(&self, path: &Path) -> Result<NaiveDateTime, MetadataError>;

    /// Lowercase extension without the leading dot, e.g. `heic`.
    async fn canonical_extension(&self, path: &Path) -> Result<String, MetadataError>;
}

#[derive(Debug, Clone)]
pub struct ExifTool {
    binary: PathBuf,
}

impl Default for ExifTool {
    fn default() -> Self {
        Self::new("exiftool")
    }
}

impl ExifTool {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    /// Run exiftool in tab-delimited mode and return its stdout.
    async fn query(&self, path: &Path, args: &[&str]) -> Result<String, MetadataError> {
        let tool = self.binary.display().to_string();
        let output = Command::new(&self.binary)
            .arg("-T")
            .args(args)
            .arg(path)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|source| MetadataError::Spawn {
                tool: tool.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(MetadataError::ToolFailed {
                tool,
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[async_trait]
impl MetadataExtractor for ExifTool {
    async fn capture_date(&self, path: &Path) -> Result<NaiveDateTime, MetadataError> {
        let raw = self
            .query(path, &["-CreateDate", "-d", CAPTURE_DATE_FORMAT])
            .await?;
        debug!(target: "metadata", path = %path.display(), raw = raw.trim(), "exiftool create date");
        parse_capture_date(&raw)
    }

    async fn canonical_extension(&self, path: &Path) -> Result<String, MetadataError> {
        let raw = self.query(path, &["-FileTypeExtension"]).await?;
        parse_extension(&raw).ok_or_else(|| MetadataError::Missing {
            field: "file type extension",
            path: path.to_path_buf(),
        })
    }
}

/// Parse the leading `YYYY-MM-DDTHH:MM:SS` of an exiftool date value.
pub fn parse_capture_date(raw: &str) -> Result<NaiveDateTime, MetadataError> {
    let trimmed = raw.trim();
    let prefix = trimmed
        .get(..CAPTURE_DATE_LEN)
        .ok_or_else(|| MetadataError::InvalidDate(trimmed.to_string()))?;

    NaiveDateTime::parse_from_str(prefix, CAPTURE_DATE_FORMAT)
        .map_err(|_| MetadataError::InvalidDate(trimmed.to_string()))
}

/// Normalise an exiftool extension value. exiftool prints `-` for tags it
/// could not determine.
pub fn parse_extension(raw: &str) -> Option<String> {
    let extension = raw.trim().trim_start_matches('.').to_lowercase();
    if extension.is_empty() || extension == "-" {
        None
    } else {
        Some(extension)
    }
}
