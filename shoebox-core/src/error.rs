use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::marker::MarkerError;
use crate::metadata::MetadataError;

#[derive(Error, Debug)]
pub enum BackupError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("unable to access source directory {path}: {source}")]
    Listing {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("metadata error: {0}")]
    Metadata(#[from] MetadataError),

    #[error("unable to compute checksum for {path}: {source}")]
    Checksum {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unable to {stage} while copying {from} to {to}: {source}")]
    Copy {
        from: PathBuf,
        to: PathBuf,
        stage: CopyStage,
        #[source]
        source: std::io::Error,
    },

    #[error("unable to remove source file {path} after backup: {source}")]
    RemoveSource {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unable to remove duplicate {path}: {source}")]
    RemoveDuplicate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Exclusivity(#[from] MarkerError),
}

/// Step of the copy pipeline that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyStage {
    OpenSource,
    CreateDestination,
    Stream,
    Sync,
}

impl fmt::Display for CopyStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let stage = match self {
            CopyStage::OpenSource => "open source file",
            CopyStage::CreateDestination => "create destination file",
            CopyStage::Stream => "stream file contents",
            CopyStage::Sync => "synchronize destination to disk",
        };
        f.write_str(stage)
    }
}

pub type Result<T> = std::result::Result<T, BackupError>;
