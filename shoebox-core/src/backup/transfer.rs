use std::path::Path;

use tokio::fs::{self, File};
use tokio::io::AsyncWriteExt;
use tracing::warn;

use crate::error::{BackupError, CopyStage, Result};

/// File names that are never touched, compared case-insensitively.
pub const BLACKLISTED_FILE_NAMES: &[&str] = &["thumbs.db", "desktop.ini"];

pub fn is_blacklisted(file_name: &str) -> bool {
    BLACKLISTED_FILE_NAMES
        .iter()
        .any(|blocked| file_name.eq_ignore_ascii_case(blocked))
}

/// Stream `source` into `destination` and force it to stable storage.
///
/// An existing destination is overwritten. When any step after creating the
/// destination fails, the partial file is removed before returning.
pub async fn copy_file(source: &Path, destination: &Path) -> Result<u64> {
    let copy_error = |stage, err| BackupError::Copy {
        from: source.to_path_buf(),
        to: destination.to_path_buf(),
        stage,
        source: err,
    };

    let mut reader = File::open(source)
        .await
        .map_err(|err| copy_error(CopyStage::OpenSource, err))?;
    let mut writer = File::create(destination)
        .await
        .map_err(|err| copy_error(CopyStage::CreateDestination, err))?;

    let result = async {
        let bytes = tokio::io::copy(&mut reader, &mut writer)
            .await
            .map_err(|err| (CopyStage::Stream, err))?;
        writer.flush().await.map_err(|err| (CopyStage::Stream, err))?;
        writer.sync_all().await.map_err(|err| (CopyStage::Sync, err))?;
        Ok::<_, (CopyStage, std::io::Error)>(bytes)
    }
    .await;

    match result {
        Ok(bytes) => Ok(bytes),
        Err((stage, err)) => {
            drop(writer);
            if let Err(cleanup) = fs::remove_file(destination).await {
                warn!(
                    target: "backup::file",
                    path = %destination.display(),
                    error = %cleanup,
                    "unable to remove partial destination file"
                );
            }
            Err(copy_error(stage, err))
        }
    }
}
