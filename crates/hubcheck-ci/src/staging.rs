//! Staging of changed files into a local directory.
//!
//! Each file is fetched once and written as `<staging>/<file name>`. A failed
//! fetch is recorded as a parse finding for that file; the rest of the batch
//! is still staged. Downloads are sequential and never retried.

use std::path::{Path, PathBuf};

use hubcheck_core::{file_name, ErrorKind, ErrorReport, ValidationError};
use tracing::{info, warn};

use crate::error::Result;
use crate::provider::ChangedFile;

/// Files written to the staging directory plus the ones that failed.
#[derive(Debug, Default)]
pub struct StagedFiles {
    pub paths: Vec<PathBuf>,
    pub failures: ErrorReport,
}

/// Download `files` into `dir`, creating it if needed.
///
/// Only errors creating the directory itself abort staging.
pub async fn stage_files(dir: &Path, files: &[&dyn ChangedFile]) -> Result<StagedFiles> {
    tokio::fs::create_dir_all(dir).await?;

    let mut staged = StagedFiles::default();
    for file in files {
        let name = file_name(file.path()).to_string();
        let target = dir.join(&name);

        let outcome = match file.raw_content().await {
            Ok(bytes) => tokio::fs::write(&target, bytes)
                .await
                .map_err(|e| format!("could not write staged copy: {e}")),
            Err(e) => Err(format!("could not download file: {e}")),
        };

        match outcome {
            Ok(()) => {
                info!(file = %name, "Staged");
                staged.paths.push(target);
            }
            Err(reason) => {
                warn!(file = %name, %reason, "Staging failed");
                staged
                    .failures
                    .push(ValidationError::new(name, ErrorKind::Parse, reason));
            }
        }
    }

    Ok(staged)
}
