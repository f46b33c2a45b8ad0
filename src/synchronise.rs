//! The upload pipeline: discover ready files, derive keys, upload, clean up.
//!
//! One call to [`run`] is one batch: candidates are gathered once, then
//! processed sequentially, each attempted exactly once. Failures are isolated
//! at the file boundary - a rejected upload is logged, counted, and the batch
//! moves on. A failed local deletion after a successful upload is logged but
//! never demotes the file to failed, since the object is already stored.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{error, info, warn};

use crate::discover::{self, CandidateFile};
use crate::keymap;
use crate::storage::ObjectStore;

/// Parameters for a single synchronisation run.
#[derive(Debug, Clone)]
pub struct SyncParams {
    pub source_dir: PathBuf,
    /// Glob-style filename pattern selecting recorder files.
    pub pattern: String,
    /// Files modified strictly before this instant are uploaded.
    pub cutoff: DateTime<Utc>,
    pub bucket: String,
    /// Delete the local file after a successful upload.
    pub cleanup_source: bool,
}

/// Per-file result of one upload attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadOutcome {
    Succeeded,
    FailedUpload,
    /// The object was stored but the local copy could not be deleted.
    FailedLocalCleanup,
}

/// Aggregate result of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    /// Files safely stored in the bucket, including those whose local
    /// cleanup failed.
    pub succeeded: usize,
    pub total: usize,
}

/// Failure deleting a local file after upload.
#[derive(Debug, Error)]
pub enum LocalIoError {
    #[error("file not found: {0:?}")]
    NotFound(PathBuf),
    #[error("permission denied: {0:?}")]
    PermissionDenied(PathBuf),
    #[error("{path:?}: {source}")]
    Other {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Run one batch: every ready file is attempted exactly once and the batch
/// never aborts early because of a per-file error.
pub async fn run<S: ObjectStore>(params: &SyncParams, store: &S) -> RunSummary {
    let candidates = discover::select_ready(&params.source_dir, &params.pattern, params.cutoff);
    info!(
        source_dir = %params.source_dir.display(),
        cutoff = %params.cutoff,
        count = candidates.len(),
        "Selected ready files"
    );

    let total = candidates.len();
    let mut succeeded = 0;
    for candidate in &candidates {
        match process_file(candidate, params, store).await {
            UploadOutcome::Succeeded | UploadOutcome::FailedLocalCleanup => succeeded += 1,
            UploadOutcome::FailedUpload => {}
        }
    }

    info!(succeeded, total, bucket = %params.bucket, "Uploaded {succeeded}/{total} files");
    RunSummary { succeeded, total }
}

async fn process_file<S: ObjectStore>(
    candidate: &CandidateFile,
    params: &SyncParams,
    store: &S,
) -> UploadOutcome {
    info!(path = %candidate.path.display(), "Preparing upload");

    let Some(file_name) = candidate.path.file_name().and_then(|n| n.to_str()) else {
        error!(path = %candidate.path.display(), "File name is not valid UTF-8, skipping");
        return UploadOutcome::FailedUpload;
    };
    let key = keymap::derive_key(file_name);

    info!(bucket = %params.bucket, key = %key, "Uploading...");
    if let Err(e) = store.put_file(&params.bucket, &key, &candidate.path).await {
        error!(error = %e, path = %candidate.path.display(), "...failed uploading file");
        return UploadOutcome::FailedUpload;
    }
    info!(key = %key, "...success");

    if params.cleanup_source {
        if let Err(e) = remove_source(&candidate.path) {
            warn!(error = %e, path = %candidate.path.display(), "Uploaded, but local cleanup failed");
            return UploadOutcome::FailedLocalCleanup;
        }
        info!(path = %candidate.path.display(), "Local file deleted");
    }
    UploadOutcome::Succeeded
}

fn remove_source(path: &Path) -> Result<(), LocalIoError> {
    fs::remove_file(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => LocalIoError::NotFound(path.to_path_buf()),
        io::ErrorKind::PermissionDenied => LocalIoError::PermissionDenied(path.to_path_buf()),
        _ => LocalIoError::Other {
            path: path.to_path_buf(),
            source: e,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remove_source_maps_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let gone = dir.path().join("missing.dat");
        let err = remove_source(&gone).unwrap_err();
        assert!(matches!(err, LocalIoError::NotFound(_)));
    }
}
