//! The single output directory converted files land in.
//!
//! Every file is written to a uniquely named temporary file inside the output
//! directory and then renamed over its final name, so a failed write never
//! leaves a truncated `.webp` behind and an existing file is replaced
//! atomically.

use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::error::{BatchError, PipelineError, PipelineResult};

/// Output directory handle.
#[derive(Debug, Clone)]
pub struct OutputDirectory {
    path: PathBuf,
}

impl OutputDirectory {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create the directory if needed and prove it is writable.
    ///
    /// Called once per batch before any file is processed.
    pub fn prepare(&self) -> Result<(), BatchError> {
        if self.path.exists() && !self.path.is_dir() {
            return Err(BatchError::NotADirectory(self.path.clone()));
        }

        std::fs::create_dir_all(&self.path).map_err(|source| BatchError::CreateOutputDir {
            path: self.path.clone(),
            source,
        })?;

        // The canary file is removed when dropped
        let mut canary = tempfile::Builder::new()
            .prefix(".shrink-canary")
            .tempfile_in(&self.path)
            .map_err(|source| BatchError::OutputDirNotWritable {
                path: self.path.clone(),
                source,
            })?;
        canary
            .write_all(b"ok")
            .map_err(|source| BatchError::OutputDirNotWritable {
                path: self.path.clone(),
                source,
            })?;

        tracing::debug!("Output directory ready: {:?}", self.path);
        Ok(())
    }

    /// Final path for an input with the given stem.
    pub fn target_path(&self, stem: &str, extension: &str) -> PathBuf {
        self.path.join(format!("{}.{}", stem, extension))
    }

    /// Write `bytes` to `target`, replacing any existing file.
    ///
    /// Returns the number of bytes on disk.
    pub fn write_atomic(&self, target: &Path, bytes: &[u8]) -> PipelineResult<u64> {
        let write_err = |source: std::io::Error| PipelineError::Write {
            path: target.to_path_buf(),
            source,
        };

        let mut staging = tempfile::Builder::new()
            .prefix(".shrink-")
            .suffix(".part")
            .tempfile_in(&self.path)
            .map_err(write_err)?;
        staging.write_all(bytes).map_err(write_err)?;
        staging.as_file().sync_all().map_err(write_err)?;

        let file = persist(staging, target).map_err(write_err)?;
        let written = file.metadata().map_err(write_err)?.len();
        Ok(written)
    }
}

fn persist(staging: NamedTempFile, target: &Path) -> std::io::Result<std::fs::File> {
    // On failure the error hands the temp file back; dropping it deletes it.
    staging.persist(target).map_err(|e| e.error)
}
