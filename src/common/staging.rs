//! Ephemeral staging for documents that do not come from a file, such as
//! standard input.
//!
//! A staged document lives in its own temporary directory for the duration of
//! one scan. The directory is removed when the [`StagedDocument`] is released
//! or dropped, including on error paths. Cleanup failures are logged and never
//! surfaced.

use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use log::{debug, warn};
use tempfile::TempDir;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StagingError {
    #[error("cannot create staging directory: {0}")]
    CreateDir(#[source] std::io::Error),

    #[error("cannot write staged document {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot read input: {0}")]
    Read(#[source] std::io::Error),
}

/// A document written to a private temporary directory.
#[derive(Debug)]
pub struct StagedDocument {
    dir: Option<TempDir>,
    path: PathBuf,
}

impl StagedDocument {
    /// Write `bytes` to a fresh temporary directory under `file_name`.
    pub fn stage(file_name: &str, bytes: &[u8]) -> Result<Self, StagingError> {
        let dir = tempfile::Builder::new()
            .prefix("cfn-audit-")
            .tempdir()
            .map_err(StagingError::CreateDir)?;
        let path = dir.path().join(file_name);
        fs::write(&path, bytes).map_err(|source| StagingError::Write {
            path: path.clone(),
            source,
        })?;
        debug!("Staged {} bytes at {}", bytes.len(), path.display());
        Ok(Self {
            dir: Some(dir),
            path,
        })
    }

    /// Drain a reader and stage its contents.
    pub fn from_reader(file_name: &str, mut reader: impl Read) -> Result<Self, StagingError> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes).map_err(StagingError::Read)?;
        Self::stage(file_name, &bytes)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the staged bytes back.
    pub fn read(&self) -> Result<Vec<u8>, StagingError> {
        fs::read(&self.path).map_err(StagingError::Read)
    }

    /// Remove the staging directory now.
    pub fn release(mut self) {
        self.cleanup();
    }

    fn cleanup(&mut self) {
        let Some(dir) = self.dir.take() else {
            return;
        };
        let dir_path = dir.path().to_path_buf();
        match dir.close() {
            Ok(()) => debug!("Released staging directory {}", dir_path.display()),
            Err(e) => warn!(
                "Failed to remove staging directory {}: {}",
                dir_path.display(),
                e
            ),
        }
    }
}

impl Drop for StagedDocument {
    fn drop(&mut self) {
        self.cleanup();
    }
}
