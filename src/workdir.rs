//! Scoped working directory for one install run.
//!
//! Holds the downloaded archive, its checksum sidecar and the extracted
//! tree. The directory is removed when the value is dropped, which covers
//! every return path out of the pipeline; Ctrl-C is covered by the
//! registration in the shared cleanup context.

use std::path::{Path, PathBuf};

use log::debug;
use tempfile::TempDir;

use crate::cleanup::{SharedCleanupContext, lock};
use crate::error::InstallError;

pub const WORKDIR_PREFIX: &str = "ferromon-install-";

pub struct ScopedWorkDir {
    dir: TempDir,
    cleanup_ctx: SharedCleanupContext,
}

impl ScopedWorkDir {
    /// Creates a fresh directory under `parent` and registers it for
    /// interrupt cleanup.
    pub fn create(parent: &Path, cleanup_ctx: SharedCleanupContext) -> Result<Self, InstallError> {
        let dir = tempfile::Builder::new()
            .prefix(WORKDIR_PREFIX)
            .tempdir_in(parent)
            .map_err(|e| InstallError::WorkDir {
                parent: parent.display().to_string(),
                reason: e.to_string(),
            })?;

        debug!("Working directory: {:?}", dir.path());
        lock(&cleanup_ctx).add(dir.path().to_path_buf());

        Ok(Self { dir, cleanup_ctx })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Location for a downloaded file.
    pub fn file(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    /// Directory the archive is unpacked into.
    pub fn extract_dir(&self) -> PathBuf {
        self.dir.path().join("extracted")
    }
}

impl Drop for ScopedWorkDir {
    fn drop(&mut self) {
        lock(&self.cleanup_ctx).remove(self.dir.path());
        debug!("Removing working directory {:?}", self.dir.path());
        // TempDir removes the directory when it is dropped right after this.
    }
}
