//! Scratch clone location, removed on every exit path.

use std::path::{Path, PathBuf};

use pkgsync_core::VCS_METADATA_DIR;

use crate::error::{io_err, SyncError};
use crate::tree;

/// Exclusive owner of the scratch directory for one reconciliation step.
///
/// Dropping the guard deletes the directory, so early returns and `?` never
/// leave a stale clone behind.
#[derive(Debug)]
pub struct ScratchClone {
    path: PathBuf,
}

impl ScratchClone {
    /// Claim `path`, clearing leftovers from an interrupted run.
    ///
    /// The directory itself is not created: `git clone` wants to create it.
    pub fn prepare(path: PathBuf) -> Result<Self, SyncError> {
        tree::remove_path(&path)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| io_err(parent, e))?;
        }
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Delete the clone's `.git` so it can never reach the working tree.
    pub fn strip_metadata(&self) -> Result<(), SyncError> {
        tree::remove_path(&self.path.join(VCS_METADATA_DIR))
    }

    /// Location of `subpath` inside the clone, if it exists.
    pub fn locate(&self, subpath: Option<&Path>) -> Option<PathBuf> {
        let resolved = match subpath {
            Some(subpath) => self.path.join(subpath),
            None => self.path.clone(),
        };
        std::fs::symlink_metadata(&resolved).ok().map(|_| resolved)
    }
}

impl Drop for ScratchClone {
    fn drop(&mut self) {
        if let Err(err) = tree::remove_path(&self.path) {
            tracing::warn!("failed to remove scratch clone: {err}");
        }
    }
}
