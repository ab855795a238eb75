//! Filesystem primitives: recursive copy and removal.

use std::fs;
use std::io;
use std::path::Path;

use pkgsync_core::VCS_METADATA_DIR;

use crate::error::{io_err, SyncError};

/// Remove `path` whether it is a directory, file or symlink.
///
/// Missing paths are not an error. Read-only entries (git object files on
/// Windows) are made writable and the removal retried once.
pub(crate) fn remove_path(path: &Path) -> Result<(), SyncError> {
    let meta = match fs::symlink_metadata(path) {
        Ok(meta) => meta,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(io_err(path, e)),
    };

    let remove = || {
        if meta.is_dir() {
            fs::remove_dir_all(path)
        } else {
            fs::remove_file(path)
        }
    };

    match remove() {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::PermissionDenied => {
            tracing::debug!("clearing read-only flags under {}", path.display());
            make_writable(path).map_err(|e| io_err(path, e))?;
            remove().map_err(|e| io_err(path, e))
        }
        Err(e) => Err(io_err(path, e)),
    }
}

#[allow(clippy::permissions_set_readonly_false)]
fn make_writable(path: &Path) -> io::Result<()> {
    let meta = fs::symlink_metadata(path)?;
    if meta.file_type().is_symlink() {
        return Ok(());
    }
    let mut perms = meta.permissions();
    if perms.readonly() {
        perms.set_readonly(false);
        fs::set_permissions(path, perms)?;
    }
    if meta.is_dir() {
        for entry in fs::read_dir(path)? {
            make_writable(&entry?.path())?;
        }
    }
    Ok(())
}

/// Copy `src` (file or directory) to `dst`, creating parents as needed.
///
/// Nested `.git` entries are never copied. Symlinks are recreated on Unix
/// and followed elsewhere.
pub(crate) fn copy_path(src: &Path, dst: &Path) -> Result<(), SyncError> {
    if let Some(parent) = dst.parent() {
        fs::create_dir_all(parent).map_err(|e| io_err(parent, e))?;
    }
    copy_entry(src, dst)
}

fn copy_entry(src: &Path, dst: &Path) -> Result<(), SyncError> {
    let meta = fs::symlink_metadata(src).map_err(|e| io_err(src, e))?;
    let file_type = meta.file_type();

    if file_type.is_symlink() {
        return copy_symlink(src, dst);
    }
    if file_type.is_dir() {
        fs::create_dir_all(dst).map_err(|e| io_err(dst, e))?;
        for entry in fs::read_dir(src).map_err(|e| io_err(src, e))? {
            let entry = entry.map_err(|e| io_err(src, e))?;
            let name = entry.file_name();
            if name == VCS_METADATA_DIR {
                continue;
            }
            copy_entry(&entry.path(), &dst.join(&name))?;
        }
        return Ok(());
    }
    fs::copy(src, dst).map_err(|e| io_err(dst, e))?;
    Ok(())
}

#[cfg(unix)]
fn copy_symlink(src: &Path, dst: &Path) -> Result<(), SyncError> {
    let link = fs::read_link(src).map_err(|e| io_err(src, e))?;
    std::os::unix::fs::symlink(&link, dst).map_err(|e| io_err(dst, e))
}

#[cfg(not(unix))]
fn copy_symlink(src: &Path, dst: &Path) -> Result<(), SyncError> {
    let target = fs::metadata(src).map_err(|e| io_err(src, e))?;
    if target.is_dir() {
        fs::create_dir_all(dst).map_err(|e| io_err(dst, e))?;
        for entry in fs::read_dir(src).map_err(|e| io_err(src, e))? {
            let entry = entry.map_err(|e| io_err(src, e))?;
            copy_entry(&entry.path(), &dst.join(entry.file_name()))?;
        }
        return Ok(());
    }
    fs::copy(src, dst).map_err(|e| io_err(dst, e))?;
    Ok(())
}
