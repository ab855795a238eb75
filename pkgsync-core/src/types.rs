//! Domain types for manifest-driven syncing.
//!
//! All path fields use `PathBuf`; never `&str` or `String` for filesystem paths.

use std::fmt;
use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::TargetError;

/// Name of the version-control metadata directory. Never copied, never removed.
pub const VCS_METADATA_DIR: &str = ".git";

// ---------------------------------------------------------------------------
// SyncTarget
// ---------------------------------------------------------------------------

/// The working-tree path an entry is synced into, relative to the root.
///
/// Always a single normal path component: it can never be the root itself.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SyncTarget(PathBuf);

impl SyncTarget {
    fn from_component(name: &str, entry: &str) -> Result<Self, TargetError> {
        match name {
            "" | "." | ".." => Err(TargetError::ResolvesToRoot {
                entry: entry.to_owned(),
            }),
            VCS_METADATA_DIR => Err(TargetError::Reserved {
                name: name.to_owned(),
            }),
            _ => Ok(Self(PathBuf::from(name))),
        }
    }

    /// The target relative to the working-tree root.
    pub fn as_path(&self) -> &Path {
        &self.0
    }

    /// Absolute location of the target under `root`.
    pub fn resolve(&self, root: &Path) -> PathBuf {
        root.join(&self.0)
    }
}

impl fmt::Display for SyncTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.display().fmt(f)
    }
}

// ---------------------------------------------------------------------------
// ManifestEntry
// ---------------------------------------------------------------------------

/// One parsed manifest line: a remote source and an optional subpath inside it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    /// Remote location handed verbatim to `git clone`.
    pub source: String,
    /// Path inside the clone to sync. `None` syncs the whole repository.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subpath: Option<String>,
    /// 1-based manifest line, `0` for entries built in code.
    #[serde(default)]
    pub line: usize,
}

impl ManifestEntry {
    pub fn new(source: impl Into<String>, subpath: Option<&str>) -> Self {
        Self {
            source: source.into(),
            subpath: subpath.map(str::to_owned),
            line: 0,
        }
    }

    /// Base name of the source with any trailing `/` and `.git` removed.
    ///
    /// `https://host/org/luci-app.git` → `luci-app`, `git@host:repo.git` → `repo`.
    pub fn repo_name(&self) -> &str {
        let trimmed = self.source.trim_end_matches(is_separator);
        let base = trimmed
            .rsplit(|c: char| is_separator(c) || c == ':')
            .next()
            .unwrap_or(trimmed);
        base.strip_suffix(".git").unwrap_or(base)
    }

    /// The subpath normalised to a relative path inside the clone.
    ///
    /// Returns `Ok(None)` for whole-repository entries.
    pub fn clone_subpath(&self) -> Result<Option<PathBuf>, TargetError> {
        let Some(raw) = self.subpath.as_deref() else {
            return Ok(None);
        };

        let mut normalized = PathBuf::new();
        for component in Path::new(raw.trim_matches(is_separator)).components() {
            match component {
                Component::Normal(part) => normalized.push(part),
                Component::ParentDir => {
                    if !normalized.pop() {
                        return Err(TargetError::EscapesClone {
                            subpath: raw.to_owned(),
                        });
                    }
                }
                Component::CurDir | Component::RootDir | Component::Prefix(_) => {}
            }
        }

        if normalized.as_os_str().is_empty() {
            return Err(TargetError::ResolvesToRoot {
                entry: self.to_string(),
            });
        }
        Ok(Some(normalized))
    }

    /// Compute where this entry lands in the working tree.
    ///
    /// The final component of the subpath when present, else [`Self::repo_name`].
    pub fn target(&self) -> Result<SyncTarget, TargetError> {
        let entry = self.to_string();
        match self.clone_subpath()? {
            Some(subpath) => {
                let name = subpath
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                SyncTarget::from_component(&name, &entry)
            }
            None => SyncTarget::from_component(self.repo_name(), &entry),
        }
    }
}

fn is_separator(c: char) -> bool {
    c == '/' || c == '\\'
}

impl fmt::Display for ManifestEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.subpath {
            Some(subpath) => write!(f, "{},{}", self.source, subpath),
            None => self.source.fmt(f),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
