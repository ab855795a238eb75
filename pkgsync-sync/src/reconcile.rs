//! Manifest reconciliation: make the working tree mirror the manifest.
//!
//! ## Per-entry protocol
//!
//! 1. Compute the target; skip entries that would hit the root.
//! 2. Remove the previous copy of the target (replace, never merge).
//! 3. Clone the remote into the scratch location.
//! 4. Strip `.git` from the clone.
//! 5. Locate the subpath inside the clone.
//! 6. Copy it into the target.
//! 7. Drop the scratch guard (runs on every exit path).
//!
//! After every entry, top-level directories no entry explains are removed.
//! Duplicate targets are last-write-wins.

use std::collections::BTreeSet;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;

use pkgsync_core::{ManifestEntry, Settings, SyncTarget, TargetError, VCS_METADATA_DIR};

use crate::error::{FetchError, SyncError};
use crate::scratch::ScratchClone;
use crate::tree;
use crate::vcs::{CloneOptions, Vcs};

// ---------------------------------------------------------------------------
// Report types
// ---------------------------------------------------------------------------

/// What happened to a single manifest entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum EntryOutcome {
    /// Content copied into the working tree.
    Synced,
    /// `--dry-run`: the entry *would* have been synced.
    WouldSync,
    /// Target would have been the root or a reserved path.
    Unsafe { reason: String },
    /// The clone command failed or timed out.
    FetchFailed { reason: String },
    /// The subpath does not exist in the clone.
    PathNotFound { subpath: PathBuf },
    /// Local filesystem failure while replacing the target.
    Failed { reason: String },
}

impl EntryOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, EntryOutcome::Synced | EntryOutcome::WouldSync)
    }
}

/// Outcome of one manifest entry.
#[derive(Debug, Clone, Serialize)]
pub struct EntryReport {
    pub entry: ManifestEntry,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<SyncTarget>,
    #[serde(flatten)]
    pub outcome: EntryOutcome,
}

/// Outcome of a whole reconciliation pass.
#[derive(Debug, Clone, Serialize)]
pub struct ReconcileReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub dry_run: bool,
    pub entries: Vec<EntryReport>,
    /// Stale top-level directories removed (or, in dry-run, that would be).
    pub removed: Vec<PathBuf>,
}

impl ReconcileReport {
    pub fn synced(&self) -> usize {
        self.entries
            .iter()
            .filter(|r| r.outcome.is_success())
            .count()
    }

    pub fn skipped(&self) -> usize {
        self.entries.len() - self.synced()
    }
}

// ---------------------------------------------------------------------------
// Reconciler
// ---------------------------------------------------------------------------

/// Reconciles the working tree at `root` against manifest entries.
pub struct Reconciler<'a> {
    root: &'a Path,
    settings: &'a Settings,
    vcs: &'a dyn Vcs,
    dry_run: bool,
}

impl<'a> Reconciler<'a> {
    pub fn new(root: &'a Path, settings: &'a Settings, vcs: &'a dyn Vcs) -> Self {
        Self {
            root,
            settings,
            vcs,
            dry_run: false,
        }
    }

    /// Report what would change without cloning, copying or removing anything.
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Sync every entry in order, then remove stale directories.
    pub fn reconcile(&self, entries: &[ManifestEntry]) -> ReconcileReport {
        let started_at = Utc::now();
        let mut expected = BTreeSet::new();
        let mut reports = Vec::with_capacity(entries.len());

        for entry in entries {
            let target = match self.target_for(entry) {
                Ok(target) => target,
                Err(err) => {
                    tracing::warn!("skipping manifest line {} '{entry}': {err}", entry.line);
                    reports.push(EntryReport {
                        entry: entry.clone(),
                        target: None,
                        outcome: EntryOutcome::Unsafe {
                            reason: err.to_string(),
                        },
                    });
                    continue;
                }
            };
            expected.insert(target.clone());

            let outcome = if self.dry_run {
                tracing::info!("[dry-run] would sync {} -> {target}", entry.source);
                EntryOutcome::WouldSync
            } else {
                match self.sync_entry(entry, &target) {
                    Ok(()) => EntryOutcome::Synced,
                    Err(err) => {
                        tracing::warn!("skipping {} -> {target}: {err}", entry.source);
                        outcome_for(err)
                    }
                }
            };
            reports.push(EntryReport {
                entry: entry.clone(),
                target: Some(target),
                outcome,
            });
        }

        let removed = self.remove_stale(&expected);
        ReconcileReport {
            started_at,
            finished_at: Utc::now(),
            dry_run: self.dry_run,
            entries: reports,
            removed,
        }
    }

    /// The entry's target, refusing the scratch location, the manifest and
    /// the settings file.
    pub fn target_for(&self, entry: &ManifestEntry) -> Result<SyncTarget, TargetError> {
        self.settings.target_for(self.root, entry)
    }

    /// Steps 2 to 7 of the per-entry protocol.
    pub fn sync_entry(&self, entry: &ManifestEntry, target: &SyncTarget) -> Result<(), SyncError> {
        let dest = target.resolve(self.root);

        if std::fs::symlink_metadata(&dest).is_ok() {
            tracing::info!("replacing {}", dest.display());
            tree::remove_path(&dest)?;
        }

        let scratch = ScratchClone::prepare(self.settings.scratch_path(self.root))?;
        tracing::info!("cloning {}", entry.source);
        self.vcs
            .clone_repo(&entry.source, scratch.path(), &self.clone_options())
            .map_err(|cause| FetchError {
                remote: entry.source.clone(),
                cause,
            })?;
        scratch.strip_metadata()?;

        let subpath = entry.clone_subpath()?;
        let Some(src) = scratch.locate(subpath.as_deref()) else {
            return Err(SyncError::PathNotFound {
                remote: entry.source.clone(),
                subpath: subpath.unwrap_or_default(),
            });
        };

        tree::copy_path(&src, &dest)?;
        tracing::info!("synced {entry} -> {target}");
        Ok(())
    }

    /// Remove top-level directories that no entry explains.
    ///
    /// `.git`, `preserve` entries and [`Settings::reserved_names`] are always kept.
    pub fn remove_stale(&self, expected: &BTreeSet<SyncTarget>) -> Vec<PathBuf> {
        let mut keep: BTreeSet<OsString> = expected
            .iter()
            .map(|t| t.as_path().as_os_str().to_owned())
            .collect();
        keep.insert(VCS_METADATA_DIR.into());
        keep.extend(self.settings.preserve.iter().map(OsString::from));
        keep.extend(self.settings.reserved_names(self.root));

        let read = match std::fs::read_dir(self.root) {
            Ok(read) => read,
            Err(err) => {
                tracing::warn!("cannot list {}: {err}", self.root.display());
                return Vec::new();
            }
        };
        let mut stale: Vec<OsString> = read
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().map(|t| t.is_dir()).unwrap_or(false))
            .map(|e| e.file_name())
            .filter(|name| !keep.contains(name))
            .collect();
        stale.sort();

        let mut removed = Vec::new();
        for name in stale {
            let path = self.root.join(&name);
            if self.dry_run {
                tracing::info!("[dry-run] would remove stale {}", path.display());
                removed.push(PathBuf::from(name));
                continue;
            }
            match tree::remove_path(&path) {
                Ok(()) => {
                    tracing::info!("removed stale {}", path.display());
                    removed.push(PathBuf::from(name));
                }
                Err(err) => tracing::warn!("failed to remove stale directory: {err}"),
            }
        }
        removed
    }

    fn clone_options(&self) -> CloneOptions {
        CloneOptions {
            depth: self.settings.clone_depth(),
            timeout: self.settings.fetch_timeout(),
        }
    }
}

fn outcome_for(err: SyncError) -> EntryOutcome {
    match err {
        SyncError::Fetch(err) => EntryOutcome::FetchFailed {
            reason: err.to_string(),
        },
        SyncError::PathNotFound { subpath, .. } => EntryOutcome::PathNotFound { subpath },
        SyncError::Target(err) => EntryOutcome::Unsafe {
            reason: err.to_string(),
        },
        other => EntryOutcome::Failed {
            reason: other.to_string(),
        },
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
