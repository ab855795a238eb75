//! Optional `pkgsync.yaml` settings, read from the working-tree root.
//!
//! # API pattern
//!
//! Every function takes the working-tree root explicitly (`fn_at(root, …)`);
//! nothing consults the process's current directory.
//!
//! A missing settings file is not an error: [`Settings::default`] applies.

use std::collections::BTreeSet;
use std::ffi::OsString;
use std::path::{Component, Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{io_err, ConfigError, TargetError};
use crate::manifest::DEFAULT_MANIFEST;
use crate::types::{ManifestEntry, SyncTarget, VCS_METADATA_DIR};

/// Settings file name, resolved against the working-tree root.
pub const SETTINGS_FILE: &str = "pkgsync.yaml";

/// Default scratch directory for clones, relative to the working-tree root.
pub const DEFAULT_SCRATCH_DIR: &str = ".pkgsync-scratch";

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Run settings. Every field has a default; the file may set any subset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Manifest path, relative to the root unless absolute.
    pub manifest: PathBuf,
    /// Scratch clone location, relative to the root unless absolute.
    pub scratch_dir: PathBuf,
    /// `git clone --depth`; `0` means a full clone.
    pub clone_depth: u32,
    /// Upper bound on a single clone; `0` disables the timeout.
    pub fetch_timeout_secs: u64,
    /// Top-level directories the stale pass never removes.
    pub preserve: Vec<String>,
    pub publish: PublishSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            manifest: PathBuf::from(DEFAULT_MANIFEST),
            scratch_dir: PathBuf::from(DEFAULT_SCRATCH_DIR),
            clone_depth: 1,
            fetch_timeout_secs: 300,
            preserve: vec![".github".to_string()],
            publish: PublishSettings::default(),
        }
    }
}

/// Commit-and-push settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PublishSettings {
    pub enabled: bool,
    pub remote: String,
    pub branch: String,
    pub message: String,
    pub user_name: String,
    pub user_email: String,
}

impl Default for PublishSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            remote: "origin".to_string(),
            branch: "main".to_string(),
            message: "chore: sync packages".to_string(),
            user_name: "github-actions[bot]".to_string(),
            user_email: "41898282+github-actions[bot]@users.noreply.github.com".to_string(),
        }
    }
}

impl Settings {
    /// Absolute manifest path under `root`.
    pub fn manifest_path(&self, root: &Path) -> PathBuf {
        root.join(&self.manifest)
    }

    /// Absolute scratch path under `root`.
    pub fn scratch_path(&self, root: &Path) -> PathBuf {
        root.join(&self.scratch_dir)
    }

    /// `None` for a full clone.
    pub fn clone_depth(&self) -> Option<u32> {
        (self.clone_depth > 0).then_some(self.clone_depth)
    }

    /// `None` when the timeout is disabled.
    pub fn fetch_timeout(&self) -> Option<Duration> {
        (self.fetch_timeout_secs > 0).then(|| Duration::from_secs(self.fetch_timeout_secs))
    }

    /// Top-level names under `root` that a run depends on and must never
    /// replace or remove: the scratch directory, the manifest's first path
    /// component and the settings file.
    pub fn reserved_names(&self, root: &Path) -> BTreeSet<OsString> {
        let mut names = BTreeSet::from([OsString::from(SETTINGS_FILE)]);
        names.extend(top_level_name(root, &self.scratch_dir));
        names.extend(top_level_name(root, &self.manifest));
        names
    }

    /// The entry's target, additionally refusing [`Self::reserved_names`].
    pub fn target_for(&self, root: &Path, entry: &ManifestEntry) -> Result<SyncTarget, TargetError> {
        let target = entry.target()?;
        if self
            .reserved_names(root)
            .contains(target.as_path().as_os_str())
        {
            return Err(TargetError::Reserved {
                name: target.to_string(),
            });
        }
        Ok(target)
    }

    /// Reject values that would point the scratch clone at the tree itself.
    pub fn validate(&self, path: &Path) -> Result<(), ConfigError> {
        let invalid = |reason: &str| ConfigError::Invalid {
            path: path.to_path_buf(),
            reason: reason.to_string(),
        };

        let mut normal = 0usize;
        for component in self.scratch_dir.components() {
            match component {
                Component::Normal(part) if part == VCS_METADATA_DIR => {
                    return Err(invalid("scratch_dir must not be inside .git"));
                }
                Component::Normal(_) => normal += 1,
                Component::ParentDir => {
                    return Err(invalid("scratch_dir must not contain '..'"));
                }
                Component::CurDir | Component::RootDir | Component::Prefix(_) => {}
            }
        }
        if normal == 0 {
            return Err(invalid("scratch_dir must name a directory below the root"));
        }
        if self.publish.enabled && self.publish.branch.trim().is_empty() {
            return Err(invalid("publish.branch must not be empty"));
        }
        Ok(())
    }
}

/// First component of `path` (resolved against `root`) when it stays under `root`.
fn top_level_name(root: &Path, path: &Path) -> Option<OsString> {
    let full = root.join(path);
    let relative = full.strip_prefix(root).ok()?;
    for component in relative.components() {
        match component {
            Component::CurDir => continue,
            Component::Normal(part) => return Some(part.to_owned()),
            _ => return None,
        }
    }
    None
}

// ---------------------------------------------------------------------------
// Load / save
// ---------------------------------------------------------------------------

/// `<root>/pkgsync.yaml`: pure, no I/O.
pub fn settings_path_at(root: &Path) -> PathBuf {
    root.join(SETTINGS_FILE)
}

/// Load settings from `<root>/pkgsync.yaml`, falling back to defaults if absent.
///
/// Returns `ConfigError::Parse` (with path + line context) if malformed YAML.
pub fn load_at(root: &Path) -> Result<Settings, ConfigError> {
    let path = settings_path_at(root);
    if !path.exists() {
        return Ok(Settings::default());
    }
    let contents = std::fs::read_to_string(&path).map_err(|e| io_err(&path, e))?;
    if contents.trim().is_empty() {
        return Ok(Settings::default());
    }
    let settings: Settings = serde_yaml::from_str(&contents)
        .map_err(|e| ConfigError::Parse {
            path: path.clone(),
            source: e,
        })?;
    settings.validate(&path)?;
    Ok(settings)
}

/// Atomically save settings to `<root>/pkgsync.yaml`.
///
/// Write flow: serialize → `.yaml.tmp` sibling → `rename`.
pub fn save_at(root: &Path, settings: &Settings) -> Result<PathBuf, ConfigError> {
    let path = settings_path_at(root);
    settings.validate(&path)?;
    let tmp_path = path.with_extension("yaml.tmp");

    let yaml = serde_yaml::to_string(settings)?;
    std::fs::write(&tmp_path, yaml).map_err(|e| io_err(&tmp_path, e))?;
    if let Err(e) = std::fs::rename(&tmp_path, &path) {
        let _ = std::fs::remove_file(&tmp_path);
        return Err(io_err(&path, e));
    }
    Ok(path)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
