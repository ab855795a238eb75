//! Shared sync pipeline entrypoint: parse → reconcile → publish.

use std::path::{Path, PathBuf};

use serde::Serialize;

use pkgsync_core::{Manifest, ParseWarning, Settings};

use crate::publish::{PublishOutcome, Publisher};
use crate::reconcile::{ReconcileReport, Reconciler};
use crate::vcs::Vcs;
use crate::SyncError;

/// Switches for a single pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SyncOptions {
    /// Report changes without touching the tree. Implies no publish.
    pub dry_run: bool,
    /// Commit and push after reconciling.
    pub publish: bool,
}

/// Everything a run did, in order.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub root: PathBuf,
    pub manifest: PathBuf,
    pub malformed: Vec<ParseWarning>,
    pub reconcile: ReconcileReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub publish: Option<PublishOutcome>,
}

/// Run the full pipeline against the working tree at `root`.
///
/// Fails only for a missing/unreadable manifest or a failed publish;
/// per-entry problems are recorded in the report.
pub fn run(
    root: &Path,
    settings: &Settings,
    options: SyncOptions,
    vcs: &dyn Vcs,
) -> Result<RunReport, SyncError> {
    let manifest_path = settings.manifest_path(root);
    let manifest = Manifest::load_at(&manifest_path)?;

    let mut entries = Vec::new();
    let mut malformed = Vec::new();
    for item in manifest.entries() {
        match item {
            Ok(entry) => entries.push(entry),
            Err(warning) => {
                tracing::warn!("{warning}");
                malformed.push(warning);
            }
        }
    }
    tracing::info!(
        "{} entries in {} ({} malformed)",
        entries.len(),
        manifest_path.display(),
        malformed.len()
    );

    let reconcile = Reconciler::new(root, settings, vcs)
        .dry_run(options.dry_run)
        .reconcile(&entries);

    let publish = if options.publish && !options.dry_run {
        Some(Publisher::new(root, &settings.publish, vcs).publish()?)
    } else {
        None
    };

    Ok(RunReport {
        root: root.to_path_buf(),
        manifest: manifest_path,
        malformed,
        reconcile,
        publish,
    })
}

#[cfg(test)]
mod tests {
    use std::fs;

    use pkgsync_core::ConfigError;
    use tempfile::TempDir;

    use super::*;
    use crate::reconcile::EntryOutcome;
    use crate::test_support::FakeVcs;

    fn init_logger() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    #[test]
    fn missing_manifest_is_fatal() {
        init_logger();
        let root = TempDir::new().expect("root");
        let err = run(
            root.path(),
            &Settings::default(),
            SyncOptions::default(),
            &FakeVcs::default(),
        )
        .expect_err("no manifest");
        assert!(matches!(
            err,
            SyncError::Config(ConfigError::ManifestNotFound { .. })
        ));
    }

    #[test]
    fn malformed_lines_are_reported_not_fatal() {
        init_logger();
        let root = TempDir::new().expect("root");
        let remotes = TempDir::new().expect("remotes");
        fs::create_dir_all(remotes.path().join("pkg")).expect("mkdir");
        fs::write(remotes.path().join("pkg").join("f"), "f").expect("write");
        fs::write(
            root.path().join("packages"),
            "not-a-valid-line-no-separator\nr.git,pkg;\n",
        )
        .expect("manifest");
        let vcs = FakeVcs::default().with_remote("r.git", remotes.path());

        let report = run(root.path(), &Settings::default(), SyncOptions::default(), &vcs)
            .expect("run");

        assert_eq!(report.malformed.len(), 1);
        assert_eq!(report.malformed[0].line, 1);
        assert_eq!(report.reconcile.entries.len(), 1);
        assert_eq!(report.reconcile.entries[0].outcome, EntryOutcome::Synced);
        assert!(report.publish.is_none());
    }

    #[test]
    fn dry_run_never_publishes() {
        init_logger();
        let root = TempDir::new().expect("root");
        fs::write(root.path().join("packages"), "# empty\n").expect("manifest");
        let vcs = FakeVcs::default();
        vcs.staged.set(true);

        let report = run(
            root.path(),
            &Settings::default(),
            SyncOptions {
                dry_run: true,
                publish: true,
            },
            &vcs,
        )
        .expect("run");

        assert!(report.publish.is_none());
        assert!(vcs.calls().is_empty());
    }

    #[test]
    fn unchanged_tree_publishes_nothing() {
        init_logger();
        let root = TempDir::new().expect("root");
        fs::write(root.path().join("packages"), "").expect("manifest");
        let vcs = FakeVcs::default();

        let report = run(
            root.path(),
            &Settings::default(),
            SyncOptions {
                dry_run: false,
                publish: true,
            },
            &vcs,
        )
        .expect("run");

        assert_eq!(report.publish, Some(PublishOutcome::NothingToCommit));
    }

    #[test]
    fn nested_manifest_survives_repeated_runs() {
        init_logger();
        let root = TempDir::new().expect("root");
        fs::create_dir_all(root.path().join("feeds")).expect("mkdir");
        fs::write(root.path().join("feeds").join("packages.txt"), "").expect("manifest");
        let settings = Settings {
            manifest: PathBuf::from("feeds/packages.txt"),
            ..Settings::default()
        };
        let vcs = FakeVcs::default();

        let first = run(root.path(), &settings, SyncOptions::default(), &vcs).expect("first run");
        let second = run(root.path(), &settings, SyncOptions::default(), &vcs).expect("second run");

        assert!(first.reconcile.removed.is_empty());
        assert!(second.reconcile.removed.is_empty());
        assert!(root.path().join("feeds").join("packages.txt").exists());
    }

    #[test]
    fn entry_named_like_manifest_cannot_delete_it() {
        init_logger();
        let root = TempDir::new().expect("root");
        fs::write(root.path().join("packages"), "missing.git,docs/packages;\n").expect("manifest");
        let vcs = FakeVcs::default();

        let first = run(root.path(), &Settings::default(), SyncOptions::default(), &vcs)
            .expect("first run");
        assert!(matches!(
            first.reconcile.entries[0].outcome,
            EntryOutcome::Unsafe { .. }
        ));
        run(root.path(), &Settings::default(), SyncOptions::default(), &vcs)
            .expect("second run still finds the manifest");
    }

    #[test]
    fn report_serializes_to_json() {
        init_logger();
        let root = TempDir::new().expect("root");
        fs::write(root.path().join("packages"), "bogus\nhttps://h/x.git,;\n").expect("manifest");

        let report = run(
            root.path(),
            &Settings::default(),
            SyncOptions::default(),
            &FakeVcs::default(),
        )
        .expect("run");
        let json = serde_json::to_value(&report).expect("json");

        assert_eq!(json["malformed"][0]["reason"], "unrecognised_source");
        assert_eq!(json["reconcile"]["entries"][0]["status"], "unsafe");
        assert!(json.get("publish").is_none());
    }
}
