//! Manifest and settings loading against a real directory.

use assert_fs::prelude::*;
use pkgsync_core::{settings, ConfigError, Manifest};
use predicates::prelude::predicate;

#[test]
fn missing_manifest_is_a_config_error() {
    let root = assert_fs::TempDir::new().expect("tempdir");
    let path = root.path().join("packages");
    let err = Manifest::load_at(&path).unwrap_err();
    assert!(matches!(err, ConfigError::ManifestNotFound { .. }), "got: {err}");
    assert!(err.to_string().contains("packages"));
}

#[test]
fn manifest_loads_and_remembers_its_path() {
    let root = assert_fs::TempDir::new().expect("tempdir");
    let file = root.child("packages");
    file.write_str("https://github.com/org/a.git;\n").expect("write");

    let manifest = Manifest::load_at(file.path()).expect("load");
    assert_eq!(manifest.path(), Some(file.path()));
    let (entries, warnings) = manifest.partition();
    assert_eq!(entries.len(), 1);
    assert!(warnings.is_empty());
}

#[test]
fn empty_manifest_yields_nothing() {
    let root = assert_fs::TempDir::new().expect("tempdir");
    let file = root.child("packages");
    file.touch().expect("touch");
    let manifest = Manifest::load_at(file.path()).expect("load");
    assert_eq!(manifest.entries().count(), 0);
}

#[test]
fn settings_manifest_override_resolves_under_root() {
    let root = assert_fs::TempDir::new().expect("tempdir");
    root.child("pkgsync.yaml")
        .write_str("manifest: feeds/packages.txt\n")
        .expect("write");
    let s = settings::load_at(root.path()).expect("load");
    assert_eq!(
        s.manifest_path(root.path()),
        root.path().join("feeds").join("packages.txt")
    );
}

#[test]
fn save_writes_settings_file() {
    let root = assert_fs::TempDir::new().expect("tempdir");
    settings::save_at(root.path(), &Default::default()).expect("save");
    root.child("pkgsync.yaml").assert(predicate::path::exists());
    root.child("pkgsync.yaml")
        .assert(predicate::str::contains("scratch_dir: .pkgsync-scratch"));
    root.child("pkgsync.yaml.tmp").assert(predicate::path::missing());
}

#[test]
fn malformed_settings_report_path() {
    let root = assert_fs::TempDir::new().expect("tempdir");
    root.child("pkgsync.yaml")
        .write_str("publish: [not, a, mapping]\n")
        .expect("write");
    let err = settings::load_at(root.path()).unwrap_err();
    assert!(matches!(err, ConfigError::Parse { .. }), "got: {err}");
    assert!(err.to_string().contains("pkgsync.yaml"));
}
