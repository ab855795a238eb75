//! Parameterised grammar tests for the `packages` manifest.
//!
//! Each `#[case]` is isolated: parsing never touches the filesystem.

use pkgsync_core::{manifest::parse_line, MalformedReason, Manifest, ManifestEntry};
use rstest::rstest;

// ---------------------------------------------------------------------------
// Valid entries
// ---------------------------------------------------------------------------

#[rstest]
#[case("https://github.com/org/repo.git", "https://github.com/org/repo.git", None)]
#[case("https://github.com/org/repo.git;", "https://github.com/org/repo.git", None)]
#[case("  https://github.com/org/repo.git ;  ", "https://github.com/org/repo.git", None)]
#[case("https://github.com/org/repo.git,luci-app-foo;", "https://github.com/org/repo.git", Some("luci-app-foo"))]
#[case("https://github.com/org/repo.git , applications/luci-app-foo ;", "https://github.com/org/repo.git", Some("applications/luci-app-foo"))]
#[case("git@github.com:org/repo.git,pkg", "git@github.com:org/repo.git", Some("pkg"))]
#[case("git@example.com:org/repo", "git@example.com:org/repo", None)]
#[case("ssh://git@example.com/org/repo", "ssh://git@example.com/org/repo", None)]
#[case("file:///srv/mirror/repo", "file:///srv/mirror/repo", None)]
#[case("/srv/mirror/repo,sub;", "/srv/mirror/repo", Some("sub"))]
#[case("../sibling/repo,sub", "../sibling/repo", Some("sub"))]
#[case("repoA.git,subdir/foo;", "repoA.git", Some("subdir/foo"))]
fn valid_lines(#[case] line: &str, #[case] source: &str, #[case] subpath: Option<&str>) {
    let entry = parse_line(1, line)
        .expect("not skipped")
        .expect("valid entry");
    assert_eq!(entry.source, source);
    assert_eq!(entry.subpath.as_deref(), subpath);
    assert_eq!(entry.line, 1);
}

// ---------------------------------------------------------------------------
// Skipped and malformed lines
// ---------------------------------------------------------------------------

#[rstest]
#[case("")]
#[case("   \t ")]
#[case("#")]
#[case("# https://github.com/org/disabled.git;")]
#[case("\t# indented")]
fn ignored_lines(#[case] line: &str) {
    assert!(parse_line(1, line).is_none());
}

#[rstest]
#[case("not-a-valid-line-no-separator", MalformedReason::UnrecognisedSource)]
#[case("just-words,subdir;", MalformedReason::UnrecognisedSource)]
#[case(",subdir;", MalformedReason::EmptySource)]
#[case(";", MalformedReason::EmptySource)]
#[case("https://h/a b.git", MalformedReason::WhitespaceInSource)]
fn malformed_lines(#[case] line: &str, #[case] reason: MalformedReason) {
    let warning = parse_line(5, line)
        .expect("not skipped")
        .expect_err("malformed");
    assert_eq!(warning.reason, reason);
    assert_eq!(warning.line, 5);
}

// ---------------------------------------------------------------------------
// Whole-manifest behaviour
// ---------------------------------------------------------------------------

const SAMPLE: &str = "\
# packages synced into this feed
https://github.com/org/one.git;

https://github.com/org/mono.git,apps/two;
not-a-valid-line-no-separator
https://github.com/org/mono.git,apps/three
";

#[test]
fn malformed_line_does_not_stop_parsing() {
    let (entries, warnings) = Manifest::parse(SAMPLE).partition();
    let sources: Vec<String> = entries.iter().map(ManifestEntry::to_string).collect();
    assert_eq!(
        sources,
        vec![
            "https://github.com/org/one.git",
            "https://github.com/org/mono.git,apps/two",
            "https://github.com/org/mono.git,apps/three",
        ]
    );
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].line, 5);
}

#[test]
fn line_numbers_follow_the_file() {
    let lines: Vec<usize> = Manifest::parse(SAMPLE)
        .entries()
        .map(|item| match item {
            Ok(entry) => entry.line,
            Err(warning) => warning.line,
        })
        .collect();
    assert_eq!(lines, vec![2, 4, 5, 6]);
}

#[test]
fn parsing_is_pure() {
    let a = Manifest::parse(SAMPLE).partition();
    let b = Manifest::parse(SAMPLE.to_string()).partition();
    assert_eq!(a, b);
}

#[test]
fn targets_follow_subpath_basename() {
    let (entries, _) = Manifest::parse(SAMPLE).partition();
    let targets: Vec<String> = entries
        .iter()
        .map(|e| e.target().expect("target").to_string())
        .collect();
    assert_eq!(targets, vec!["one", "two", "three"]);
}
