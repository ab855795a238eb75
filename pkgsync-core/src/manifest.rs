//! The `packages` manifest: one repository per line.
//!
//! # Grammar
//!
//! ```text
//! line    := comment | blank | entry
//! comment := ws* '#' any*
//! blank   := ws*
//! entry   := ws* source ws* [',' ws* subpath ws*] [';'] ws*
//! ```
//!
//! Parsing is pure: [`Manifest::entries`] borrows the text and can be
//! restarted any number of times with identical results.

use std::iter::Enumerate;
use std::path::{Path, PathBuf};
use std::str::Lines;

use crate::error::{io_err, ConfigError, MalformedReason, ParseWarning};
use crate::types::ManifestEntry;

/// Default manifest file name, resolved against the working-tree root.
pub const DEFAULT_MANIFEST: &str = "packages";

const COMMENT: char = '#';
const SEPARATOR: char = ',';
const TERMINATOR: char = ';';

/// Manifest text plus the path it was read from, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Manifest {
    path: Option<PathBuf>,
    text: String,
}

impl Manifest {
    /// Wrap in-memory manifest text.
    pub fn parse(text: impl Into<String>) -> Self {
        Self {
            path: None,
            text: text.into(),
        }
    }

    /// Read the manifest at `path`.
    ///
    /// Returns [`ConfigError::ManifestNotFound`] if the file is absent.
    pub fn load_at(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::ManifestNotFound {
                path: path.to_path_buf(),
            });
        }
        let text = std::fs::read_to_string(path).map_err(|e| io_err(path, e))?;
        Ok(Self {
            path: Some(path.to_path_buf()),
            text,
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Lazily parse every line, yielding entries and warnings in file order.
    pub fn entries(&self) -> Entries<'_> {
        let text = self.text.strip_prefix('\u{feff}').unwrap_or(&self.text);
        Entries {
            lines: text.lines().enumerate(),
        }
    }

    /// Collect [`Self::entries`] into valid entries and malformed-line warnings.
    pub fn partition(&self) -> (Vec<ManifestEntry>, Vec<ParseWarning>) {
        let mut entries = Vec::new();
        let mut warnings = Vec::new();
        for item in self.entries() {
            match item {
                Ok(entry) => entries.push(entry),
                Err(warning) => warnings.push(warning),
            }
        }
        (entries, warnings)
    }
}

/// Iterator returned by [`Manifest::entries`].
#[derive(Debug, Clone)]
pub struct Entries<'a> {
    lines: Enumerate<Lines<'a>>,
}

impl Iterator for Entries<'_> {
    type Item = Result<ManifestEntry, ParseWarning>;

    fn next(&mut self) -> Option<Self::Item> {
        for (idx, raw) in self.lines.by_ref() {
            if let Some(item) = parse_line(idx + 1, raw) {
                return Some(item);
            }
        }
        None
    }
}

/// Parse a single manifest line.
///
/// Returns `None` for blank and comment lines.
pub fn parse_line(line: usize, raw: &str) -> Option<Result<ManifestEntry, ParseWarning>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.starts_with(COMMENT) {
        return None;
    }

    let body = trimmed.strip_suffix(TERMINATOR).unwrap_or(trimmed).trim_end();
    let (source, subpath) = match body.split_once(SEPARATOR) {
        Some((source, subpath)) => (source.trim(), Some(subpath.trim())),
        None => (body, None),
    };

    let malformed = |reason| ParseWarning {
        line,
        content: trimmed.to_owned(),
        reason,
    };

    if source.is_empty() {
        return Some(Err(malformed(MalformedReason::EmptySource)));
    }
    if source.chars().any(char::is_whitespace) {
        return Some(Err(malformed(MalformedReason::WhitespaceInSource)));
    }
    if !is_remote_location(source) {
        return Some(Err(malformed(MalformedReason::UnrecognisedSource)));
    }

    Some(Ok(ManifestEntry {
        source: source.to_owned(),
        subpath: subpath.map(str::to_owned),
        line,
    }))
}

/// Whether `source` looks like something `git clone` accepts.
fn is_remote_location(source: &str) -> bool {
    if source.contains("://") || source.starts_with("file:") {
        return true;
    }
    if source.ends_with(".git") || source.ends_with(".git/") {
        return true;
    }
    if source.starts_with("./") || source.starts_with("../") || source.starts_with("~/") {
        return true;
    }
    if Path::new(source).is_absolute() || source.starts_with('/') {
        return true;
    }
    // scp-style: user@host:path
    match source.split_once(':') {
        Some((host, path)) => host.contains('@') && !host.contains('/') && !path.is_empty(),
        None => false,
    }
}
