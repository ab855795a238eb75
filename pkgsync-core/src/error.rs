//! Error types for pkgsync-core.

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

/// Fatal configuration problems: the run cannot start.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The manifest file did not exist at the expected path.
    #[error("manifest not found at {path}")]
    ManifestNotFound { path: PathBuf },

    /// Underlying I/O failure (permission denied, not UTF-8, etc.).
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// YAML parse error on load: includes file path and line context from serde_yaml.
    #[error("failed to parse settings at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// YAML serialization error (save path).
    #[error("YAML serialization error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Settings parsed but hold a value that would make the run unsafe.
    #[error("invalid settings in {path}: {reason}")]
    Invalid { path: PathBuf, reason: String },
}

/// Convenience constructor for [`ConfigError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> ConfigError {
    ConfigError::Io {
        path: path.into(),
        source,
    }
}

/// Why a manifest line was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MalformedReason {
    /// Nothing before the `,` separator.
    EmptySource,
    /// The source contains embedded whitespace.
    WhitespaceInSource,
    /// The source does not look like a URL, scp-style remote or path.
    UnrecognisedSource,
}

impl fmt::Display for MalformedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MalformedReason::EmptySource => write!(f, "missing repository source"),
            MalformedReason::WhitespaceInSource => write!(f, "whitespace inside repository source"),
            MalformedReason::UnrecognisedSource => write!(f, "not a recognisable repository location"),
        }
    }
}

/// A malformed manifest line. Non-fatal: the line is dropped and parsing continues.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[error("invalid manifest line {line} ({reason}): {content}")]
pub struct ParseWarning {
    /// 1-based line number.
    pub line: usize,
    /// The offending line, trimmed.
    pub content: String,
    pub reason: MalformedReason,
}

/// A manifest entry whose target cannot be synced without endangering the tree.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TargetError {
    /// The entry would map onto the working-tree root itself.
    #[error("'{entry}' resolves to the repository root")]
    ResolvesToRoot { entry: String },

    /// The subpath climbs out of the cloned repository with `..`.
    #[error("subpath '{subpath}' escapes the cloned repository")]
    EscapesClone { subpath: String },

    /// The entry would overwrite a reserved name such as `.git`.
    #[error("target '{name}' is reserved")]
    Reserved { name: String },
}
