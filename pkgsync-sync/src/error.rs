//! Error types for pkgsync-sync.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use pkgsync_core::{ConfigError, TargetError};

/// All errors that can arise from sync operations.
///
/// Only [`SyncError::Config`] and [`SyncError::Publish`] abort a run; the
/// other variants are recorded against a single manifest entry.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Manifest missing/unreadable or settings malformed.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The entry would overwrite the root or a reserved path.
    #[error("unsafe target: {0}")]
    Target(#[from] TargetError),

    /// An I/O error, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Cloning the remote failed.
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// The requested subpath does not exist in the clone.
    #[error("path '{}' not found in {remote}", .subpath.display())]
    PathNotFound { remote: String, subpath: PathBuf },

    /// Commit or push failed.
    #[error(transparent)]
    Publish(#[from] PublishError),
}

/// Convenience constructor for [`SyncError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> SyncError {
    SyncError::Io {
        path: path.into(),
        source,
    }
}

/// A version-control command that did not complete successfully.
#[derive(Debug, Error)]
pub enum CommandError {
    /// The program could not be started (not installed, bad cwd, …).
    #[error("failed to run `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// The program ran and exited non-zero.
    #[error("`{command}` exited with {status}: {stderr}")]
    Failed {
        command: String,
        status: String,
        stderr: String,
    },

    /// The program was killed after exceeding its time budget.
    #[error("`{command}` timed out after {}s", .after.as_secs())]
    TimedOut { command: String, after: Duration },
}

/// Cloning `remote` failed. The entry is skipped; the run continues.
#[derive(Debug, Error)]
#[error("failed to fetch {remote}: {cause}")]
pub struct FetchError {
    pub remote: String,
    #[source]
    pub cause: CommandError,
}

/// The stage of publishing that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishStep {
    ConfigureIdentity,
    Stage,
    InspectChanges,
    Commit,
    Push,
}

impl fmt::Display for PublishStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PublishStep::ConfigureIdentity => write!(f, "configure committer identity"),
            PublishStep::Stage => write!(f, "stage changes"),
            PublishStep::InspectChanges => write!(f, "inspect staged changes"),
            PublishStep::Commit => write!(f, "commit"),
            PublishStep::Push => write!(f, "push"),
        }
    }
}

/// Publishing failed. Fatal: the synced content was not delivered.
#[derive(Debug, Error)]
#[error("publish failed at '{step}': {cause}")]
pub struct PublishError {
    pub step: PublishStep,
    #[source]
    pub cause: CommandError,
}
