//! # pkgsync-sync
//!
//! Reconciliation of a working tree against its `packages` manifest.
//!
//! Call [`run`] for the whole pipeline (parse, reconcile, optionally
//! publish), or drive [`Reconciler`] and [`Publisher`] directly. All
//! version-control work goes through the [`Vcs`] trait; [`GitCli`] is the
//! production implementation.

pub mod error;
pub mod pipeline;
pub mod publish;
pub mod reconcile;
pub mod scratch;
pub mod vcs;

pub(crate) mod tree;

#[cfg(test)]
mod test_support;

pub use error::{CommandError, FetchError, PublishError, PublishStep, SyncError};
pub use pipeline::{run, RunReport, SyncOptions};
pub use publish::{PublishOutcome, Publisher};
pub use reconcile::{EntryOutcome, EntryReport, ReconcileReport, Reconciler};
pub use vcs::{CloneOptions, GitCli, Vcs};
