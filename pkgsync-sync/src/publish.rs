//! Commit-and-push of the reconciled working tree.

use std::path::Path;

use serde::Serialize;

use pkgsync_core::PublishSettings;

use crate::error::{CommandError, PublishError, PublishStep};
use crate::vcs::Vcs;

/// Outcome of a publish attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PublishOutcome {
    /// Nothing staged: no commit, no push.
    NothingToCommit,
    /// A commit was created and pushed.
    Pushed { remote: String, branch: String },
}

/// Stages, commits and pushes the working tree at `root`.
pub struct Publisher<'a> {
    root: &'a Path,
    settings: &'a PublishSettings,
    vcs: &'a dyn Vcs,
}

impl<'a> Publisher<'a> {
    pub fn new(root: &'a Path, settings: &'a PublishSettings, vcs: &'a dyn Vcs) -> Self {
        Self {
            root,
            settings,
            vcs,
        }
    }

    /// Commit under the bot identity if anything changed, then push.
    ///
    /// A clean index is success, not an error.
    pub fn publish(&self) -> Result<PublishOutcome, PublishError> {
        let s = self.settings;
        self.vcs
            .configure_identity(self.root, &s.user_name, &s.user_email)
            .map_err(at(PublishStep::ConfigureIdentity))?;
        self.vcs
            .stage_all(self.root)
            .map_err(at(PublishStep::Stage))?;

        let changed = self
            .vcs
            .has_staged_changes(self.root)
            .map_err(at(PublishStep::InspectChanges))?;
        if !changed {
            tracing::info!("no changes to publish");
            return Ok(PublishOutcome::NothingToCommit);
        }

        self.vcs
            .commit(self.root, &s.message)
            .map_err(at(PublishStep::Commit))?;
        tracing::info!("committed: {}", s.message);

        self.vcs
            .push(self.root, &s.remote, &s.branch)
            .map_err(at(PublishStep::Push))?;
        tracing::info!("pushed to {}/{}", s.remote, s.branch);

        Ok(PublishOutcome::Pushed {
            remote: s.remote.clone(),
            branch: s.branch.clone(),
        })
    }
}

fn at(step: PublishStep) -> impl Fn(CommandError) -> PublishError {
    move |cause| PublishError { step, cause }
}
