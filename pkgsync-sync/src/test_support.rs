//! In-process [`Vcs`] fake for unit tests: "remotes" are local fixture dirs.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::CommandError;
use crate::tree;
use crate::vcs::{CloneOptions, Vcs};

#[derive(Debug, Default)]
pub(crate) struct FakeVcs {
    remotes: HashMap<String, PathBuf>,
    calls: RefCell<Vec<String>>,
    pub staged: Cell<bool>,
    fail_commit: bool,
    fail_push: bool,
}

impl FakeVcs {
    pub fn with_remote(mut self, source: &str, fixture: &Path) -> Self {
        self.remotes.insert(source.to_string(), fixture.to_path_buf());
        self
    }

    pub fn failing_commit(mut self) -> Self {
        self.fail_commit = true;
        self
    }

    pub fn failing_push(mut self) -> Self {
        self.fail_push = true;
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    fn record(&self, call: String) {
        self.calls.borrow_mut().push(call);
    }
}

fn failure(command: &str, stderr: &str) -> CommandError {
    CommandError::Failed {
        command: command.to_string(),
        status: "exit code 128".to_string(),
        stderr: stderr.to_string(),
    }
}

impl Vcs for FakeVcs {
    fn clone_repo(
        &self,
        source: &str,
        dest: &Path,
        _opts: &CloneOptions,
    ) -> Result<(), CommandError> {
        self.record(format!("clone {source}"));
        let Some(fixture) = self.remotes.get(source) else {
            // Leave a half-written clone behind, like an interrupted fetch.
            fs::create_dir_all(dest.join(".git")).expect("partial clone");
            return Err(failure(
                &format!("git clone {source}"),
                "fatal: repository not found",
            ));
        };
        tree::copy_path(fixture, dest).expect("copy fixture");
        fs::create_dir_all(dest.join(".git")).expect("mkdir .git");
        fs::write(dest.join(".git").join("HEAD"), "ref: refs/heads/main\n").expect("HEAD");
        Ok(())
    }

    fn configure_identity(
        &self,
        _root: &Path,
        name: &str,
        email: &str,
    ) -> Result<(), CommandError> {
        self.record(format!("identity {name} <{email}>"));
        Ok(())
    }

    fn stage_all(&self, _root: &Path) -> Result<(), CommandError> {
        self.record("stage".to_string());
        Ok(())
    }

    fn has_staged_changes(&self, _root: &Path) -> Result<bool, CommandError> {
        self.record("diff --cached".to_string());
        Ok(self.staged.get())
    }

    fn commit(&self, _root: &Path, message: &str) -> Result<(), CommandError> {
        self.record(format!("commit {message}"));
        if self.fail_commit {
            return Err(failure("git commit", "error: unable to write index"));
        }
        self.staged.set(false);
        Ok(())
    }

    fn push(&self, _root: &Path, remote: &str, branch: &str) -> Result<(), CommandError> {
        self.record(format!("push {remote} {branch}"));
        if self.fail_push {
            return Err(failure("git push", "remote: Permission denied"));
        }
        Ok(())
    }
}
