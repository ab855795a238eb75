//! Version-control seam.
//!
//! [`Vcs`] is everything the reconciler and publisher need from git. The
//! production implementation, [`GitCli`], shells out to the `git` binary;
//! tests substitute an in-process fake.

use std::ffi::{OsStr, OsString};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::error::CommandError;

/// Environment variables that would redirect git away from `cwd`.
const GIT_ENV_OVERRIDES: [&str; 4] = [
    "GIT_DIR",
    "GIT_WORK_TREE",
    "GIT_INDEX_FILE",
    "GIT_COMMON_DIR",
];

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// How a remote is cloned into the scratch location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CloneOptions {
    /// `--depth`; `None` fetches full history.
    pub depth: Option<u32>,
    /// Kill the clone after this long.
    pub timeout: Option<Duration>,
}

/// Operations pkgsync performs against version control.
pub trait Vcs {
    /// Clone `source` into `dest`. `dest` must not exist.
    fn clone_repo(&self, source: &str, dest: &Path, opts: &CloneOptions)
        -> Result<(), CommandError>;

    /// Set the committer identity for the repository at `root`.
    fn configure_identity(&self, root: &Path, name: &str, email: &str)
        -> Result<(), CommandError>;

    /// Stage every change in the working tree.
    fn stage_all(&self, root: &Path) -> Result<(), CommandError>;

    /// Whether the index differs from `HEAD`.
    fn has_staged_changes(&self, root: &Path) -> Result<bool, CommandError>;

    fn commit(&self, root: &Path, message: &str) -> Result<(), CommandError>;

    /// Push `HEAD` to `branch` on `remote`.
    fn push(&self, root: &Path, remote: &str, branch: &str) -> Result<(), CommandError>;
}

// ---------------------------------------------------------------------------
// GitCli
// ---------------------------------------------------------------------------

/// [`Vcs`] backed by the `git` command-line tool.
#[derive(Debug, Clone)]
pub struct GitCli {
    program: PathBuf,
}

impl Default for GitCli {
    fn default() -> Self {
        Self::new("git")
    }
}

/// Captured result of a finished command.
#[derive(Debug)]
struct Finished {
    status: ExitStatus,
    stderr: String,
}

impl GitCli {
    /// Use `program` instead of `git` from `PATH`.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn command<I, S>(&self, cwd: Option<&Path>, args: I) -> (Command, String)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let args: Vec<OsString> = args.into_iter().map(|a| a.as_ref().to_owned()).collect();
        let display = std::iter::once(self.program.as_os_str())
            .chain(args.iter().map(OsString::as_os_str))
            .map(|a| a.to_string_lossy())
            .collect::<Vec<_>>()
            .join(" ");

        let mut cmd = Command::new(&self.program);
        cmd.args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .env("GIT_TERMINAL_PROMPT", "0");
        for key in GIT_ENV_OVERRIDES {
            cmd.env_remove(key);
        }
        if let Some(dir) = cwd {
            cmd.current_dir(dir);
        }
        (cmd, display)
    }

    /// Run to completion (or until `timeout`), capturing stderr.
    fn exec<I, S>(
        &self,
        cwd: Option<&Path>,
        args: I,
        timeout: Option<Duration>,
    ) -> Result<(Finished, String), CommandError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let (mut cmd, command) = self.command(cwd, args);
        tracing::debug!("running: {command}");

        let mut child = cmd.spawn().map_err(|source| CommandError::Spawn {
            command: command.clone(),
            source,
        })?;
        let stderr = drain(child.stderr.take());

        let deadline = timeout.map(|t| (Instant::now() + t, t));
        let status = loop {
            match child.try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) => {
                    if let Some((at, after)) = deadline {
                        if Instant::now() >= at {
                            let _ = child.kill();
                            let _ = child.wait();
                            // Helpers spawned by git may still hold the pipe; don't join.
                            drop(stderr);
                            return Err(CommandError::TimedOut { command, after });
                        }
                    }
                    thread::sleep(POLL_INTERVAL);
                }
                Err(source) => {
                    let _ = child.kill();
                    return Err(CommandError::Spawn { command, source });
                }
            }
        };

        let stderr = stderr
            .and_then(|handle| handle.join().ok())
            .unwrap_or_default();
        Ok((Finished { status, stderr }, command))
    }

    /// Like [`Self::exec`], but a non-zero exit is an error.
    fn run<I, S>(
        &self,
        cwd: Option<&Path>,
        args: I,
        timeout: Option<Duration>,
    ) -> Result<(), CommandError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let (finished, command) = self.exec(cwd, args, timeout)?;
        if finished.status.success() {
            return Ok(());
        }
        Err(failed(command, finished))
    }
}

fn failed(command: String, finished: Finished) -> CommandError {
    let status = match finished.status.code() {
        Some(code) => format!("exit code {code}"),
        None => "signal".to_string(),
    };
    CommandError::Failed {
        command,
        status,
        stderr: finished.stderr.trim().to_string(),
    }
}

/// Read a pipe to the end on a helper thread so the child never blocks on a full buffer.
fn drain<R>(pipe: Option<R>) -> Option<JoinHandle<String>>
where
    R: Read + Send + 'static,
{
    pipe.map(|mut pipe| {
        thread::spawn(move || {
            let mut buf = Vec::new();
            let _ = pipe.read_to_end(&mut buf);
            String::from_utf8_lossy(&buf).into_owned()
        })
    })
}

impl Vcs for GitCli {
    fn clone_repo(
        &self,
        source: &str,
        dest: &Path,
        opts: &CloneOptions,
    ) -> Result<(), CommandError> {
        let mut args: Vec<OsString> = vec!["clone".into(), "--quiet".into()];
        if let Some(depth) = opts.depth {
            args.push("--depth".into());
            args.push(depth.to_string().into());
        }
        args.push("--".into());
        args.push(source.into());
        args.push(dest.as_os_str().to_owned());
        self.run(None, args, opts.timeout)
    }

    fn configure_identity(
        &self,
        root: &Path,
        name: &str,
        email: &str,
    ) -> Result<(), CommandError> {
        self.run(Some(root), ["config", "user.name", name], None)?;
        self.run(Some(root), ["config", "user.email", email], None)
    }

    fn stage_all(&self, root: &Path) -> Result<(), CommandError> {
        self.run(Some(root), ["add", "--all"], None)
    }

    fn has_staged_changes(&self, root: &Path) -> Result<bool, CommandError> {
        let (finished, command) = self.exec(Some(root), ["diff", "--cached", "--quiet"], None)?;
        match finished.status.code() {
            Some(0) => Ok(false),
            Some(1) => Ok(true),
            _ => Err(failed(command, finished)),
        }
    }

    fn commit(&self, root: &Path, message: &str) -> Result<(), CommandError> {
        self.run(Some(root), ["commit", "--quiet", "-m", message], None)
    }

    fn push(&self, root: &Path, remote: &str, branch: &str) -> Result<(), CommandError> {
        let refspec = format!("HEAD:refs/heads/{branch}");
        self.run(Some(root), ["push", remote, refspec.as_str()], None)
    }
}
