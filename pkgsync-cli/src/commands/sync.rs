//! `pkgsync sync`: reconcile the working tree, optionally publish.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use pkgsync_core::settings::settings_path_at;
use pkgsync_sync::{pipeline, EntryOutcome, GitCli, PublishOutcome, RunReport, SyncOptions};

/// Arguments for `pkgsync sync`.
#[derive(Args, Debug)]
pub struct SyncArgs {
    /// Working-tree root (defaults to the current directory).
    #[arg(long, value_name = "DIR")]
    pub root: Option<PathBuf>,

    /// Manifest file, relative to the root unless absolute.
    #[arg(long, value_name = "FILE")]
    pub manifest: Option<PathBuf>,

    /// Show what would change without touching the working tree.
    #[arg(long)]
    pub dry_run: bool,

    /// Commit and push the result (also enabled by `publish.enabled`).
    #[arg(long)]
    pub publish: bool,

    /// Branch to push to when publishing.
    #[arg(long, value_name = "B")]
    pub branch: Option<String>,

    /// Clone depth; 0 for a full clone.
    #[arg(long, value_name = "N")]
    pub depth: Option<u32>,

    /// Per-clone timeout in seconds; 0 disables it.
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Emit the run report as JSON.
    #[arg(long)]
    pub json: bool,
}

impl SyncArgs {
    pub fn run(self) -> Result<()> {
        let root = crate::resolve_root(self.root)?;
        let mut settings = crate::load_settings(&root, self.manifest)?;
        if let Some(branch) = self.branch {
            settings.publish.branch = branch;
        }
        if let Some(depth) = self.depth {
            settings.clone_depth = depth;
        }
        if let Some(timeout) = self.timeout {
            settings.fetch_timeout_secs = timeout;
        }
        settings
            .validate(&settings_path_at(&root))
            .context("invalid settings after applying command-line overrides")?;

        let options = SyncOptions {
            dry_run: self.dry_run,
            publish: self.publish || settings.publish.enabled,
        };
        let report = pipeline::run(&root, &settings, options, &GitCli::default())
            .with_context(|| format!("sync failed in '{}'", root.display()))?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&report)?);
        } else {
            print_report(&report);
        }
        Ok(())
    }
}

fn print_report(report: &RunReport) {
    let dry_run = report.reconcile.dry_run;
    let prefix = if dry_run { "[dry-run] " } else { "" };

    for warning in &report.malformed {
        println!("  {}  {warning}", "!".yellow());
    }

    for r in &report.reconcile.entries {
        let target = r
            .target
            .as_ref()
            .map(|t| t.to_string())
            .unwrap_or_else(|| "-".to_string());
        match &r.outcome {
            EntryOutcome::Synced => {
                println!("  {}  {} -> {target}", "✎".green(), r.entry)
            }
            EntryOutcome::WouldSync => println!("  ~  {} -> {target}", r.entry),
            EntryOutcome::Unsafe { reason }
            | EntryOutcome::FetchFailed { reason }
            | EntryOutcome::Failed { reason } => {
                println!("  {}  {}: {reason}", "✗".red(), r.entry)
            }
            EntryOutcome::PathNotFound { subpath } => println!(
                "  {}  {}: path '{}' not found",
                "✗".red(),
                r.entry,
                subpath.display()
            ),
        }
    }

    for removed in &report.reconcile.removed {
        let verb = if dry_run { "would remove" } else { "removed" };
        println!("  -  {verb} {}", removed.display());
    }

    let summary = format!(
        "{prefix}✓ {} synced, {} skipped, {} malformed, {} stale",
        report.reconcile.synced(),
        report.reconcile.skipped(),
        report.malformed.len(),
        report.reconcile.removed.len()
    );
    if report.reconcile.skipped() > 0 || !report.malformed.is_empty() {
        println!("{}", summary.yellow());
    } else {
        println!("{}", summary.green());
    }

    match &report.publish {
        Some(PublishOutcome::Pushed { remote, branch }) => {
            println!("{}", format!("✓ pushed to {remote}/{branch}").green())
        }
        Some(PublishOutcome::NothingToCommit) => println!("· nothing to publish"),
        None => {}
    }
}
