//! pkgsync: mirror remote repositories into a working tree from a manifest.
//!
//! # Usage
//!
//! ```text
//! pkgsync init [--root DIR] [--force]
//! pkgsync list [--root DIR] [--manifest FILE] [--json]
//! pkgsync sync [--root DIR] [--manifest FILE] [--dry-run] [--publish]
//!              [--branch B] [--depth N] [--timeout SECS] [--json]
//! ```

mod commands {
    pub mod init;
    pub mod list;
    pub mod sync;
}

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use commands::{init::InitArgs, list::ListArgs, sync::SyncArgs};
use pkgsync_core::{settings, Settings};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "pkgsync",
    version,
    about = "Mirror directories of remote git repositories into a working tree",
    long_about = None,
)]
struct Cli {
    /// Log at debug level (overridden by RUST_LOG).
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Write a default pkgsync.yaml and packages manifest.
    Init(InitArgs),

    /// Show manifest entries and the directory each one syncs to.
    List(ListArgs),

    /// Reconcile the working tree against the manifest.
    Sync(SyncArgs),
}

// ---------------------------------------------------------------------------
// Shared helpers
// ---------------------------------------------------------------------------

/// Canonical working-tree root, defaulting to the current directory.
pub(crate) fn resolve_root(root: Option<PathBuf>) -> Result<PathBuf> {
    let root = match root {
        Some(root) => root,
        None => std::env::current_dir().context("could not determine current directory")?,
    };
    root.canonicalize()
        .with_context(|| format!("cannot resolve root '{}'", root.display()))
}

/// Settings from `<root>/pkgsync.yaml` with an optional manifest override.
pub(crate) fn load_settings(root: &Path, manifest: Option<PathBuf>) -> Result<Settings> {
    let mut settings = settings::load_at(root)
        .with_context(|| format!("failed to load settings under '{}'", root.display()))?;
    if let Some(manifest) = manifest {
        settings.manifest = manifest;
    }
    tracing::debug!("root {}: {settings:?}", root.display());
    Ok(settings)
}

fn init_tracing(verbose: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match cli.command {
        Commands::Init(args) => args.run(),
        Commands::List(args) => args.run(),
        Commands::Sync(args) => args.run(),
    }
}
