//! `pkgsync init [--root DIR] [--force]`

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Args;

use pkgsync_core::{settings, Settings};

const MANIFEST_TEMPLATE: &str = "\
# One repository per line: <source>[,<subpath>][;]
#
# The subpath's last component (or the repository name when no subpath is
# given) becomes a top-level directory of this tree. Directories not listed
# here are removed on sync, except .git and the `preserve` list in
# pkgsync.yaml.
#
# https://github.com/example/tools.git,packages/cli;
";

/// Write a default `pkgsync.yaml` and `packages` manifest.
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Working-tree root (defaults to the current directory).
    #[arg(long, value_name = "DIR")]
    pub root: Option<PathBuf>,

    /// Overwrite existing files.
    #[arg(long)]
    pub force: bool,
}

impl InitArgs {
    pub fn run(self) -> Result<()> {
        let root = crate::resolve_root(self.root)?;
        let defaults = Settings::default();
        let settings_path = settings::settings_path_at(&root);
        let manifest_path = defaults.manifest_path(&root);

        if !self.force {
            for path in [&settings_path, &manifest_path] {
                if path.exists() {
                    bail!(
                        "'{}' already exists; pass --force to overwrite",
                        path.display()
                    );
                }
            }
        }

        let written = settings::save_at(&root, &defaults)
            .with_context(|| format!("failed to write settings under '{}'", root.display()))?;
        println!("✓ Wrote {}", written.display());

        std::fs::write(&manifest_path, MANIFEST_TEMPLATE)
            .with_context(|| format!("failed to write '{}'", manifest_path.display()))?;
        println!("✓ Wrote {}", manifest_path.display());
        Ok(())
    }
}
