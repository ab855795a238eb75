//! `pkgsync list`: parse the manifest and show where each entry lands.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use pkgsync_core::Manifest;

/// Arguments for `pkgsync list`.
#[derive(Args, Debug)]
pub struct ListArgs {
    /// Working-tree root (defaults to the current directory).
    #[arg(long, value_name = "DIR")]
    pub root: Option<PathBuf>,

    /// Manifest file, relative to the root unless absolute.
    #[arg(long, value_name = "FILE")]
    pub manifest: Option<PathBuf>,

    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Serialize)]
struct ListRow {
    line: usize,
    source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    subpath: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    target: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    skipped: Option<String>,
}

#[derive(Tabled)]
struct ListTableRow {
    #[tabled(rename = "line")]
    line: usize,
    #[tabled(rename = "source")]
    source: String,
    #[tabled(rename = "subpath")]
    subpath: String,
    #[tabled(rename = "target")]
    target: String,
}

impl ListArgs {
    pub fn run(self) -> Result<()> {
        let root = crate::resolve_root(self.root)?;
        let settings = crate::load_settings(&root, self.manifest)?;
        let manifest_path = settings.manifest_path(&root);
        let manifest = Manifest::load_at(&manifest_path)
            .with_context(|| format!("cannot list '{}'", manifest_path.display()))?;

        let rows: Vec<ListRow> = manifest
            .entries()
            .map(|item| match item {
                Ok(entry) => {
                    let (target, skipped) = match settings.target_for(&root, &entry) {
                        Ok(target) => (Some(target.to_string()), None),
                        Err(err) => (None, Some(err.to_string())),
                    };
                    ListRow {
                        line: entry.line,
                        source: entry.source,
                        subpath: entry.subpath,
                        target,
                        skipped,
                    }
                }
                Err(warning) => ListRow {
                    line: warning.line,
                    source: warning.content.clone(),
                    subpath: None,
                    target: None,
                    skipped: Some(warning.reason.to_string()),
                },
            })
            .collect();

        if self.json {
            println!("{}", serde_json::to_string_pretty(&rows)?);
            return Ok(());
        }
        print_table(&rows);
        Ok(())
    }
}

fn print_table(rows: &[ListRow]) {
    if rows.is_empty() {
        println!("No entries in manifest.");
        return;
    }

    let table_rows = rows.iter().map(|row| ListTableRow {
        line: row.line,
        source: row.source.clone(),
        subpath: row.subpath.clone().unwrap_or_default(),
        target: match (&row.target, &row.skipped) {
            (Some(target), _) => format!("./{target}").green().to_string(),
            (None, Some(reason)) => format!("skipped: {reason}").yellow().to_string(),
            (None, None) => String::new(),
        },
    });
    let mut table = Table::new(table_rows);
    table.with(Style::rounded());
    println!("{table}");

    let skipped = rows.iter().filter(|r| r.skipped.is_some()).count();
    println!("{} entries, {} skipped", rows.len(), skipped);
}
