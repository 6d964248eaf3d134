//! Common command - Intersect two snapshots

use std::path::Path;

use anyhow::Result;
use colored::Colorize;
use serde::Serialize;

use crate::cli::commands::load_snapshot;
use crate::cli::OutputFormat;
use crate::store::{LibraryFingerprint, Snapshot};

#[derive(Serialize)]
struct CommonReport<'a> {
    digest: String,
    types: usize,
    members: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    output: Option<String>,
    fingerprint: &'a LibraryFingerprint,
}

pub fn run(a: &Path, b: &Path, output: Option<&Path>, format: OutputFormat) -> Result<()> {
    let left = load_snapshot(a)?;
    let right = load_snapshot(b)?;

    let snapshot = Snapshot::new(left.fingerprint.common_surface(&right.fingerprint));
    let common = &snapshot.fingerprint;

    if let Some(path) = output {
        snapshot.save(path)?;
    }

    match format {
        OutputFormat::Json => {
            let report = CommonReport {
                digest: common.digest(),
                types: common.len(),
                members: common.total_members(),
                output: output.map(|p| p.display().to_string()),
                fingerprint: common,
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        OutputFormat::Text => {
            println!("{}", "━".repeat(60).dimmed());
            println!("{}", "Common surface".cyan());
            println!(
                "  {} ({} types) and {} ({} types)",
                a.display(),
                left.fingerprint.len(),
                b.display(),
                right.fingerprint.len()
            );
            println!(
                "  Shared: {} types, {} members",
                common.len(),
                common.total_members()
            );
            println!();
            print!("{}", common.render());
            if let Some(path) = output {
                println!();
                println!("{} {}", "Saved to:".green(), path.display());
            }
        }
    }

    Ok(())
}
