//! Show command - Print the contents of a snapshot

use std::path::Path;

use anyhow::Result;
use colored::Colorize;
use serde::Serialize;

use crate::cli::commands::load_snapshot;
use crate::cli::OutputFormat;
use crate::store::LibraryFingerprint;

#[derive(Serialize)]
struct ShowReport<'a> {
    digest: String,
    created_at: chrono::DateTime<chrono::Utc>,
    types: usize,
    members: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    type_names: Option<Vec<&'a str>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    fingerprint: Option<&'a LibraryFingerprint>,
}

pub fn run(snapshot_path: &Path, types_only: bool, format: OutputFormat) -> Result<()> {
    let snapshot = load_snapshot(snapshot_path)?;

    match format {
        OutputFormat::Json => {
            let report = ShowReport {
                digest: snapshot.fingerprint.digest(),
                created_at: snapshot.created_at,
                types: snapshot.fingerprint.len(),
                members: snapshot.fingerprint.total_members(),
                type_names: types_only.then(|| {
                    snapshot
                        .fingerprint
                        .types()
                        .iter()
                        .map(|fp| fp.name.as_str())
                        .collect()
                }),
                fingerprint: (!types_only).then_some(&snapshot.fingerprint),
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        OutputFormat::Text => {
            println!("{}", "━".repeat(60).dimmed());
            println!(
                "{} {}",
                "Snapshot:".cyan(),
                snapshot_path.display().to_string().yellow().bold()
            );
            println!(
                "  Taken:  {}",
                snapshot.created_at.format("%Y-%m-%d %H:%M UTC")
            );
            println!("  Digest: {}", snapshot.fingerprint.digest());
            println!(
                "  Types:  {} ({} members)",
                snapshot.fingerprint.len(),
                snapshot.fingerprint.total_members()
            );
            println!();
            if types_only {
                for fp in snapshot.fingerprint.types() {
                    println!("type {}", fp.name);
                }
            } else {
                print!("{}", snapshot.fingerprint.render());
            }
        }
    }

    Ok(())
}
