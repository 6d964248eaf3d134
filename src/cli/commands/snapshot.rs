//! Snapshot command - Take a surface snapshot of a compiled module

use std::path::Path;

use anyhow::Result;
use colored::Colorize;
use serde::Serialize;
use tracing::{debug, info};

use crate::cli::commands::{load_policy, open_module, print_scan_stats};
use crate::cli::OutputFormat;
use crate::scanner::{ScanStats, SurfaceScanner};
use crate::store::Snapshot;

#[derive(Serialize)]
struct SnapshotReport<'a> {
    output: String,
    digest: String,
    created_at: chrono::DateTime<chrono::Utc>,
    types: usize,
    members: usize,
    stats: &'a ScanStats,
}

pub fn run(
    module: &Path,
    output: &Path,
    policy: Option<&Path>,
    format: OutputFormat,
) -> Result<()> {
    let policy = load_policy(policy)?;
    let source = open_module(module)?;

    info!("taking surface snapshot of {}", module.display());
    debug!(
        "policy: {} deny prefixes, root type {}",
        policy.deny_prefixes.len(),
        policy.root_type
    );

    let scanner = SurfaceScanner::new(policy);
    let outcome = scanner.scan_module(&source)?;

    let snapshot = Snapshot::new(outcome.fingerprint);
    snapshot.save(output)?;

    match format {
        OutputFormat::Json => {
            let report = SnapshotReport {
                output: output.display().to_string(),
                digest: snapshot.fingerprint.digest(),
                created_at: snapshot.created_at,
                types: snapshot.fingerprint.len(),
                members: snapshot.fingerprint.total_members(),
                stats: &outcome.stats,
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        OutputFormat::Text => {
            println!("{}", "━".repeat(60).dimmed());
            println!(
                "{} {}",
                "Snapshotting:".cyan(),
                module.display().to_string().yellow().bold()
            );
            println!();
            print_scan_stats(&outcome.stats);
            println!("  Digest: {}", snapshot.fingerprint.short_digest());
            println!();
            println!("{} {}", "Saved to:".green(), output.display());
        }
    }

    Ok(())
}
