//! Verify command - Check a module against a saved snapshot
//!
//! Exit codes: 0 when the surface is compatible, 1 when findings exist.
//! Fatal errors propagate and exit 2.

use std::path::Path;

use anyhow::Result;
use colored::Colorize;
use serde::Serialize;
use tracing::info;

use crate::cli::commands::{load_policy, load_snapshot, open_module, print_findings, print_scan_stats};
use crate::cli::OutputFormat;
use crate::verifier::{Verdict, Verifier};

#[derive(Serialize)]
struct VerifyReport<'a> {
    snapshot: String,
    module: String,
    reference_digest: String,
    #[serde(flatten)]
    verdict: &'a Verdict,
}

pub fn run(
    module: &Path,
    snapshot_path: &Path,
    policy: Option<&Path>,
    format: OutputFormat,
) -> Result<()> {
    let policy = load_policy(policy)?;
    let source = open_module(module)?;
    let snapshot = load_snapshot(snapshot_path)?;

    info!(
        "verifying {} against {}",
        module.display(),
        snapshot_path.display()
    );

    let verifier = Verifier::new(policy);
    let outcome = verifier.verify(&snapshot.fingerprint, &source)?;

    match format {
        OutputFormat::Json => {
            let report = VerifyReport {
                snapshot: snapshot_path.display().to_string(),
                module: module.display().to_string(),
                reference_digest: snapshot.fingerprint.digest(),
                verdict: &outcome.verdict,
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        OutputFormat::Text => {
            println!("{}", "━".repeat(60).dimmed());
            println!(
                "{} {}",
                "Verifying:".cyan(),
                module.display().to_string().yellow().bold()
            );
            println!(
                "  Snapshot: {} ({} types, taken {})",
                snapshot_path.display(),
                snapshot.fingerprint.len(),
                snapshot.created_at.format("%Y-%m-%d %H:%M UTC")
            );
            println!();
            print_scan_stats(&outcome.stats);
            println!();

            if outcome.verdict.is_compatible() {
                println!("{}", "✓ Surface is compatible".green().bold());
            } else {
                print_findings(outcome.verdict.findings(), format)?;
            }
        }
    }

    if !outcome.verdict.is_compatible() {
        std::process::exit(1);
    }
    Ok(())
}
