//! Diff command - Compare two snapshots
//!
//! The old snapshot is the reference, the new one the candidate; the
//! comparison is the same one-directional check `verify` runs against a
//! live module. Exit code 1 when findings exist.

use std::path::Path;

use anyhow::Result;
use colored::Colorize;
use serde::Serialize;

use crate::cli::commands::{load_snapshot, print_findings};
use crate::cli::OutputFormat;
use crate::verifier::{diff_fingerprints, Verdict};

#[derive(Serialize)]
struct DiffReport<'a> {
    reference: String,
    candidate: String,
    #[serde(flatten)]
    verdict: &'a Verdict,
}

pub fn run(old: &Path, new: &Path, format: OutputFormat) -> Result<()> {
    let reference = load_snapshot(old)?;
    let candidate = load_snapshot(new)?;

    let verdict = Verdict::from_findings(diff_fingerprints(
        &reference.fingerprint,
        &candidate.fingerprint,
    ));

    match format {
        OutputFormat::Json => {
            let report = DiffReport {
                reference: old.display().to_string(),
                candidate: new.display().to_string(),
                verdict: &verdict,
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        OutputFormat::Text => {
            println!("{}", "━".repeat(60).dimmed());
            println!("{}", "Diffing snapshots".cyan());
            println!(
                "  Reference: {} ({})",
                old.display(),
                reference.fingerprint.short_digest()
            );
            println!(
                "  Candidate: {} ({})",
                new.display(),
                candidate.fingerprint.short_digest()
            );
            println!();

            if verdict.is_compatible() {
                println!(
                    "{}",
                    "✓ Candidate provides everything the reference records"
                        .green()
                        .bold()
                );
            } else {
                print_findings(verdict.findings(), format)?;
            }
        }
    }

    if !verdict.is_compatible() {
        std::process::exit(1);
    }
    Ok(())
}
