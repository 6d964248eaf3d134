//! Command implementations

use std::path::Path;

use anyhow::Result;
use colored::Colorize;

use crate::cli::OutputFormat;
use crate::errors::SurfprintError;
use crate::scanner::{DirSource, ScanPolicy, ScanStats};
use crate::store::Snapshot;
use crate::verifier::Finding;

pub mod common;
pub mod diff;
pub mod init;
pub mod show;
pub mod snapshot;
pub mod verify;

/// Policy file looked for in the working directory when `--policy` is not
/// given.
pub const DEFAULT_POLICY_FILE: &str = ".surfprint.toml";

/// Resolve the scan policy: an explicit `--policy` path, else the policy
/// file in the working directory, else the built-in default.
pub(crate) fn load_policy(explicit: Option<&Path>) -> Result<ScanPolicy> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => {
            let local = Path::new(DEFAULT_POLICY_FILE);
            if !local.exists() {
                tracing::debug!("no {DEFAULT_POLICY_FILE}, using built-in policy");
                return Ok(ScanPolicy::default());
            }
            local.to_path_buf()
        }
    };

    tracing::debug!("loading scan policy from {}", path.display());
    ScanPolicy::load(&path).map_err(|err| SurfprintError::from_policy(err).into())
}

pub(crate) fn open_module(path: &Path) -> Result<DirSource> {
    if !path.is_dir() {
        return Err(SurfprintError::module_not_found(path).into());
    }
    Ok(DirSource::new(path))
}

pub(crate) fn load_snapshot(path: &Path) -> Result<Snapshot> {
    Snapshot::load(path).map_err(|err| SurfprintError::bad_snapshot(path, &err).into())
}

pub(crate) fn print_scan_stats(stats: &ScanStats) {
    println!(
        "  Types: {} fingerprinted, {} listed ({} skipped, {} out of policy, {} excluded)",
        stats.types_fingerprinted,
        stats.types_listed,
        stats.types_skipped,
        stats.types_out_of_policy,
        stats.types_excluded,
    );
    if stats.members_skipped > 0 {
        println!(
            "  {} {} unreadable member records dropped",
            "⚠".yellow(),
            stats.members_skipped
        );
    }
    println!("  Duration: {}ms", stats.duration_ms);
}

pub(crate) fn print_findings(findings: &[Finding], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(findings)?);
        }
        OutputFormat::Text => {
            for finding in findings {
                println!("  {} {}", "-".red(), finding);
            }
            println!();
            println!(
                "{}",
                format!("✖ {} incompatibilities found", findings.len())
                    .red()
                    .bold()
            );
        }
    }
    Ok(())
}
