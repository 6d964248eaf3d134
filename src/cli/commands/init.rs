//! Init command - Generate a scan policy file

use anyhow::{bail, Result};
use colored::Colorize;
use std::fs;
use std::path::Path;
use tracing::info;

use crate::scanner::DEFAULT_POLICY_TOML;

pub fn run(output: &str, force: bool) -> Result<()> {
    info!("generating scan policy file: {output}");

    let path = Path::new(output);

    if path.exists() && !force {
        bail!(
            "Policy file already exists: {}. Use --force to overwrite.",
            output
        );
    }

    fs::write(path, DEFAULT_POLICY_TOML)?;

    println!("{}", "✓ Scan policy created".green());
    println!("  Location: {}", output.yellow());
    println!();
    println!(
        "Edit {} to adjust which namespaces get scanned.",
        output.cyan()
    );

    Ok(())
}
