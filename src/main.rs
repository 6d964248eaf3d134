//! Surfprint - Library Surface Fingerprinting and Compatibility Verification
//!
//! Command line front end: take structural snapshots of a compiled
//! module's externally visible surface and verify later builds against
//! them.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

// Declare modules (shared with lib.rs)
mod cli;
mod errors;
#[allow(dead_code)]
mod graph;
#[allow(dead_code)]
mod scanner;
#[allow(dead_code)]
mod signature;
#[allow(dead_code)]
mod store;
#[allow(dead_code)]
mod verifier;
#[allow(dead_code)]
mod wire;

use cli::commands;
use cli::OutputFormat;

/// Surfprint - structural compatibility checks for compiled libraries
#[derive(Parser)]
#[command(
    name = "surfprint",
    version,
    about = "Library surface fingerprinting and compatibility verification",
    long_about = "Surfprint fingerprints the externally visible surface of a compiled\n\
                  module (types, constructors, methods, fields) and verifies that a\n\
                  later build still provides everything a saved snapshot records.\n\n\
                  Typical flow:\n\
                  \x20 surfprint snapshot build/types -o surface.sfp\n\
                  \x20 surfprint verify build/types -s surface.sfp"
)]
struct Cli {
    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Output format
    #[arg(short, long, default_value = "text", global = true)]
    format: OutputFormat,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Take a surface snapshot of a compiled module
    Snapshot {
        /// Directory of .tdef type definition records
        module: PathBuf,

        /// Where to write the snapshot
        #[arg(short, long, default_value = "surface.sfp")]
        output: PathBuf,

        /// Scan policy file (defaults to .surfprint.toml if present)
        #[arg(short, long)]
        policy: Option<PathBuf>,
    },

    /// Verify a module against a saved snapshot
    Verify {
        /// Directory of .tdef type definition records
        module: PathBuf,

        /// Snapshot to verify against
        #[arg(short, long)]
        snapshot: PathBuf,

        /// Scan policy file (defaults to .surfprint.toml if present)
        #[arg(short, long)]
        policy: Option<PathBuf>,
    },

    /// Show the contents of a snapshot
    Show {
        /// Snapshot file
        snapshot: PathBuf,

        /// List type names only, without members
        #[arg(long)]
        types_only: bool,
    },

    /// Compare two snapshots (old is the reference, new the candidate)
    Diff {
        /// Reference snapshot
        old: PathBuf,

        /// Candidate snapshot
        new: PathBuf,
    },

    /// Compute the surface two snapshots share
    Common {
        /// First snapshot
        a: PathBuf,

        /// Second snapshot
        b: PathBuf,

        /// Write the shared surface as a new snapshot
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Generate a scan policy file
    Init {
        /// Output path for the policy file
        #[arg(short, long, default_value = ".surfprint.toml")]
        output: String,

        /// Overwrite existing file
        #[arg(long)]
        force: bool,
    },
}

fn init_logging(verbosity: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbosity {
            0 => EnvFilter::new("surfprint=info"),
            1 => EnvFilter::new("surfprint=debug"),
            2 => EnvFilter::new("surfprint=trace"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();
}

fn main() {
    let cli = Cli::parse();

    init_logging(cli.verbose, cli.quiet);

    if let Err(err) = run(cli) {
        match err.downcast::<errors::SurfprintError>() {
            Ok(diagnostic) => eprintln!("{:?}", miette::Report::new(diagnostic)),
            Err(err) => eprintln!("{} {:#}", "error:".red().bold(), err),
        }
        std::process::exit(2);
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Snapshot {
            module,
            output,
            policy,
        } => commands::snapshot::run(&module, &output, policy.as_deref(), cli.format),
        Commands::Verify {
            module,
            snapshot,
            policy,
        } => commands::verify::run(&module, &snapshot, policy.as_deref(), cli.format),
        Commands::Show {
            snapshot,
            types_only,
        } => commands::show::run(&snapshot, types_only, cli.format),
        Commands::Diff { old, new } => commands::diff::run(&old, &new, cli.format),
        Commands::Common { a, b, output } => {
            commands::common::run(&a, &b, output.as_deref(), cli.format)
        }
        Commands::Init { output, force } => commands::init::run(&output, force),
    }
}
