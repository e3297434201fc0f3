//! # pixval CLI entry point
//!
//! Parses command-line arguments and dispatches to subcommand handlers.

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use pixval_cli::check::{run_check, CheckArgs};
use pixval_cli::live::{run_validate_live, ValidateLiveArgs};
use pixval_cli::preprocess::{run_preprocess, PreprocessArgs};
use pixval_cli::url::{run_validate_url, ValidateUrlArgs};

/// Pixel definition tooling and live pixel validation.
#[derive(Parser, Debug)]
#[command(name = "pixval", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Tokenize pixel definitions into a prefix trie.
    Preprocess(PreprocessArgs),

    /// Validate live pixels from a CSV export.
    ValidateLive(ValidateLiveArgs),

    /// Validate a single pixel URL.
    ValidateUrl(ValidateUrlArgs),

    /// Compile every definition and report broken ones.
    Check(CheckArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // RUST_LOG wins over -v.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    tracing::debug!("pixval CLI starting");

    let result = match cli.command {
        Commands::Preprocess(args) => run_preprocess(&args),
        Commands::ValidateLive(args) => run_validate_live(&args),
        Commands::ValidateUrl(args) => run_validate_url(&args),
        Commands::Check(args) => run_check(&args),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(1)
        }
    }
}
