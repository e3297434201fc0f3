//! # Validate-Live Subcommand
//!
//! Streams exported live events from a CSV file through the live
//! validator and writes the aggregated results.
//!
//! The CSV must have a header row with `pixel` and `params` columns; the
//! `params` column holds the exported fragment list (`['a=1','b=2']`).
//! Other columns are ignored.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use pixval_live::LivePixelValidator;
use pixval_schema::SchemaCompiler;
use serde::Deserialize;

use crate::files::{thousands, PixelDir, DEFAULT_LIVE_CSV, PIXEL_ERRORS, UNDOCUMENTED_PIXELS};

const PROGRESS_EVERY: u64 = 100_000;

/// Arguments for `pixval validate-live`.
#[derive(Args, Debug)]
pub struct ValidateLiveArgs {
    /// Pixel directory with a preprocessed (tokenized) definition trie.
    #[arg(value_name = "DIR")]
    pub dir: PathBuf,

    /// CSV file of live events. Defaults to
    /// `<DIR>/pixel_processing_results/live_pixels.csv`.
    #[arg(value_name = "CSV")]
    pub csv: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
struct LiveRow {
    pixel: String,
    params: String,
}

/// Execute the validate-live subcommand.
pub fn run_validate_live(args: &ValidateLiveArgs) -> Result<u8> {
    let dir = PixelDir::open(&args.dir)?;
    let csv_path = match &args.csv {
        Some(path) => path.clone(),
        None => dir.results_dir()?.join(DEFAULT_LIVE_CSV),
    };
    println!(
        "Validating live pixels in {} against definitions from {}",
        csv_path.display(),
        dir.root().display()
    );

    let mut validator = build_from_tokenized(&dir)?;
    stream_csv(&csv_path, &mut validator)?;

    let (ledger, undocumented, stats) = validator.into_results();
    println!("\nDone.\nTotal pixels processed: {}", thousands(stats.processed));
    println!("Undocumented pixels: {}", thousands(undocumented.len() as u64));
    tracing::info!(
        validated = stats.validated(),
        version_skipped = stats.version_skipped,
        failing = stats.failing,
        "live validation finished"
    );

    dir.write_result(UNDOCUMENTED_PIXELS, &undocumented)?;
    dir.write_result(PIXEL_ERRORS, &ledger)?;
    println!("Validation results saved to {}", dir.results_dir()?.display());
    Ok(0)
}

/// Build a validator from the directory's tokenized trie.
fn build_from_tokenized(dir: &PixelDir) -> Result<LivePixelValidator> {
    let product = dir.product()?;
    let compiler = SchemaCompiler::new(dir.common_params()?, dir.common_suffixes()?);
    let trie = dir
        .tokenized_pixels()
        .context("tokenized definitions missing; run `pixval preprocess` first")?;
    let ignore = dir.ignore_params()?;
    LivePixelValidator::new(&trie, &product, &ignore, compiler)
        .context("failed to compile pixel definitions")
}

fn stream_csv(path: &Path, validator: &mut LivePixelValidator) -> Result<()> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("failed to open {}", path.display()))?;

    let mut rows = 0u64;
    for record in reader.deserialize::<LiveRow>() {
        let row = record.with_context(|| format!("failed to read {}", path.display()))?;
        rows += 1;
        if rows % PROGRESS_EVERY == 0 {
            println!("...Processing row {}...", thousands(rows));
        }
        validator.validate_pixel(&row.pixel, &row.params);
    }
    Ok(())
}
