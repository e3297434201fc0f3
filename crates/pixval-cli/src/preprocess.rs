//! # Preprocess Subcommand
//!
//! Tokenizes every definition file of a pixel directory into one prefix
//! trie and writes it to `tokenized_pixels.json` for live validation.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use pixval_core::RawTrie;

use crate::files::{read_definitions, PixelDir, TOKENIZED_PIXELS};

/// Arguments for `pixval preprocess`.
#[derive(Args, Debug)]
pub struct PreprocessArgs {
    /// Pixel directory (contains pixels/ and the dictionaries).
    #[arg(value_name = "DIR")]
    pub dir: PathBuf,
}

/// Execute the preprocess subcommand.
pub fn run_preprocess(args: &PreprocessArgs) -> Result<u8> {
    let dir = PixelDir::open(&args.dir)?;
    let trie = tokenize_dir(&dir)?;

    let out = dir.write_result(TOKENIZED_PIXELS, &trie)?;
    println!("Writing out tokenized pixel defs to {}", out.display());
    tracing::info!(prefixes = trie.len(), "tokenized pixel definitions");
    Ok(0)
}

/// Merge every definition file of `dir` into one trie.
pub fn tokenize_dir(dir: &PixelDir) -> Result<RawTrie> {
    let mut trie = RawTrie::new();
    for file in dir.definition_files()? {
        println!("...Reading pixel def file: {}", file.display());
        let defs = read_definitions(&file)?;
        trie.tokenize(&defs)
            .with_context(|| format!("failed to tokenize {}", file.display()))?;
    }
    Ok(trie)
}
