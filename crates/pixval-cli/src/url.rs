//! # Validate-URL Subcommand
//!
//! Checks one pixel URL against the definitions of a pixel directory.
//! Definitions are tokenized straight from `pixels/`, so no preprocessing
//! step is needed.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use pixval_live::{LivePixelValidator, PixelRequest, SinglePixelError};
use pixval_schema::SchemaCompiler;

use crate::files::PixelDir;
use crate::preprocess::tokenize_dir;

/// Arguments for `pixval validate-url`.
#[derive(Args, Debug)]
pub struct ValidateUrlArgs {
    /// Pixel directory.
    #[arg(value_name = "DIR")]
    pub dir: PathBuf,

    /// Pixel URL, absolute or a path such as `/t/m_app_crash?a=1`.
    #[arg(value_name = "URL")]
    pub url: String,
}

/// Execute the validate-url subcommand. Exit code 1 when the pixel is
/// undocumented or invalid.
pub fn run_validate_url(args: &ValidateUrlArgs) -> Result<u8> {
    let dir = PixelDir::open(&args.dir)?;
    let request = PixelRequest::from_url(&args.url)?;

    let trie = tokenize_dir(&dir)?;
    let compiler = SchemaCompiler::new(dir.common_params()?, dir.common_suffixes()?);
    let validator =
        LivePixelValidator::new(&trie, &dir.product()?, &dir.ignore_params()?, compiler)
            .context("failed to compile pixel definitions")?;

    match validator.validate_request(&request) {
        Ok(()) => {
            println!("OK: {}", request.pixel);
            Ok(0)
        }
        Err(SinglePixelError::Undocumented { pixel }) => {
            println!("ERROR: undocumented pixel {pixel}");
            Ok(1)
        }
        Err(SinglePixelError::Invalid { prefix, errors, .. }) => {
            for error in &errors {
                println!("ERROR: {prefix} {error}");
            }
            Ok(1)
        }
    }
}
