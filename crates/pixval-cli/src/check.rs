//! # Check Subcommand
//!
//! Compiles every definition file of a pixel directory and reports each
//! broken definition, without stopping at the first.

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::Args;
use pixval_schema::{DefinitionChecker, SchemaCompiler};

use crate::files::{read_definitions, PixelDir};

/// Arguments for `pixval check`.
#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Pixel directory.
    #[arg(value_name = "DIR")]
    pub dir: PathBuf,

    /// Check a single definition file, relative to `<DIR>/pixels`.
    #[arg(short, long, value_name = "FILE")]
    pub file: Option<PathBuf>,
}

/// Execute the check subcommand. Exit code 1 when any definition is broken.
pub fn run_check(args: &CheckArgs) -> Result<u8> {
    let dir = PixelDir::open(&args.dir)?;
    let compiler = SchemaCompiler::new(dir.common_params()?, dir.common_suffixes()?);
    let mut checker = DefinitionChecker::new(compiler);

    let files = match &args.file {
        Some(rel) => vec![dir.pixels_dir().join(rel)],
        None => dir.definition_files()?,
    };

    let mut failed = false;
    for file in &files {
        failed |= check_file(&mut checker, file)?;
    }

    tracing::info!(
        files = files.len(),
        prefixes = checker.defined_count(),
        "checked pixel definitions"
    );
    Ok(u8::from(failed))
}

fn check_file(checker: &mut DefinitionChecker, file: &Path) -> Result<bool> {
    println!("Validating pixels definition: {}", file.display());
    let defs = read_definitions(file)?;
    let issues = checker.check(&defs);
    for issue in &issues {
        println!("ERROR in {}: {}", file.display(), issue);
    }
    Ok(!issues.is_empty())
}
