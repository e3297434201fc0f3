//! # Live Validation Errors
//!
//! Build-phase failures ([`LiveBuildError`]) abort a run. Everything that
//! goes wrong with an individual event is recorded in the ledger instead;
//! the only per-event error type is [`SinglePixelError`], used when one
//! pixel is checked on its own and the caller wants a verdict.

use pixval_core::CoreError;
use pixval_schema::CompileError;
use thiserror::Error;

/// Failure while building a live validator.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LiveBuildError {
    /// A defined prefix failed to compile.
    #[error("{prefix} --> {source}")]
    Compile {
        prefix: String,
        #[source]
        source: CompileError,
    },

    /// The product target is unusable.
    #[error(transparent)]
    Core(#[from] CoreError),
}

/// The params representation of an event could not be read.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid params representation: {reason}")]
pub struct ParamsReprError {
    pub reason: String,
}

/// A pixel URL that does not address a pixel.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RequestError {
    #[error("invalid pixel url '{url}': {reason}")]
    Malformed { url: String, reason: String },

    #[error("'{path}' is not a pixel path (expected /t/<name>)")]
    NotPixelPath { path: String },
}

/// Verdict on a single pixel checked outside a batch.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SinglePixelError {
    #[error("undocumented pixel '{pixel}'")]
    Undocumented { pixel: String },

    #[error("pixel '{pixel}' failed validation against {prefix}: {}", errors.join("; "))]
    Invalid {
        pixel: String,
        prefix: String,
        errors: Vec<String>,
    },
}
