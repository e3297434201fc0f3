//! # Error Types — Build-Phase Failures
//!
//! Errors raised while assembling the inputs of a validation run: merging
//! definition sources into the prefix trie and reading the product target.
//! All of them are fatal for the run. Per-event problems never surface as
//! errors; they are recorded as data by the live validator.

use thiserror::Error;

/// Top-level error type for the core data model.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// The same absolute prefix was defined twice across definition sources.
    #[error("Duplicate pixel definition found for {prefix}")]
    DuplicateDefinition {
        /// The prefix whose terminal slot was already populated.
        prefix: String,
    },

    /// A prefix segment collides with the reserved terminal key of the
    /// serialized trie.
    #[error("prefix '{prefix}' uses reserved segment '{segment}'")]
    ReservedSegment {
        /// The offending prefix.
        prefix: String,
        /// The reserved segment.
        segment: String,
    },

    /// The product target version is not a semantic version.
    #[error("invalid target version '{version}' for key '{key}'")]
    InvalidTargetVersion {
        /// The configured version key.
        key: String,
        /// The unparseable version string.
        version: String,
    },
}
