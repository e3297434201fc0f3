//! # Compile Errors
//!
//! Structural problems found while resolving and compiling a pixel's
//! parameter or suffix list. They are returned as values so each caller
//! picks its own policy: the live validator aborts the run on the first
//! one, the definition checker collects them across every prefix.

use thiserror::Error;

/// Error raised while compiling a parameter or suffix list.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CompileError {
    /// A shortcut names no entry in the common dictionary.
    #[error("invalid shortcut '{name}' - please update common params/suffixes")]
    UnknownShortcut {
        /// The unresolved shortcut name.
        name: String,
    },

    /// Two entries resolve to the same fixed parameter key.
    #[error("duplicate key '{key}' found!")]
    DuplicateKey {
        /// The repeated key.
        key: String,
    },

    /// Two entries declare the same key pattern.
    #[error("duplicate keyPattern '{pattern}' found!")]
    DuplicateKeyPattern {
        /// The repeated pattern.
        pattern: String,
    },

    /// A fixed key is also claimed by a declared key pattern.
    #[error("property {key} matches pattern {pattern}")]
    KeyMatchesPattern {
        /// The fixed key.
        key: String,
        /// The pattern that also matches it.
        pattern: String,
    },

    /// A key pattern (or a nested `patternProperties` entry) is not a
    /// valid regular expression. Patterns use `regex` crate syntax, which
    /// has no lookaround or backreferences.
    #[error("invalid keyPattern '{pattern}' (lookaround and backreferences are unsupported): {reason}")]
    InvalidKeyPattern {
        /// The offending pattern.
        pattern: String,
        /// Why the regex engine rejected it.
        reason: String,
    },

    /// A parameter declares neither `key` nor `keyPattern`.
    #[error("parameter must declare either 'key' or 'keyPattern'")]
    MissingKey,

    /// A parameter declares both `key` and `keyPattern`.
    #[error("parameter declares both key '{key}' and keyPattern '{pattern}'")]
    AmbiguousIdentity {
        /// The declared key.
        key: String,
        /// The declared pattern.
        pattern: String,
    },

    /// The emitted JSON Schema was rejected by the validator builder.
    #[error("schema build error: {reason}")]
    SchemaBuild {
        /// The builder's message.
        reason: String,
    },
}
