//! # pixval-core — Foundational Types for Pixel Validation
//!
//! The data model shared by every other crate in the workspace:
//!
//! - [`definition`]: pixel definitions, parameter/suffix entries
//!   (shortcut or inline spec) and the common dictionaries shortcuts
//!   resolve against.
//! - [`trie`]: the tokenizer that arranges definitions into a prefix
//!   trie ([`RawTrie`]).
//! - [`product`]: the per-run product target and its version gate.
//! - [`normalize`]: the run's case policy ([`Normalizer`]).
//!
//! ## Crate Policy
//!
//! - No dependencies on other `pixval-*` crates (this is the leaf of the DAG).
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod definition;
pub mod error;
pub mod normalize;
pub mod product;
pub mod trie;

pub use definition::{
    CommonDictionary, Encoding, InlineSpec, ParamEntry, PixelDefinition, PixelDefinitions,
    SpecIdentity, DEFAULT_VALUE_TYPE,
};
pub use error::CoreError;
pub use normalize::Normalizer;
pub use product::{ClientVersion, ProductTarget, VersionGate, VersionTarget};
pub use trie::{RawTrie, TERMINAL_KEY};
