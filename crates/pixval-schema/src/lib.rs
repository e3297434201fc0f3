//! # pixval-schema — Schema Compilation for Pixel Definitions
//!
//! Turns a pixel's parameter and suffix lists into two strict structural
//! validators backed by `jsonschema`.
//!
//! ## Compilation (`compile`)
//!
//! [`SchemaCompiler`] resolves shortcuts against the common dictionaries,
//! applies spec defaults and emits a draft 2020-12 JSON Schema per list:
//!
//! - [`SchemaCompiler::compile_params`]: keys become exact properties,
//!   key patterns become pattern properties, nothing else is accepted.
//! - [`SchemaCompiler::compile_suffixes`]: entries occupy positions; a
//!   keyed entry pins its literal token before its own constraint.
//!
//! Live values arrive as strings, so each validator carries a
//! [`CoercionPlan`] that converts numeric and boolean strings before the
//! structural check runs.
//!
//! ## Reporting (`report`)
//!
//! [`Violation`] renders validator errors as the fixed strings that key
//! the error ledger.
//!
//! ## Checking (`check`)
//!
//! [`DefinitionChecker`] compiles whole definition files and collects every
//! problem instead of stopping at the first.
//!
//! ## Crate Policy
//!
//! - Depends only on `pixval-core` internally.
//! - Compile errors are values; nothing here panics on bad definitions.

pub mod check;
pub mod coerce;
pub mod compile;
pub mod error;
pub mod report;

pub use check::{DefinitionChecker, DefinitionIssue, IssueKind};
pub use coerce::{CoercionPlan, ScalarType};
pub use compile::{CompiledParams, CompiledPixel, CompiledSuffixes, FieldSpec, SchemaCompiler};
pub use error::CompileError;
pub use report::Violation;
