//! # pixval-live — Live Pixel Validation
//!
//! Consumes the tokenized definitions of a run and validates live events
//! against them.
//!
//! - [`trie`]: [`CompiledTrie`], the prefix trie with compiled validators
//!   at its terminals, and the longest-prefix walk.
//! - [`params`]: reading exported params lists and decoding values
//!   (percent-encoding, base64).
//! - [`validator`]: [`LivePixelValidator`], the per-event pipeline.
//! - [`ledger`]: [`ErrorLedger`] and [`UndocumentedSet`], the results of a
//!   run.
//! - [`request`]: [`PixelRequest`], a single pixel URL.
//! - [`stats`]: [`RunStats`] counters.
//!
//! ## Concurrency
//!
//! A validator owns its results and is driven from one thread. To process
//! an event stream in parallel, create shards with
//! [`LivePixelValidator::shard`] (they share the compiled trie), then
//! combine the results with [`ErrorLedger::merge`], `Extend` on
//! [`UndocumentedSet`] and [`RunStats::merge`].
//!
//! ## Crate Policy
//!
//! - No I/O. Reading files and writing results belongs to the caller.
//! - Per-event problems never return `Err`; they are recorded.

pub mod error;
pub mod ledger;
pub mod params;
pub mod request;
pub mod stats;
pub mod trie;
pub mod validator;

pub use error::{LiveBuildError, ParamsReprError, RequestError, SinglePixelError};
pub use ledger::{ErrorLedger, UndocumentedSet};
pub use request::PixelRequest;
pub use stats::RunStats;
pub use trie::{CompiledTrie, PrefixMatch};
pub use validator::{EventOutcome, LivePixelValidator};
