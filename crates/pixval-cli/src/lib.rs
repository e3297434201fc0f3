//! # pixval-cli — Pixel Validation CLI
//!
//! Provides the `pixval` command-line interface over a pixel directory
//! (see [`files`] for the layout).
//!
//! ## Subcommands
//!
//! - `pixval preprocess <DIR>`: tokenize definitions into
//!   `tokenized_pixels.json`.
//! - `pixval validate-live <DIR> [CSV]`: validate exported live events
//!   and write `pixel_errors.json` and `undocumented_pixels.json`.
//! - `pixval validate-url <DIR> <URL>`: check a single pixel URL.
//! - `pixval check <DIR> [--file <FILE>]`: compile every definition and
//!   report the broken ones.
//!
//! ```bash
//! pixval preprocess ./pixel_definitions
//! pixval validate-live ./pixel_definitions ./live_pixels.csv
//! pixval validate-url ./pixel_definitions '/t/m_app_crash?appVersion=7.1.0'
//! ```
//!
//! Every handler returns the process exit code: 0 on success, 1 when the
//! input failed validation. Operational errors surface as `Err`.

pub mod check;
pub mod files;
pub mod live;
pub mod preprocess;
pub mod url;
