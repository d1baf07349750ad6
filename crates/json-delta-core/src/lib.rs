//! Structural deltas between JSON documents.
//!
//! `json-delta-core` computes compact deltas between two values, applies
//! them, and converts them to and from a line-oriented "udiff" text that
//! people can review and that parses back into an equivalent delta.
//!
//! ```
//! use json_delta_core::{udiff, DiffOptions, ParseConfig, RenderConfig, Value};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let base = Value::from_json_str("{\"name\":\"delta\",\"version\":1}")?;
//!     let target = Value::from_json_str("{\"name\":\"delta\",\"version\":2}")?;
//!     let delta = base.diff(&target, &DiffOptions::default())?;
//!     assert_eq!(delta.to_json_string(), "[[[\"version\"],2]]");
//!
//!     let lines = base.udiff(&target, &RenderConfig::default())?;
//!     assert!(lines.contains(&"+  2".to_owned()));
//!
//!     let parsed = udiff::parse(&lines.join("\n"), &ParseConfig::default())?;
//!     assert_eq!(base.apply_patch(&parsed)?, target);
//!     Ok(())
//! }
//! ```
#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod delta;
mod diff;
mod error;
mod load;
mod number;
mod options;
mod patch;
pub mod size;
pub mod udiff;
mod value;

pub use delta::{Delta, Key, KeyPath, Stanza};
pub use diff::{diff, CompressionStats};
pub use error::{CanonicalizeError, DeltaError, LoadError, OptionsError};
pub use load::{load_and_diff, load_and_patch, load_and_udiff, load_and_upatch, Pair};
pub use number::Number;
pub use options::{DiffMode, DiffOptions, ParseConfig, RenderConfig, DEFAULT_MAX_DEPTH, MAX_INDENT};
pub use patch::{apply, apply_in_place};
pub use value::Value;

/// Returns the semantic version of the `json-delta-core` crate.
///
/// ```
/// assert!(!json_delta_core::version().is_empty());
/// ```
#[must_use]
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
