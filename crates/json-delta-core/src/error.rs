use thiserror::Error;

use crate::KeyPath;

/// Errors that can occur while canonicalizing external data into [`Value`](crate::Value).
#[derive(Debug, Error)]
pub enum CanonicalizeError {
    /// The provided JSON input was invalid.
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    /// Encountered a number that cannot be represented as an IEEE-754 f64.
    #[error("number {value} cannot be represented as f64")]
    NumberOutOfRange {
        /// The textual representation of the offending number.
        value: String,
    },
    /// Attempted to construct a [`Number`](crate::Number) that is not finite.
    #[error("non-finite number encountered: {value}")]
    NotFinite {
        /// The offending numeric value.
        value: f64,
    },
}

/// Faults raised by the diff engine, the patch applier and the udiff
/// renderer and parser.
///
/// Every fault is fatal for the operation that raised it.
///
/// ```
/// # use json_delta_core::{DeltaError, Delta, Value};
/// let struc = Value::from_json_str("{\"a\":1}")?;
/// let delta = Delta::from_json_str("[[[\"b\"]]]")?;
/// let err = struc.apply_patch(&delta).unwrap_err();
/// assert!(matches!(err, DeltaError::PathNotFound { .. }));
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DeltaError {
    /// A key disagreed with the kind of container it addressed, or a delta
    /// disagreed with the shape of the values it describes.
    #[error("type mismatch at {path}: expected {expected}, found {found}")]
    TypeMismatch {
        /// Location of the offending node.
        path: KeyPath,
        /// What the operation required at `path`.
        expected: &'static str,
        /// What was actually there.
        found: &'static str,
    },
    /// A stanza addressed a member or index that does not exist.
    #[error("path not found: {path}")]
    PathNotFound {
        /// The full keypath of the stanza being applied.
        path: KeyPath,
    },
    /// Udiff text violated the grammar, or a rendering could not be made
    /// consistent with the values and delta supplied.
    #[error("malformed udiff: {reason}")]
    MalformedUdiff {
        /// Human readable description, including the byte offset when parsing.
        reason: String,
    },
    /// Nesting exceeded the configured limit.
    #[error("nesting depth exceeds the limit of {limit}")]
    StackDepth {
        /// The configured limit.
        limit: usize,
    },
}

impl DeltaError {
    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedUdiff { reason: reason.into() }
    }

    pub(crate) fn malformed_at(offset: usize, reason: impl std::fmt::Display) -> Self {
        Self::MalformedUdiff { reason: format!("{reason} at byte {offset}") }
    }
}

/// Errors emitted when constructing [`DiffOptions`](crate::DiffOptions),
/// [`RenderConfig`](crate::RenderConfig) or [`ParseConfig`](crate::ParseConfig).
#[derive(Debug, Error, PartialEq, Eq)]
pub enum OptionsError {
    /// A nesting limit of zero would reject every container.
    #[error("maximum depth must be at least 1")]
    ZeroDepth,
    /// Indentation is capped to keep rendered lines bounded.
    #[error("indent {indent} exceeds the maximum of {max}")]
    IndentTooLarge {
        /// Requested indentation.
        indent: usize,
        /// Largest accepted indentation.
        max: usize,
    },
}

/// Errors from the text-level helpers such as [`load_and_diff`](crate::load_and_diff),
/// which decode their inputs before handing them to the engine.
#[derive(Debug, Error)]
pub enum LoadError {
    /// One of the inputs was not a valid document.
    #[error(transparent)]
    Canonicalize(#[from] CanonicalizeError),
    /// The engine rejected the decoded inputs.
    #[error(transparent)]
    Delta(#[from] DeltaError),
    /// A single-document input was not a two-element array.
    #[error("expected a JSON array of exactly two documents, found {found}")]
    NotAPair {
        /// Description of what was found instead.
        found: String,
    },
}
