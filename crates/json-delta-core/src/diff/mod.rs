//! Structural diff engine.
//!
//! [`diff`] picks one strategy per level: a trivial replace for terminals
//! and mismatched kinds, sequence alignment for arrays in minimal mode, a
//! keyset walk for objects (and for arrays in fast mode when they share
//! enough elements), or a coarse single-level diff when they do not. In
//! minimal mode every level is also compared against a wholesale
//! replacement and the shorter encoding wins.

mod align;
mod keyset;

use std::fmt;

use crate::delta::sort_stanzas;
use crate::size::{list_size, path_size, stanzas_size, value_size};
use crate::{Delta, DeltaError, DiffOptions, KeyPath, Stanza, Value};

/// Computes the delta that turns `left` into `right`.
///
/// The result is sorted so it can be applied front to back.
///
/// ```
/// # use json_delta_core::{diff, DiffOptions, Value};
/// let left = Value::from_json_str("[16]")?;
/// let right = Value::from_json_str("[]")?;
/// let delta = diff(&left, &right, &DiffOptions::default())?;
/// assert_eq!(delta.to_json_string(), "[[[0]]]");
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn diff(left: &Value, right: &Value, options: &DiffOptions) -> Result<Delta, DeltaError> {
    let engine = Engine::new(options);
    let stanzas = engine.diff_at(left, right, &KeyPath::root(), 0)?;
    let delta = Delta::from_stanzas(sort_stanzas(stanzas));
    tracing::debug!(
        mode = %options.mode(),
        stanzas = delta.len(),
        delta_bytes = delta.byte_len(),
        original_bytes = value_size(right),
        "computed delta"
    );
    Ok(delta)
}

pub(crate) struct Engine {
    minimal: bool,
    max_depth: usize,
}

impl Engine {
    fn new(options: &DiffOptions) -> Self {
        Self { minimal: options.mode().is_minimal(), max_depth: options.max_depth() }
    }

    pub(crate) fn diff_at(
        &self,
        left: &Value,
        right: &Value,
        path: &KeyPath,
        depth: usize,
    ) -> Result<Vec<Stanza>, DeltaError> {
        if depth > self.max_depth {
            return Err(DeltaError::StackDepth { limit: self.max_depth });
        }

        let computed = match (left, right) {
            (Value::Array(lhs), Value::Array(rhs)) if self.minimal => {
                tracing::trace!(%path, strategy = "align", "diffing arrays");
                align::align_diff(self, lhs, rhs, path, depth)?
            }
            (Value::Array(_), Value::Array(_)) | (Value::Object(_), Value::Object(_)) => {
                if self.minimal {
                    tracing::trace!(%path, strategy = "keyset", "diffing objects");
                    keyset::keyset_diff(self, left, right, path, depth)?
                } else {
                    self.fast_diff(left, right, path, depth)?
                }
            }
            _ => trivial_diff(left, right, path),
        };

        if self.minimal {
            let replace_size = list_size(1, 2 + path_size(path) + 1 + value_size(right));
            if stanzas_size(&computed) > replace_size {
                tracing::trace!(%path, strategy = "replace", "replacement is shorter");
                return Ok(vec![Stanza::set(path.clone(), right.clone())]);
            }
        }
        Ok(computed)
    }

    fn fast_diff(
        &self,
        left: &Value,
        right: &Value,
        path: &KeyPath,
        depth: usize,
    ) -> Result<Vec<Stanza>, DeltaError> {
        let Some(common) = keyset::commonality(left, right) else {
            return Ok(trivial_diff(left, right, path));
        };
        if common < 0.5 {
            tracing::trace!(%path, common, strategy = "coarse", "low commonality");
            Ok(keyset::coarse_diff(left, right, path, common))
        } else {
            tracing::trace!(%path, common, strategy = "keyset", "high commonality");
            keyset::keyset_diff(self, left, right, path, depth)
        }
    }
}

/// Empty when the sides are equal, otherwise a single replacement at `path`.
fn trivial_diff(left: &Value, right: &Value, path: &KeyPath) -> Vec<Stanza> {
    if left == right {
        Vec::new()
    } else {
        vec![Stanza::set(path.clone(), right.clone())]
    }
}

/// How much smaller a delta is than the document it produces.
///
/// ```
/// # use json_delta_core::{diff, CompressionStats, DiffOptions, Value};
/// let left = Value::from_json_str("{\"a\":[1,2,3],\"b\":\"unchanged\"}")?;
/// let right = Value::from_json_str("{\"a\":[1,3],\"b\":\"unchanged\"}")?;
/// let delta = diff(&left, &right, &DiffOptions::default())?;
/// let stats = CompressionStats::measure(&right, &delta);
/// assert_eq!(stats.original_bytes(), 27);
/// assert_eq!(stats.delta_bytes(), 11);
/// assert_eq!(
///     stats.to_string(),
///     "Size of delta 40.741% size of original (original: 27 chars, delta: 11 chars)"
/// );
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CompressionStats {
    original_bytes: usize,
    delta_bytes: usize,
}

impl CompressionStats {
    /// Measures `delta` against the encoded size of `target`.
    #[must_use]
    pub fn measure(target: &Value, delta: &Delta) -> Self {
        Self { original_bytes: value_size(target), delta_bytes: delta.byte_len() }
    }

    /// Compact JSON size of the target document.
    #[must_use]
    pub fn original_bytes(self) -> usize {
        self.original_bytes
    }

    /// Compact JSON size of the delta.
    #[must_use]
    pub fn delta_bytes(self) -> usize {
        self.delta_bytes
    }

    /// Delta size as a percentage of the original.
    #[must_use]
    pub fn percent(self) -> f64 {
        if self.original_bytes == 0 {
            return 0.0;
        }
        self.delta_bytes as f64 / self.original_bytes as f64 * 100.0
    }
}

impl fmt::Display for CompressionStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Size of delta {:.3}% size of original (original: {} chars, delta: {} chars)",
            self.percent(),
            self.original_bytes,
            self.delta_bytes
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::tests::arb_value;
    use crate::DiffMode;
    use proptest::prelude::*;

    fn value(text: &str) -> Value {
        Value::from_json_str(text).unwrap()
    }

    fn minimal(left: &str, right: &str) -> String {
        diff(&value(left), &value(right), &DiffOptions::default()).unwrap().to_json_string()
    }

    fn fast(left: &str, right: &str) -> String {
        diff(&value(left), &value(right), &DiffOptions::fast()).unwrap().to_json_string()
    }

    #[test]
    fn member_change_is_a_single_set() {
        assert_eq!(minimal("{\"foo\":\"bar\"}", "{\"foo\":\"baz\"}"), "[[[\"foo\"],\"baz\"]]");
        assert_eq!(fast("{\"foo\":\"bar\"}", "{\"foo\":\"baz\"}"), "[[[\"foo\"],\"baz\"]]");
    }

    #[test]
    fn removing_the_only_element_deletes_it() {
        assert_eq!(minimal("[16]", "[]"), "[[[0]]]");
    }

    #[test]
    fn alignment_finds_the_middle_deletion() {
        assert_eq!(minimal("[1,2,3]", "[1,3]"), "[[[1]]]");
    }

    #[test]
    fn fast_mode_replaces_unrelated_arrays() {
        assert_eq!(fast("[1,2,3]", "[4,5,6]"), "[[[],[4,5,6]]]");
    }

    #[test]
    fn fast_mode_without_commonality_on_empty_side_replaces() {
        assert_eq!(fast("[16]", "[]"), "[[[],[]]]");
        assert_eq!(fast("{}", "{\"a\":1}"), "[[[],{\"a\":1}]]");
    }

    #[test]
    fn fast_mode_keyset_on_shared_members() {
        let left = "{\"a\":1,\"b\":2,\"c\":3}";
        let right = "{\"a\":1,\"b\":5,\"d\":4}";
        // overlap {a,b} of union {a,b,c,d} is exactly one half
        assert_eq!(fast(left, right), "[[[\"c\"]],[[\"d\"],4],[[\"b\"],5]]");
    }

    #[test]
    fn fast_mode_coarse_diff_does_not_recurse() {
        let left = "{\"a\":{\"x\":1,\"y\":2},\"b\":1,\"c\":1}";
        let right = "{\"a\":{\"x\":1,\"y\":3},\"d\":1,\"e\":1}";
        assert_eq!(
            fast(left, right),
            "[[[\"a\"],{\"x\":1,\"y\":3}],[[\"b\"]],[[\"c\"]],[[\"d\"],1],[[\"e\"],1]]"
        );
    }

    #[test]
    fn minimal_mode_prefers_replacement_when_shorter() {
        assert_eq!(minimal("{\"a\":1,\"b\":2}", "{\"c\":3}"), "[[[],{\"c\":3}]]");
    }

    #[test]
    fn appends_are_numbered_past_the_left_length() {
        assert_eq!(
            minimal("[\"alpha\",\"beta\"]", "[\"alpha\",\"beta\",\"gamma\",\"delta\"]"),
            "[[[2],\"gamma\"],[[3],\"delta\"]]"
        );
    }

    #[test]
    fn depth_limit_is_enforced() {
        let options = DiffOptions::default().with_max_depth(2).unwrap();
        let err = diff(&value("[[[[1]]]]"), &value("[[[[2]]]]"), &options).unwrap_err();
        assert_eq!(err, DeltaError::StackDepth { limit: 2 });
        let fast = options.with_mode(DiffMode::Fast).unwrap();
        assert!(diff(&value("[[1]]"), &value("[[2]]"), &fast).is_ok());
    }

    #[test]
    fn compression_stats_handle_tiny_targets() {
        let stats = CompressionStats::measure(&value("1"), &Delta::from_stanzas(Vec::new()));
        assert_eq!(stats.original_bytes(), 1);
        assert!((stats.percent() - 200.0).abs() < f64::EPSILON);
    }

    proptest! {
        #[test]
        fn identical_values_produce_empty_delta(value in arb_value()) {
            prop_assert!(diff(&value, &value, &DiffOptions::default()).unwrap().is_empty());
            prop_assert!(diff(&value, &value, &DiffOptions::fast()).unwrap().is_empty());
        }
    }
}
