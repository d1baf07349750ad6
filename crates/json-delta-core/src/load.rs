//! Text-level helpers that decode their inputs before running the engine.

use crate::{
    apply, diff, udiff, Delta, DiffOptions, LoadError, ParseConfig, RenderConfig, Value,
};

/// Two documents that arrived together as a single `[left, right]` array.
#[derive(Clone, Debug, PartialEq)]
pub struct Pair {
    /// First element of the array.
    pub left: Value,
    /// Second element of the array.
    pub right: Value,
}

impl Pair {
    /// Decodes a JSON array holding exactly two documents.
    ///
    /// ```
    /// # use json_delta_core::{Pair, LoadError};
    /// let pair = Pair::from_json_str("[{\"a\":1}, [2]]")?;
    /// assert_eq!(pair.right.to_json_string(), "[2]");
    /// assert!(matches!(Pair::from_json_str("[1]"), Err(LoadError::NotAPair { .. })));
    /// # Ok::<(), LoadError>(())
    /// ```
    pub fn from_json_str(input: &str) -> Result<Self, LoadError> {
        match Value::from_json_str(input)? {
            Value::Array(items) if items.len() == 2 => {
                let mut items = items.into_iter();
                match (items.next(), items.next()) {
                    (Some(left), Some(right)) => Ok(Self { left, right }),
                    _ => Err(LoadError::NotAPair { found: "a short array".to_owned() }),
                }
            }
            Value::Array(items) => {
                Err(LoadError::NotAPair { found: format!("an array of {} elements", items.len()) })
            }
            other => Err(LoadError::NotAPair { found: format!("a JSON {}", other.kind()) }),
        }
    }
}

/// Decodes two JSON texts and diffs them.
///
/// ```
/// # use json_delta_core::{load_and_diff, DiffOptions};
/// let delta = load_and_diff("{\"foo\":\"bar\"}", "{\"foo\":\"baz\"}", &DiffOptions::default())?;
/// assert_eq!(delta.to_json_string(), "[[[\"foo\"],\"baz\"]]");
/// # Ok::<(), json_delta_core::LoadError>(())
/// ```
pub fn load_and_diff(left: &str, right: &str, options: &DiffOptions) -> Result<Delta, LoadError> {
    let left = Value::from_json_str(left)?;
    let right = Value::from_json_str(right)?;
    Ok(diff(&left, &right, options)?)
}

/// Decodes a JSON document and a JSON delta, and applies the delta.
///
/// ```
/// # use json_delta_core::load_and_patch;
/// let patched = load_and_patch("[1,2,3]", "[[[1]]]")?;
/// assert_eq!(patched.to_json_string(), "[1,3]");
/// # Ok::<(), json_delta_core::LoadError>(())
/// ```
pub fn load_and_patch(struc: &str, delta: &str) -> Result<Value, LoadError> {
    let struc = Value::from_json_str(struc)?;
    let delta = Delta::from_json_str(delta)?;
    Ok(apply(&struc, &delta)?)
}

/// Decodes two JSON texts, and optionally a JSON delta between them, and
/// renders the udiff.
///
/// ```
/// # use json_delta_core::{load_and_udiff, RenderConfig};
/// let lines = load_and_udiff("[16]", "[]", Some("[[[0]]]"), &RenderConfig::default())?;
/// assert_eq!(lines, [" [", "- 16", " ]"]);
///
/// // Without a delta one is computed in fast mode, which replaces arrays
/// // that share nothing.
/// let lines = load_and_udiff("[16]", "[]", None, &RenderConfig::default())?;
/// assert_eq!(lines, ["-[16]", "+[]"]);
/// # Ok::<(), json_delta_core::LoadError>(())
/// ```
pub fn load_and_udiff(
    left: &str,
    right: &str,
    delta: Option<&str>,
    config: &RenderConfig,
) -> Result<Vec<String>, LoadError> {
    let left = Value::from_json_str(left)?;
    let right = Value::from_json_str(right)?;
    let delta = delta.map(Delta::from_json_str).transpose()?;
    Ok(udiff::render(&left, &right, delta.as_ref(), config)?)
}

/// Decodes a JSON document, parses udiff text into a delta and applies it.
///
/// ```
/// # use json_delta_core::{load_and_upatch, ParseConfig};
/// let text = " {\n  \"foo\":\n-  \"bar\"\n+  \"baz\"\n }";
/// let patched = load_and_upatch("{\"foo\":\"bar\"}", text, &ParseConfig::default())?;
/// assert_eq!(patched.to_json_string(), "{\"foo\":\"baz\"}");
/// # Ok::<(), json_delta_core::LoadError>(())
/// ```
pub fn load_and_upatch(struc: &str, text: &str, config: &ParseConfig) -> Result<Value, LoadError> {
    let struc = Value::from_json_str(struc)?;
    let delta = udiff::parse(text, config)?;
    Ok(apply(&struc, &delta)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DeltaError;

    #[test]
    fn pairs_need_exactly_two_documents() {
        for (input, found) in [
            ("[]", "an array of 0 elements"),
            ("[1,2,3]", "an array of 3 elements"),
            ("{\"a\":1}", "a JSON object"),
        ] {
            match Pair::from_json_str(input) {
                Err(LoadError::NotAPair { found: actual }) => assert_eq!(actual, found),
                other => panic!("{input} gave {other:?}"),
            }
        }
        assert!(matches!(Pair::from_json_str("[1,"), Err(LoadError::Canonicalize(_))));
    }

    #[test]
    fn reverse_upatch_restores_the_left_document() {
        let text = "--- a\n+++ b\n [\n  1,\n- 2,\n  3\n ]";
        let config = ParseConfig::default().with_reverse(true);
        assert_eq!(load_and_upatch("[1,3]", text, &config).unwrap().to_json_string(), "[1,2,3]");
    }

    #[test]
    fn engine_faults_pass_through() {
        let err = load_and_patch("{}", "[[[\"a\"]]]").unwrap_err();
        assert!(matches!(err, LoadError::Delta(DeltaError::PathNotFound { .. })));
        let err = load_and_udiff("[1]", "[2]", Some("[]"), &RenderConfig::default()).unwrap_err();
        assert!(matches!(err, LoadError::Delta(DeltaError::MalformedUdiff { .. })));
        assert!(matches!(load_and_diff("nope", "1", &DiffOptions::default()), Err(LoadError::Canonicalize(_))));
    }
}
