//! Human-readable udiffs.
//!
//! A udiff shows the two documents interleaved, one JSON fragment per
//! line. Each line starts with a sigil: a space for context shared by both
//! sides, `-` for content only on the left and `+` for content only on the
//! right. Untouched object members collapse to `...` and runs of untouched
//! array elements to `...(N)`.
//!
//! ```text
//! --- left.json
//! +++ right.json
//!  {
//!   "foo":
//! -  "bar"
//! +  "baz"
//!  }
//! ```
//!
//! [`render`] produces the lines from two values and a delta, and
//! [`parse`] recovers the delta from the text alone.

mod alignment;
mod parse;
mod render;
mod tracker;

use crate::{diff, Delta, DeltaError, DiffOptions, ParseConfig, RenderConfig, Value};

/// Renders the udiff of `left` against `right` as lines without trailing
/// newlines.
///
/// When `delta` is `None` it is computed in fast mode first. A delta that
/// does not describe the change from `left` to `right` is rejected with
/// [`DeltaError::MalformedUdiff`] or [`DeltaError::TypeMismatch`].
///
/// ```
/// # use json_delta_core::{diff, udiff, DiffOptions, RenderConfig, Value};
/// let left = Value::from_json_str("[1,2,3]")?;
/// let right = Value::from_json_str("[1,3]")?;
/// let delta = diff(&left, &right, &DiffOptions::default())?;
/// let lines = udiff::render(&left, &right, Some(&delta), &RenderConfig::default())?;
/// assert_eq!(lines, [" [", "  1,", "- 2,", "  3", " ]"]);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn render(
    left: &Value,
    right: &Value,
    delta: Option<&Delta>,
    config: &RenderConfig,
) -> Result<Vec<String>, DeltaError> {
    match delta {
        Some(delta) => render::render_udiff(left, right, delta, config),
        None => {
            let options = DiffOptions::fast_with_depth(config.max_depth());
            let delta = diff(left, right, &options)?;
            render::render_udiff(left, right, &delta, config)
        }
    }
}

/// Recovers a delta from udiff text.
///
/// Optional `---` and `+++` header lines are skipped. With
/// [`ParseConfig::with_reverse`] the roles of `-` and `+` swap and the
/// result patches the right document back into the left one.
///
/// ```
/// # use json_delta_core::{udiff, ParseConfig};
/// let text = " {\n  \"foo\":\n-  \"bar\"\n+  \"baz\"\n }";
/// let delta = udiff::parse(text, &ParseConfig::default())?;
/// assert_eq!(delta.to_json_string(), "[[[\"foo\"],\"baz\"]]");
///
/// let back = udiff::parse(text, &ParseConfig::default().with_reverse(true))?;
/// assert_eq!(back.to_json_string(), "[[[\"foo\"],\"bar\"]]");
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn parse(text: &str, config: &ParseConfig) -> Result<Delta, DeltaError> {
    parse::parse_udiff(text, config)
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::apply;
    use crate::value::tests::arb_value;

    #[test]
    fn missing_delta_is_computed() {
        let left = Value::from_json_str("{\"a\":[1,2],\"b\":true}").unwrap();
        let right = Value::from_json_str("{\"a\":[1,2],\"b\":false}").unwrap();
        let lines = render(&left, &right, None, &RenderConfig::default()).unwrap();
        assert_eq!(lines, [" {", "  \"a\": [...(2)],", "  \"b\":", "-  true", "+  false", " }"]);
    }

    #[test]
    fn computed_delta_uses_the_render_depth_limit() {
        let left = Value::from_json_str("{\"a\":{\"b\":{\"c\":1}}}").unwrap();
        let right = Value::from_json_str("{\"a\":{\"b\":{\"c\":2}}}").unwrap();
        let config = RenderConfig::default().with_max_depth(1).unwrap();
        let err = render(&left, &right, None, &config).unwrap_err();
        assert_eq!(err, DeltaError::StackDepth { limit: 1 });
    }

    proptest! {
        #[test]
        fn rendered_udiffs_parse_back_in_both_directions(left in arb_value(), right in arb_value()) {
            let delta = diff(&left, &right, &DiffOptions::default()).unwrap();
            let text = render(&left, &right, Some(&delta), &RenderConfig::default()).unwrap().join("\n");

            let forward = parse(&text, &ParseConfig::default()).unwrap();
            prop_assert_eq!(apply(&left, &forward).unwrap(), right.clone());

            let backward = parse(&text, &ParseConfig::default().with_reverse(true)).unwrap();
            prop_assert_eq!(apply(&right, &backward).unwrap(), left);
        }
    }
}
