//! Fuzzing harnesses for `json-delta-core`.
//!
//! Each public function accepts raw bytes so it can back a `cargo fuzz`
//! target as well as ordinary smoke tests. Decoding failures and faults on
//! arbitrary input are expected and swallowed; a broken round trip on
//! generated input panics.
//!
//! # Examples
//!
//! Run the canonicalization harness on a JSON snippet:
//!
//! ```
//! json_delta_fuzz::fuzz_canonicalization(b"{\"a\":1}");
//! ```
//!
//! Invoke the diff harness on deterministic input:
//!
//! ```
//! json_delta_fuzz::fuzz_diff(&[1, 2, 3, 4]);
//! ```
//!
//! Exercise the patch and udiff harnesses with arbitrary bytes:
//!
//! ```
//! json_delta_fuzz::fuzz_patch(b"example");
//! json_delta_fuzz::fuzz_upatch(b" [\n- 1\n ]");
//! ```
#![forbid(unsafe_code)]
#![warn(missing_docs)]

use arbitrary::Unstructured;
use json_delta_core::{apply, diff, udiff, Delta, DiffOptions, ParseConfig, RenderConfig, Value};
use serde_json::{self, Map as JsonMap, Number as JsonNumber, Value as JsonValue};

const MAX_DEPTH: usize = 4;
const MAX_ARRAY_LEN: u8 = 6;
const MAX_OBJECT_LEN: u8 = 6;
const MAX_STRING_LEN: u8 = 12;

/// Feeds arbitrary bytes through the value and delta decoders.
///
/// ```
/// json_delta_fuzz::fuzz_canonicalization(b"[[[\"key\"],\"value\"]]");
/// ```
pub fn fuzz_canonicalization(data: &[u8]) {
    if let Ok(text) = std::str::from_utf8(data) {
        if let Ok(value) = Value::from_json_str(text) {
            let encoded = value.to_json_string();
            assert_eq!(Value::from_json_str(&encoded).ok(), Some(value), "re-encoding changed {text:?}");
        }
        if let Ok(delta) = Delta::from_json_str(text) {
            let encoded = delta.to_json_string();
            assert_eq!(Delta::from_json_str(&encoded).ok(), Some(delta), "re-encoding changed {text:?}");
        }
    }
}

/// Diffs two generated values in both modes and checks that each delta
/// reproduces the right value.
///
/// ```
/// json_delta_fuzz::fuzz_diff(b"seed");
/// ```
pub fn fuzz_diff(data: &[u8]) {
    let mut unstructured = Unstructured::new(data);
    let (Some(lhs), Some(rhs)) = (random_value(&mut unstructured), random_value(&mut unstructured))
    else {
        return;
    };
    for options in [DiffOptions::default(), DiffOptions::fast()] {
        let Ok(delta) = diff(&lhs, &rhs, &options) else { continue };
        assert_eq!(apply(&lhs, &delta).ok().as_ref(), Some(&rhs), "delta {delta} for mode {}", options.mode());
    }
}

/// Applies a delta decoded from the raw bytes to a generated value to
/// exercise the applier's fault paths.
///
/// ```
/// json_delta_fuzz::fuzz_patch(b"patch fuzz");
/// ```
pub fn fuzz_patch(data: &[u8]) {
    let Ok(delta) = serde_json::from_slice::<Delta>(data) else {
        return;
    };
    let mut unstructured = Unstructured::new(data);
    if let Some(seed) = random_value(&mut unstructured) {
        let _ = apply(&seed, &delta);
    }
}

/// Parses the raw bytes as udiff text in both directions, then renders and
/// re-parses the udiff of two generated values.
///
/// ```
/// json_delta_fuzz::fuzz_upatch(b"udiff fuzz");
/// ```
pub fn fuzz_upatch(data: &[u8]) {
    if let Ok(text) = std::str::from_utf8(data) {
        for reverse in [false, true] {
            let _ = udiff::parse(text, &ParseConfig::default().with_reverse(reverse));
        }
    }

    let mut unstructured = Unstructured::new(data);
    let (Some(lhs), Some(rhs)) = (random_value(&mut unstructured), random_value(&mut unstructured))
    else {
        return;
    };
    let Ok(lines) = udiff::render(&lhs, &rhs, None, &RenderConfig::default()) else {
        return;
    };
    let text = lines.join("\n");
    if let Ok(delta) = udiff::parse(&text, &ParseConfig::default()) {
        assert_eq!(apply(&lhs, &delta).ok().as_ref(), Some(&rhs), "udiff:\n{text}");
    }
}

fn random_value(unstructured: &mut Unstructured<'_>) -> Option<Value> {
    let value = json_value_from_unstructured(unstructured, 0).ok()?;
    Value::from_json_value(value).ok()
}

fn json_value_from_unstructured(
    unstructured: &mut Unstructured<'_>,
    depth: usize,
) -> Result<JsonValue, arbitrary::Error> {
    if depth >= MAX_DEPTH {
        return json_leaf(unstructured);
    }

    match unstructured.int_in_range::<u8>(0..=5)? {
        0..=3 => json_leaf(unstructured),
        4 => {
            let len = usize::from(unstructured.int_in_range::<u8>(0..=MAX_ARRAY_LEN)?);
            let mut items = Vec::with_capacity(len);
            for _ in 0..len {
                items.push(json_value_from_unstructured(unstructured, depth + 1)?);
            }
            Ok(JsonValue::Array(items))
        }
        _ => {
            let len = usize::from(unstructured.int_in_range::<u8>(0..=MAX_OBJECT_LEN)?);
            let mut map = JsonMap::new();
            for _ in 0..len {
                let key = random_string(unstructured)?;
                let value = json_value_from_unstructured(unstructured, depth + 1)?;
                map.insert(key, value);
            }
            Ok(JsonValue::Object(map))
        }
    }
}

fn json_leaf(unstructured: &mut Unstructured<'_>) -> Result<JsonValue, arbitrary::Error> {
    match unstructured.int_in_range::<u8>(0..=3)? {
        0 => Ok(JsonValue::Null),
        1 => Ok(JsonValue::Bool(unstructured.arbitrary()?)),
        2 => Ok(JsonValue::Number(random_number(unstructured)?)),
        _ => Ok(JsonValue::String(random_string(unstructured)?)),
    }
}

fn random_number(unstructured: &mut Unstructured<'_>) -> Result<JsonNumber, arbitrary::Error> {
    if unstructured.arbitrary()? {
        let int = unstructured.arbitrary::<i32>()?;
        Ok(JsonNumber::from(int))
    } else {
        let numerator = f64::from(unstructured.arbitrary::<i32>()?);
        let denominator = f64::from(unstructured.int_in_range::<u16>(1..=1024)?);
        JsonNumber::from_f64(numerator / denominator).ok_or(arbitrary::Error::IncorrectFormat)
    }
}

fn random_string(unstructured: &mut Unstructured<'_>) -> Result<String, arbitrary::Error> {
    let len = usize::from(unstructured.int_in_range::<u8>(0..=MAX_STRING_LEN)?);
    let mut string = String::with_capacity(len);
    for _ in 0..len {
        let byte = unstructured.int_in_range::<u8>(0x20..=0x7e)?;
        string.push(char::from(byte));
    }
    Ok(string)
}
