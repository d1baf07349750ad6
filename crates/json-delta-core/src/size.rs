//! Exact compact-JSON byte sizes, computed without building the encoding.
//!
//! Every function here mirrors what `serde_json::to_string` would emit for
//! the same input.

use std::fmt::{self, Write as _};

use crate::{Key, KeyPath, Number, Stanza, Value};

/// Byte size of the compact JSON encoding of `value`.
///
/// ```
/// # use json_delta_core::{size::value_size, Value};
/// let value = Value::from_json_str("{\"a\": [1, \"é\", null]}")?;
/// assert_eq!(value_size(&value), value.to_json_string().len());
/// # Ok::<(), json_delta_core::CanonicalizeError>(())
/// ```
#[must_use]
pub fn value_size(value: &Value) -> usize {
    match value {
        Value::Null => 4,
        Value::Bool(true) => 4,
        Value::Bool(false) => 5,
        Value::Number(n) => number_size(*n),
        Value::String(s) => string_size(s),
        Value::Array(values) => list_size(values.len(), values.iter().map(value_size).sum()),
        Value::Object(map) => list_size(
            map.len(),
            map.iter().map(|(key, value)| string_size(key) + 1 + value_size(value)).sum(),
        ),
    }
}

/// Byte size of a JSON-encoded string, quotes and escapes included.
#[must_use]
pub fn string_size(s: &str) -> usize {
    let mut size = 2;
    for byte in s.bytes() {
        size += match byte {
            b'"' | b'\\' | 0x08 | 0x0C | b'\n' | b'\r' | b'\t' => 2,
            0x00..=0x1F => 6,
            _ => 1,
        };
    }
    size
}

/// Byte size of a keypath encoded as a JSON array.
#[must_use]
pub fn path_size(path: &KeyPath) -> usize {
    list_size(path.len(), path.iter().map(key_size).sum())
}

/// Byte size of a single stanza in its wire form.
#[must_use]
pub fn stanza_size(stanza: &Stanza) -> usize {
    let mut size = 2 + path_size(stanza.path());
    if let Some(value) = stanza.value() {
        size += 1 + value_size(value);
    }
    if stanza.is_insert() {
        size += 4;
    }
    size
}

/// Byte size of a list of stanzas encoded as a JSON array.
#[must_use]
pub fn stanzas_size(stanzas: &[Stanza]) -> usize {
    list_size(stanzas.len(), stanzas.iter().map(stanza_size).sum())
}

/// Size of a JSON array holding `count` elements whose encodings add up to
/// `content` bytes.
#[must_use]
pub fn list_size(count: usize, content: usize) -> usize {
    2 + content + count.saturating_sub(1)
}

fn key_size(key: &Key) -> usize {
    match key {
        Key::Index(index) => decimal_digits(*index),
        Key::Member(name) => string_size(name),
    }
}

fn decimal_digits(mut n: usize) -> usize {
    let mut digits = 1;
    while n >= 10 {
        n /= 10;
        digits += 1;
    }
    digits
}

fn number_size(number: Number) -> usize {
    let mut counter = ByteCounter(0);
    // ByteCounter::write_str never fails.
    let _ = write!(counter, "{number}");
    counter.0
}

struct ByteCounter(usize);

impl fmt::Write for ByteCounter {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.0 += s.len();
        Ok(())
    }
}
