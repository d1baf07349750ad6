//! Benchmark corpora for `json-delta-core`.
//!
//! Each corpus is generated deterministically so runs stay comparable
//! without checked-in fixture files.
//!
//! # Examples
//!
//! ```
//! use json_delta_benches::available_corpora;
//! use json_delta_core::DiffOptions;
//!
//! let corpus = &available_corpora()[0];
//! let dataset = corpus.load().expect("generated corpus decodes");
//! let delta = dataset.diff(&DiffOptions::default()).expect("diff succeeds");
//! assert!(!delta.is_empty());
//! ```
#![forbid(unsafe_code)]
#![warn(missing_docs)]

use json_delta_core::{
    diff, udiff, CanonicalizeError, Delta, DeltaError, DiffOptions, RenderConfig, Value,
};
use serde_json::{json, Value as JsonValue};

/// A named pair of documents to diff.
#[derive(Clone, Copy, Debug)]
pub struct Corpus {
    name: &'static str,
    generate: fn() -> (JsonValue, JsonValue),
}

impl Corpus {
    /// Short identifier used as the benchmark id.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Generates and decodes both documents.
    pub fn load(&self) -> Result<Dataset, CanonicalizeError> {
        let (before, after) = (self.generate)();
        let before_bytes = before.to_string().len();
        Ok(Dataset {
            before: Value::from_json_value(before)?,
            after: Value::from_json_value(after)?,
            before_bytes,
        })
    }
}

/// Decoded documents of a [`Corpus`].
#[derive(Clone, Debug)]
pub struct Dataset {
    before: Value,
    after: Value,
    before_bytes: usize,
}

impl Dataset {
    /// The left document.
    #[must_use]
    pub fn before(&self) -> &Value {
        &self.before
    }

    /// The right document.
    #[must_use]
    pub fn after(&self) -> &Value {
        &self.after
    }

    /// Encoded size of the left document, used for throughput.
    #[must_use]
    pub fn fixture_bytes(&self) -> usize {
        self.before_bytes
    }

    /// Diffs the left document against the right one.
    pub fn diff(&self, options: &DiffOptions) -> Result<Delta, DeltaError> {
        diff(&self.before, &self.after, options)
    }

    /// Renders the udiff of the two documents for `delta`.
    pub fn udiff(&self, delta: &Delta, config: &RenderConfig) -> Result<String, DeltaError> {
        Ok(udiff::render(&self.before, &self.after, Some(delta), config)?.join("\n"))
    }
}

/// Every registered corpus.
#[must_use]
pub fn available_corpora() -> &'static [Corpus] {
    const CORPORA: &[Corpus] = &[
        Corpus { name: "config-tweak", generate: config_tweak },
        Corpus { name: "array-shuffle", generate: array_shuffle },
        Corpus { name: "record-churn", generate: record_churn },
    ];
    CORPORA
}

/// A nested settings document with a handful of scattered edits.
fn config_tweak() -> (JsonValue, JsonValue) {
    let service = |index: usize, replicas: usize, tag: &str| {
        json!({
            "name": format!("service-{index}"),
            "image": format!("registry.local/service-{index}:{tag}"),
            "replicas": replicas,
            "ports": [8000 + index, 9000 + index],
            "env": { "LOG_LEVEL": "info", "REGION": "eu-west-1" },
        })
    };
    let before: Vec<_> = (0..40).map(|index| service(index, 2, "1.0.0")).collect();
    let after: Vec<_> = (0..40)
        .map(|index| match index % 7 {
            0 => service(index, 3, "1.0.0"),
            3 => service(index, 2, "1.1.0"),
            _ => service(index, 2, "1.0.0"),
        })
        .collect();
    (json!({ "version": 1, "services": before }), json!({ "version": 2, "services": after }))
}

/// A long array with interior deletions and insertions, which drives the
/// alignment search.
fn array_shuffle() -> (JsonValue, JsonValue) {
    let before: Vec<JsonValue> = (0..300).map(|n| json!(n)).collect();
    let after: Vec<JsonValue> = (0..300)
        .filter(|n| n % 11 != 0)
        .flat_map(|n| if n % 17 == 0 { vec![json!(n), json!(-n)] } else { vec![json!(n)] })
        .collect();
    (JsonValue::Array(before), JsonValue::Array(after))
}

/// Records keyed by id where most members change type or disappear.
fn record_churn() -> (JsonValue, JsonValue) {
    let mut before = serde_json::Map::new();
    let mut after = serde_json::Map::new();
    for id in 0..200 {
        before.insert(format!("id-{id}"), json!({ "score": id, "tags": ["a", "b"] }));
        match id % 4 {
            0 => {}
            1 => {
                after.insert(format!("id-{id}"), json!(format!("archived-{id}")));
            }
            _ => {
                after.insert(format!("id-{id}"), json!({ "score": id + 1, "tags": ["a"] }));
            }
        }
    }
    (JsonValue::Object(before), JsonValue::Object(after))
}
