use std::collections::BTreeMap;

use super::Engine;
use crate::{DeltaError, Key, KeyPath, Stanza, Value};

/// Keys of two same-kind containers, split by which side holds them.
/// Every group is ascending.
struct Keysets<'a> {
    left_only: Vec<Key>,
    right_only: Vec<Key>,
    overlap: Vec<Key>,
    left: &'a Value,
    right: &'a Value,
}

impl<'a> Keysets<'a> {
    fn split(left: &'a Value, right: &'a Value) -> Option<Self> {
        let (left_only, right_only, overlap) = match (left, right) {
            (Value::Object(lhs), Value::Object(rhs)) => split_members(lhs, rhs),
            (Value::Array(lhs), Value::Array(rhs)) => {
                let shared = lhs.len().min(rhs.len());
                (
                    (shared..lhs.len()).map(Key::Index).collect(),
                    (shared..rhs.len()).map(Key::Index).collect(),
                    (0..shared).map(Key::Index).collect(),
                )
            }
            _ => return None,
        };
        Some(Self { left_only, right_only, overlap, left, right })
    }

    fn left_child(&self, key: &Key) -> Option<&'a Value> {
        child(self.left, key)
    }

    fn right_child(&self, key: &Key) -> Option<&'a Value> {
        child(self.right, key)
    }
}

fn split_members(
    lhs: &BTreeMap<String, Value>,
    rhs: &BTreeMap<String, Value>,
) -> (Vec<Key>, Vec<Key>, Vec<Key>) {
    let mut left_only = Vec::new();
    let mut overlap = Vec::new();
    for name in lhs.keys() {
        if rhs.contains_key(name) {
            overlap.push(Key::member(name.as_str()));
        } else {
            left_only.push(Key::member(name.as_str()));
        }
    }
    let right_only =
        rhs.keys().filter(|name| !lhs.contains_key(*name)).map(|name| Key::member(name.as_str())).collect();
    (left_only, right_only, overlap)
}

fn child<'a>(container: &'a Value, key: &Key) -> Option<&'a Value> {
    match (container, key) {
        (Value::Object(map), Key::Member(name)) => map.get(name),
        (Value::Array(values), Key::Index(index)) => values.get(*index),
        _ => None,
    }
}

/// Share of structure two same-kind containers have in common, in `[0, 1]`.
///
/// Objects compare member names: overlap over union. Arrays count the left
/// elements that occur anywhere in the right array, over the longer length.
/// Returns `None` when both containers are empty or the kinds differ.
pub(super) fn commonality(left: &Value, right: &Value) -> Option<f64> {
    match (left, right) {
        (Value::Object(lhs), Value::Object(rhs)) => {
            if lhs.is_empty() && rhs.is_empty() {
                return None;
            }
            let overlap = lhs.keys().filter(|name| rhs.contains_key(*name)).count();
            let union = lhs.len() + rhs.len() - overlap;
            Some(overlap as f64 / union as f64)
        }
        (Value::Array(lhs), Value::Array(rhs)) => {
            if lhs.is_empty() && rhs.is_empty() {
                return None;
            }
            if lhs.is_empty() || rhs.is_empty() {
                return Some(0.0);
            }
            let found = lhs.iter().filter(|item| rhs.contains(item)).count();
            Some(found as f64 / lhs.len().max(rhs.len()) as f64)
        }
        _ => None,
    }
}

/// Deletes left-only keys, adds right-only keys and recurses into shared
/// keys.
pub(super) fn keyset_diff(
    engine: &Engine,
    left: &Value,
    right: &Value,
    path: &KeyPath,
    depth: usize,
) -> Result<Vec<Stanza>, DeltaError> {
    let Some(keys) = Keysets::split(left, right) else {
        return Ok(super::trivial_diff(left, right, path));
    };

    let mut stanzas: Vec<Stanza> =
        keys.left_only.iter().map(|key| Stanza::delete(path.child(key.clone()))).collect();
    for key in &keys.right_only {
        if let Some(value) = keys.right_child(key) {
            stanzas.push(Stanza::set(path.child(key.clone()), value.clone()));
        }
    }
    for key in &keys.overlap {
        if let (Some(lhs), Some(rhs)) = (keys.left_child(key), keys.right_child(key)) {
            stanzas.extend(engine.diff_at(lhs, rhs, &path.child(key.clone()), depth + 1)?);
        }
    }
    Ok(stanzas)
}

/// Single-level diff for containers with little in common: shared keys
/// with different values are overwritten wholesale instead of recursed
/// into. Without any commonality the whole node is replaced.
pub(super) fn coarse_diff(left: &Value, right: &Value, path: &KeyPath, common: f64) -> Vec<Stanza> {
    let keys = match Keysets::split(left, right) {
        Some(keys) if common > 0.0 => keys,
        _ => return super::trivial_diff(left, right, path),
    };

    let mut stanzas = Vec::new();
    for key in &keys.overlap {
        if let (Some(lhs), Some(rhs)) = (keys.left_child(key), keys.right_child(key)) {
            if lhs != rhs {
                stanzas.push(Stanza::set(path.child(key.clone()), rhs.clone()));
            }
        }
    }
    stanzas.extend(keys.left_only.iter().map(|key| Stanza::delete(path.child(key.clone()))));
    for key in &keys.right_only {
        if let Some(value) = keys.right_child(key) {
            stanzas.push(Stanza::set(path.child(key.clone()), value.clone()));
        }
    }
    stanzas
}
