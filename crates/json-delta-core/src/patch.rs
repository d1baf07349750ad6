//! Delta application.
//!
//! Stanzas are applied strictly in order. Each one walks its keypath from
//! the root, so earlier stanzas in the same delta change what later ones
//! address. There is no rollback: a failure leaves the in-place target
//! partially patched.

use crate::{Delta, DeltaError, Key, KeyPath, Stanza, Value};

/// Applies `delta` to a copy of `struc` and returns the patched copy.
///
/// ```
/// # use json_delta_core::{apply, Delta, Value};
/// let struc = Value::from_json_str("{\"foo\":\"bar\"}")?;
/// let delta = Delta::from_json_str("[[[\"foo\"],\"baz\"]]")?;
/// assert_eq!(apply(&struc, &delta)?.to_json_string(), "{\"foo\":\"baz\"}");
/// assert_eq!(struc.to_json_string(), "{\"foo\":\"bar\"}");
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn apply(struc: &Value, delta: &Delta) -> Result<Value, DeltaError> {
    let mut patched = struc.clone();
    apply_in_place(&mut patched, delta)?;
    Ok(patched)
}

/// Applies `delta` directly to `struc`.
///
/// On error, the stanzas preceding the failing one have already been
/// applied.
pub fn apply_in_place(struc: &mut Value, delta: &Delta) -> Result<(), DeltaError> {
    for stanza in delta {
        tracing::trace!(path = %stanza.path(), delete = stanza.is_delete(), "applying stanza");
        apply_stanza(struc, stanza)?;
    }
    tracing::debug!(stanzas = delta.len(), "applied delta");
    Ok(())
}

fn apply_stanza(root: &mut Value, stanza: &Stanza) -> Result<(), DeltaError> {
    let path = stanza.path();
    let Some((last, parents)) = path.keys().split_last() else {
        return match stanza.value() {
            Some(value) => {
                *root = value.clone();
                Ok(())
            }
            None => Err(DeltaError::TypeMismatch {
                path: KeyPath::root(),
                expected: "replacement value",
                found: "deletion",
            }),
        };
    };

    let mut node = root;
    for (depth, key) in parents.iter().enumerate() {
        node = step(node, key, path, depth)?;
    }

    let found = node.kind();
    match (node, last) {
        (Value::Array(items), Key::Index(index)) => {
            let index = *index;
            match stanza.value() {
                None if index < items.len() => {
                    items.remove(index);
                }
                Some(value) if stanza.is_insert() && index <= items.len() => {
                    items.insert(index, value.clone());
                }
                Some(value) if index == items.len() => items.push(value.clone()),
                Some(value) if index < items.len() => items[index] = value.clone(),
                _ => return Err(DeltaError::PathNotFound { path: path.clone() }),
            }
        }
        (Value::Object(map), Key::Member(name)) => match stanza.value() {
            None => {
                if map.remove(name).is_none() {
                    return Err(DeltaError::PathNotFound { path: path.clone() });
                }
            }
            Some(_) if stanza.is_insert() => {
                return Err(DeltaError::TypeMismatch {
                    path: KeyPath::from(parents),
                    expected: "array",
                    found: "object",
                });
            }
            Some(value) => {
                map.insert(name.clone(), value.clone());
            }
        },
        _ => {
            return Err(DeltaError::TypeMismatch {
                path: KeyPath::from(parents),
                expected: last.container_kind(),
                found,
            });
        }
    }
    Ok(())
}

/// Descends one key, requiring the child to exist.
fn step<'a>(
    node: &'a mut Value,
    key: &Key,
    path: &KeyPath,
    depth: usize,
) -> Result<&'a mut Value, DeltaError> {
    let found = node.kind();
    let missing = || DeltaError::PathNotFound { path: path.clone() };
    match (node, key) {
        (Value::Object(map), Key::Member(name)) => map.get_mut(name).ok_or_else(missing),
        (Value::Array(items), Key::Index(index)) => items.get_mut(*index).ok_or_else(missing),
        _ => Err(DeltaError::TypeMismatch {
            path: KeyPath::from(&path.keys()[..depth]),
            expected: key.container_kind(),
            found,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn value(text: &str) -> Value {
        Value::from_json_str(text).unwrap()
    }

    fn patch(struc: &str, delta: &str) -> Result<String, DeltaError> {
        apply(&value(struc), &Delta::from_json_str(delta).unwrap()).map(|v| v.to_json_string())
    }

    #[test]
    fn member_set_and_delete() {
        assert_eq!(patch("{\"a\":1}", "[[[\"b\"],2],[[\"a\"]]]").unwrap(), "{\"b\":2}");
    }

    #[test]
    fn root_replacement() {
        assert_eq!(patch("[1,2]", "[[[],{\"x\":null}]]").unwrap(), "{\"x\":null}");
    }

    #[test]
    fn root_deletion_is_a_type_mismatch() {
        let err = patch("[1,2]", "[[[]]]").unwrap_err();
        assert!(matches!(err, DeltaError::TypeMismatch { found: "deletion", .. }));
    }

    #[test]
    fn array_operations() {
        assert_eq!(patch("[1,2,3]", "[[[1]]]").unwrap(), "[1,3]");
        assert_eq!(patch("[1,3]", "[[[1],2,\"i\"]]").unwrap(), "[1,2,3]");
        assert_eq!(patch("[1,2]", "[[[2],3]]").unwrap(), "[1,2,3]");
        assert_eq!(patch("[1,2]", "[[[2],3,\"i\"]]").unwrap(), "[1,2,3]");
        assert_eq!(patch("[1,2]", "[[[0],9]]").unwrap(), "[9,2]");
    }

    #[test]
    fn array_bounds_are_checked() {
        assert!(matches!(patch("[1,2]", "[[[3],0]]"), Err(DeltaError::PathNotFound { .. })));
        assert!(matches!(patch("[1,2]", "[[[2]]]"), Err(DeltaError::PathNotFound { .. })));
        assert!(matches!(patch("[1,2]", "[[[3],0,\"i\"]]"), Err(DeltaError::PathNotFound { .. })));
    }

    #[test]
    fn missing_intermediate_member() {
        let err = patch("{\"a\":{}}", "[[[\"b\",\"c\"],1]]").unwrap_err();
        assert_eq!(
            err,
            DeltaError::PathNotFound { path: KeyPath::from(vec![Key::member("b"), Key::member("c")]) }
        );
    }

    #[test]
    fn kind_mismatches_name_the_container() {
        let err = patch("{\"a\":[1]}", "[[[\"a\",\"x\"],1]]").unwrap_err();
        assert_eq!(
            err,
            DeltaError::TypeMismatch {
                path: KeyPath::from(vec![Key::member("a")]),
                expected: "object",
                found: "array",
            }
        );
        let err = patch("{\"a\":3}", "[[[\"a\",0,1],1]]").unwrap_err();
        assert!(matches!(err, DeltaError::TypeMismatch { expected: "array", found: "number", .. }));
        let err = patch("{\"a\":1}", "[[[\"b\"],1,\"i\"]]").unwrap_err();
        assert!(matches!(err, DeltaError::TypeMismatch { expected: "array", found: "object", .. }));
    }

    #[test]
    fn stanzas_apply_in_sequence_without_rollback() {
        let mut struc = value("{\"a\":1}");
        let delta = Delta::from_json_str("[[[\"a\"],2],[[\"zz\"]]]").unwrap();
        assert!(apply_in_place(&mut struc, &delta).is_err());
        assert_eq!(struc.to_json_string(), "{\"a\":2}");
    }

    #[test]
    fn apply_leaves_the_input_untouched() {
        let struc = value("[1,{\"b\":[2]}]");
        let delta = Delta::from_json_str("[[[1,\"b\",0],3]]").unwrap();
        let patched = apply(&struc, &delta).unwrap();
        assert_eq!(patched.to_json_string(), "[1,{\"b\":[3]}]");
        assert_eq!(struc.to_json_string(), "[1,{\"b\":[2]}]");
    }
}
