//! Delta data structures: keypaths, stanzas and ordered stanza lists.
//!
//! A [`Delta`] is what the diff engine produces, what the udiff parser
//! reconstructs and what the patch applier consumes. Its wire form is a
//! JSON array of stanzas, each one of `[path]`, `[path, value]` or
//! `[path, value, "i"]`.

mod path;

pub use path::{Key, KeyPath};

use std::fmt;

use serde::de::{IgnoredAny, SeqAccess};
use serde::ser::SerializeSeq;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::{size, CanonicalizeError, Value};

const INSERT_MARKER: &str = "i";

/// One edit within a [`Delta`].
///
/// A stanza without a value deletes the node at its path. A stanza with a
/// value overwrites, creates or appends; with the insert flag it inserts
/// into an array, shifting later elements up by one.
///
/// ```
/// # use json_delta_core::{Key, KeyPath, Stanza, Value};
/// let stanza = Stanza::insert(KeyPath::from(vec![Key::Index(0)]), Value::Null);
/// assert_eq!(serde_json::to_string(&stanza)?, "[[0],null,\"i\"]");
/// # Ok::<(), serde_json::Error>(())
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct Stanza {
    path: KeyPath,
    value: Option<Value>,
    force_insert: bool,
}

impl Stanza {
    /// Creates a stanza that overwrites, creates or appends `value` at `path`.
    #[must_use]
    pub fn set(path: KeyPath, value: Value) -> Self {
        Self { path, value: Some(value), force_insert: false }
    }

    /// Creates a stanza that deletes the node at `path`.
    #[must_use]
    pub fn delete(path: KeyPath) -> Self {
        Self { path, value: None, force_insert: false }
    }

    /// Creates a stanza that inserts `value` into an array at `path`.
    #[must_use]
    pub fn insert(path: KeyPath, value: Value) -> Self {
        Self { path, value: Some(value), force_insert: true }
    }

    /// Returns the keypath this stanza addresses.
    #[must_use]
    pub fn path(&self) -> &KeyPath {
        &self.path
    }

    /// Returns the value carried by the stanza, or `None` for deletions.
    #[must_use]
    pub fn value(&self) -> Option<&Value> {
        self.value.as_ref()
    }

    /// Indicates whether this stanza deletes.
    #[must_use]
    pub fn is_delete(&self) -> bool {
        self.value.is_none()
    }

    /// Indicates whether this stanza inserts, shifting later array elements.
    #[must_use]
    pub fn is_insert(&self) -> bool {
        self.force_insert
    }

    /// Consumes the stanza, returning its path and value.
    #[must_use]
    pub fn into_parts(self) -> (KeyPath, Option<Value>) {
        (self.path, self.value)
    }

    pub(crate) fn mark_insert(&mut self) {
        if self.value.is_some() {
            self.force_insert = true;
        }
    }

    fn removes_array_element(&self) -> bool {
        self.value.is_none() && matches!(self.path.last(), Some(Key::Index(_)))
    }

    fn crosses_array(&self) -> bool {
        self.path.iter().any(|key| matches!(key, Key::Index(_)))
    }
}

impl fmt::Display for Stanza {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let json = serde_json::to_string(self).map_err(|_| fmt::Error)?;
        f.write_str(&json)
    }
}

impl Serialize for Stanza {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let len = 1 + usize::from(self.value.is_some()) + usize::from(self.force_insert);
        let mut seq = serializer.serialize_seq(Some(len))?;
        seq.serialize_element(&self.path)?;
        if let Some(value) = &self.value {
            seq.serialize_element(value)?;
            if self.force_insert {
                seq.serialize_element(INSERT_MARKER)?;
            }
        }
        seq.end()
    }
}

impl<'de> Deserialize<'de> for Stanza {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct Visitor;

        impl<'de> serde::de::Visitor<'de> for Visitor {
            type Value = Stanza;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a stanza of the form [path], [path, value] or [path, value, \"i\"]")
            }

            fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
            where
                A: SeqAccess<'de>,
            {
                use serde::de::Error;

                let path: KeyPath = seq
                    .next_element()?
                    .ok_or_else(|| A::Error::custom("stanza must contain a keypath"))?;
                let Some(value) = seq.next_element::<Value>()? else {
                    return Ok(Stanza::delete(path));
                };
                let force_insert = match seq.next_element::<String>()? {
                    None => false,
                    Some(marker) if marker == INSERT_MARKER => true,
                    Some(marker) => {
                        return Err(A::Error::custom(format!(
                            "unknown stanza marker {marker:?}, expected \"i\""
                        )));
                    }
                };
                if seq.next_element::<IgnoredAny>()?.is_some() {
                    return Err(A::Error::custom("stanza has more than three elements"));
                }
                Ok(Stanza { path, value: Some(value), force_insert })
            }
        }

        deserializer.deserialize_seq(Visitor)
    }
}

/// Ordered list of stanzas that turns one value into another.
///
/// ```
/// # use json_delta_core::{Delta, DiffOptions, Value};
/// let left = Value::from_json_str("{\"foo\":\"bar\"}")?;
/// let right = Value::from_json_str("{\"foo\":\"baz\"}")?;
/// let delta = left.diff(&right, &DiffOptions::default())?;
/// assert_eq!(delta.to_json_string(), "[[[\"foo\"],\"baz\"]]");
/// assert_eq!(Delta::from_json_str(&delta.to_json_string())?, delta);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Delta {
    stanzas: Vec<Stanza>,
}

impl Delta {
    /// Constructs an empty delta.
    #[must_use]
    pub fn empty() -> Self {
        Self { stanzas: Vec::new() }
    }

    /// Builds a delta from stanzas, keeping their order as given.
    #[must_use]
    pub fn from_stanzas(stanzas: Vec<Stanza>) -> Self {
        Self { stanzas }
    }

    /// Decodes a delta from its JSON wire form.
    pub fn from_json_str(input: &str) -> Result<Self, CanonicalizeError> {
        Ok(serde_json::from_str(input)?)
    }

    /// Encodes the delta in its compact JSON wire form.
    #[must_use]
    pub fn to_json_string(&self) -> String {
        self.to_string()
    }

    /// Size in bytes of [`Delta::to_json_string`], computed without encoding.
    ///
    /// ```
    /// # use json_delta_core::Delta;
    /// let delta = Delta::from_json_str("[[[0]], [[\"a\"], true]]")?;
    /// assert_eq!(delta.byte_len(), delta.to_json_string().len());
    /// # Ok::<(), json_delta_core::CanonicalizeError>(())
    /// ```
    #[must_use]
    pub fn byte_len(&self) -> usize {
        size::stanzas_size(&self.stanzas)
    }

    /// Returns the number of stanzas.
    #[must_use]
    pub fn len(&self) -> usize {
        self.stanzas.len()
    }

    /// Indicates whether the delta is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stanzas.is_empty()
    }

    /// Returns an iterator over the stanzas.
    pub fn iter(&self) -> std::slice::Iter<'_, Stanza> {
        self.stanzas.iter()
    }

    /// Returns the stanzas as a slice.
    #[must_use]
    pub fn stanzas(&self) -> &[Stanza] {
        &self.stanzas
    }

    /// Consumes the delta and returns the stanzas.
    #[must_use]
    pub fn into_stanzas(self) -> Vec<Stanza> {
        self.stanzas
    }

    /// Reorders the stanzas so that applying them front to back never uses a
    /// stale array index.
    ///
    /// Stanzas on paths made only of object members come first, in their
    /// current order. Array deletions come last, descending by keypath.
    /// Everything else sits in between, ascending by keypath.
    ///
    /// ```
    /// # use json_delta_core::Delta;
    /// let delta = Delta::from_json_str("[[[0]], [[2]], [[1], \"x\", \"i\"], [[\"k\"], 1]]")?;
    /// assert_eq!(delta.sorted().to_json_string(), "[[[\"k\"],1],[[1],\"x\",\"i\"],[[2]],[[0]]]");
    /// # Ok::<(), json_delta_core::CanonicalizeError>(())
    /// ```
    #[must_use]
    pub fn sorted(self) -> Self {
        Self { stanzas: sort_stanzas(self.stanzas) }
    }
}

impl fmt::Display for Delta {
    /// Writes the compact JSON wire form.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let json = serde_json::to_string(self).map_err(|_| fmt::Error)?;
        f.write_str(&json)
    }
}

impl From<Vec<Stanza>> for Delta {
    fn from(stanzas: Vec<Stanza>) -> Self {
        Self::from_stanzas(stanzas)
    }
}

impl<'a> IntoIterator for &'a Delta {
    type Item = &'a Stanza;
    type IntoIter = std::slice::Iter<'a, Stanza>;

    fn into_iter(self) -> Self::IntoIter {
        self.stanzas.iter()
    }
}

impl IntoIterator for Delta {
    type Item = Stanza;
    type IntoIter = std::vec::IntoIter<Stanza>;

    fn into_iter(self) -> Self::IntoIter {
        self.stanzas.into_iter()
    }
}

pub(crate) fn sort_stanzas(stanzas: Vec<Stanza>) -> Vec<Stanza> {
    if stanzas.len() <= 1 {
        return stanzas;
    }
    let mut objects = Vec::new();
    let mut changes = Vec::new();
    let mut deletions = Vec::new();
    for stanza in stanzas {
        if stanza.removes_array_element() {
            deletions.push(stanza);
        } else if stanza.crosses_array() {
            changes.push(stanza);
        } else {
            objects.push(stanza);
        }
    }
    changes.sort_by(|a, b| a.path.cmp(&b.path));
    deletions.sort_by(|a, b| b.path.cmp(&a.path));
    objects.extend(changes);
    objects.extend(deletions);
    objects
}
