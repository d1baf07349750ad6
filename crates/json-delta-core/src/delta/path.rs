use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A single step within a keypath: an array index or an object member.
///
/// Indices order before members, so a sorted list of keypaths groups
/// array positions ahead of object members at each level.
///
/// ```
/// # use json_delta_core::Key;
/// let member = Key::member("name");
/// let index = Key::Index(2);
/// assert!(index < member);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Key {
    /// Array index lookup.
    Index(usize),
    /// Object member lookup.
    Member(String),
}

impl Key {
    /// Creates a member key.
    #[must_use]
    pub fn member<S>(name: S) -> Self
    where
        S: Into<String>,
    {
        Self::Member(name.into())
    }

    /// Returns the index when this key addresses an array.
    #[must_use]
    pub fn as_index(&self) -> Option<usize> {
        match self {
            Self::Index(index) => Some(*index),
            Self::Member(_) => None,
        }
    }

    /// Returns the member name when this key addresses an object.
    #[must_use]
    pub fn as_member(&self) -> Option<&str> {
        match self {
            Self::Index(_) => None,
            Self::Member(name) => Some(name),
        }
    }

    pub(crate) fn container_kind(&self) -> &'static str {
        match self {
            Self::Index(_) => "array",
            Self::Member(_) => "object",
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Index(index) => write!(f, "{index}"),
            Self::Member(name) => {
                let encoded = serde_json::to_string(name).map_err(|_| fmt::Error)?;
                f.write_str(&encoded)
            }
        }
    }
}

impl From<usize> for Key {
    fn from(value: usize) -> Self {
        Self::Index(value)
    }
}

impl From<&str> for Key {
    fn from(value: &str) -> Self {
        Self::Member(value.to_owned())
    }
}

impl Serialize for Key {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Self::Index(index) => serializer.serialize_u64(*index as u64),
            Self::Member(name) => serializer.serialize_str(name),
        }
    }
}

impl<'de> Deserialize<'de> for Key {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct Visitor;

        impl<'de> serde::de::Visitor<'de> for Visitor {
            type Value = Key;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a member name or a non-negative integer index")
            }

            fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                Ok(Key::Member(v.to_owned()))
            }

            fn visit_string<E>(self, v: String) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                Ok(Key::Member(v))
            }

            fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                let index = usize::try_from(v)
                    .map_err(|_| E::custom(format!("negative array index {v}")))?;
                Ok(Key::Index(index))
            }

            fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                let index =
                    usize::try_from(v).map_err(|_| E::custom("array index exceeds usize"))?;
                Ok(Key::Index(index))
            }

            fn visit_f64<E>(self, v: f64) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                Err(E::custom(format!("array index must be an integer, found {v}")))
            }
        }

        deserializer.deserialize_any(Visitor)
    }
}

/// Location of a node within a document, as a sequence of [`Key`]s from
/// the root. The empty path addresses the root itself.
///
/// Paths order lexicographically, key by key.
///
/// ```
/// # use json_delta_core::{Key, KeyPath};
/// let path = KeyPath::root().child(Key::member("foo")).child(Key::Index(0));
/// assert_eq!(path.len(), 2);
/// assert_eq!(path.to_string(), "[\"foo\", 0]");
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeyPath(Vec<Key>);

impl KeyPath {
    /// Creates the empty path addressing the document root.
    #[must_use]
    pub fn root() -> Self {
        Self::default()
    }

    /// Returns a new path extended by `key`.
    #[must_use]
    pub fn child(&self, key: Key) -> Self {
        let mut keys = Vec::with_capacity(self.0.len() + 1);
        keys.extend_from_slice(&self.0);
        keys.push(key);
        Self(keys)
    }

    /// Returns the underlying keys.
    #[must_use]
    pub fn keys(&self) -> &[Key] {
        &self.0
    }

    /// Returns the number of keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Indicates whether this is the root path.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the final key, if any.
    #[must_use]
    pub fn last(&self) -> Option<&Key> {
        self.0.last()
    }

    /// Returns an iterator over the keys.
    pub fn iter(&self) -> std::slice::Iter<'_, Key> {
        self.0.iter()
    }

    /// Pushes a new key in-place.
    pub fn push(&mut self, key: Key) {
        self.0.push(key);
    }

    /// Pops the last key off the path.
    pub fn pop(&mut self) -> Option<Key> {
        self.0.pop()
    }

    /// Consumes the path and returns the owned keys.
    #[must_use]
    pub fn into_keys(self) -> Vec<Key> {
        self.0
    }
}

impl From<Vec<Key>> for KeyPath {
    fn from(value: Vec<Key>) -> Self {
        Self(value)
    }
}

impl From<&[Key]> for KeyPath {
    fn from(value: &[Key]) -> Self {
        Self(value.to_vec())
    }
}

impl FromIterator<Key> for KeyPath {
    fn from_iter<I: IntoIterator<Item = Key>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl fmt::Display for KeyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (idx, key) in self.0.iter().enumerate() {
            if idx > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{key}")?;
        }
        f.write_str("]")
    }
}

impl<'a> IntoIterator for &'a KeyPath {
    type Item = &'a Key;
    type IntoIter = std::slice::Iter<'a, Key>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl IntoIterator for KeyPath {
    type Item = Key;
    type IntoIter = std::vec::IntoIter<Key>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}
