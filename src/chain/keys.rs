//! Key sets and declaration canonicalization
//!
//! Tasks describe their inputs and outputs in whatever shape is handy:
//! nothing at all, a list, a mapping, or an already-built [`KeySet`].
//! [`canonicalize`] folds every shape into a [`KeySet`] so adjacent tasks
//! can be compared with plain set arithmetic.
//!
//! Mapping declarations contribute their *keys*, never their values. An
//! emit task declaring `{name: "world"}` therefore provides `name`.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Canonical set of input or output key identifiers
///
/// Backed by a `BTreeSet` so iteration and `Display` are stable; callers
/// must not rely on that order for anything but readability.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeySet(BTreeSet<Arc<str>>);

impl KeySet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<Arc<str>>) -> bool {
        self.0.insert(key.into())
    }

    #[inline]
    pub fn contains(&self, key: &str) -> bool {
        self.0.contains(key)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<str>> {
        self.0.iter()
    }

    /// Keys in `self` that are not in `other`
    pub fn difference(&self, other: &KeySet) -> KeySet {
        KeySet(self.0.difference(&other.0).cloned().collect())
    }

    pub fn is_subset(&self, other: &KeySet) -> bool {
        self.0.is_subset(&other.0)
    }
}

impl fmt::Display for KeySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, key) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "'{}'", key)?;
        }
        f.write_str("}")
    }
}

impl FromIterator<Arc<str>> for KeySet {
    fn from_iter<I: IntoIterator<Item = Arc<str>>>(iter: I) -> Self {
        KeySet(iter.into_iter().collect())
    }
}

impl<'a> FromIterator<&'a str> for KeySet {
    fn from_iter<I: IntoIterator<Item = &'a str>>(iter: I) -> Self {
        KeySet(iter.into_iter().map(Arc::from).collect())
    }
}

impl FromIterator<String> for KeySet {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        KeySet(iter.into_iter().map(Arc::from).collect())
    }
}

impl<'a> IntoIterator for &'a KeySet {
    type Item = &'a Arc<str>;
    type IntoIter = std::collections::btree_set::Iter<'a, Arc<str>>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// The accepted shapes of a requires/provides declaration
///
/// Deserializes from YAML/JSON as: `null` → `Absent`, a sequence of
/// strings → `List`, a mapping → `Mapping`. `Set` is only reachable from
/// code.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Declaration {
    /// Nothing declared
    #[default]
    Absent,
    /// Any finite list of keys, duplicates allowed
    List(Vec<Arc<str>>),
    /// Key → value mapping; only the keys count
    Mapping(Map<String, Value>),
    /// Already canonical
    #[serde(skip_deserializing)]
    Set(KeySet),
}

impl Declaration {
    /// Build a list declaration from anything yielding key-like items
    pub fn list<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Arc<str>>,
    {
        Declaration::List(keys.into_iter().map(Into::into).collect())
    }
}

impl From<KeySet> for Declaration {
    fn from(keys: KeySet) -> Self {
        Declaration::Set(keys)
    }
}

impl From<Map<String, Value>> for Declaration {
    fn from(map: Map<String, Value>) -> Self {
        Declaration::Mapping(map)
    }
}

impl<const N: usize> From<[&str; N]> for Declaration {
    fn from(keys: [&str; N]) -> Self {
        Declaration::list(keys)
    }
}

impl From<Vec<&str>> for Declaration {
    fn from(keys: Vec<&str>) -> Self {
        Declaration::list(keys)
    }
}

impl From<Vec<String>> for Declaration {
    fn from(keys: Vec<String>) -> Self {
        Declaration::list(keys)
    }
}

impl<D: Into<Declaration>> From<Option<D>> for Declaration {
    fn from(decl: Option<D>) -> Self {
        decl.map_or(Declaration::Absent, Into::into)
    }
}

/// Fold a declaration into its canonical key set
///
/// - `Absent` or empty → `{}`
/// - `Set` → returned as-is
/// - `Mapping` → its keys
/// - `List` → its distinct elements
pub fn canonicalize(declaration: Declaration) -> KeySet {
    match declaration {
        Declaration::Absent => KeySet::new(),
        Declaration::Set(keys) => keys,
        Declaration::Mapping(map) => map.keys().map(String::as_str).collect(),
        Declaration::List(keys) => keys.into_iter().collect(),
    }
}

impl From<Declaration> for KeySet {
    fn from(declaration: Declaration) -> Self {
        canonicalize(declaration)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn keys(items: &[&str]) -> KeySet {
        items.iter().copied().collect()
    }

    #[test]
    fn absent_is_empty() {
        assert!(canonicalize(Declaration::Absent).is_empty());
        assert!(canonicalize(Declaration::List(vec![])).is_empty());
        assert!(canonicalize(Declaration::Mapping(Map::new())).is_empty());
    }

    #[test]
    fn mapping_yields_keys() {
        let map = json!({"a": 1, "b": 2}).as_object().cloned().unwrap();
        assert_eq!(canonicalize(map.into()), keys(&["a", "b"]));
    }

    #[test]
    fn list_dedupes() {
        assert_eq!(canonicalize(["a", "a", "b"].into()), keys(&["a", "b"]));
    }

    #[test]
    fn set_passes_through() {
        let set = keys(&["x", "y"]);
        assert_eq!(canonicalize(Declaration::Set(set.clone())), set);
    }

    #[test]
    fn option_none_is_absent() {
        let decl: Declaration = Option::<Vec<&str>>::None.into();
        assert_eq!(decl, Declaration::Absent);
    }

    #[test]
    fn difference_and_subset() {
        let required = keys(&["x", "z"]);
        let provided = keys(&["x", "y"]);
        assert_eq!(required.difference(&provided), keys(&["z"]));
        assert!(!required.is_subset(&provided));
        assert!(keys(&["x"]).is_subset(&provided));
        assert!(KeySet::new().is_subset(&KeySet::new()));
    }

    #[test]
    fn deserialize_shapes_from_yaml() {
        let decl: Declaration = serde_yaml::from_str("~").unwrap();
        assert_eq!(decl, Declaration::Absent);

        let decl: Declaration = serde_yaml::from_str("[a, b, a]").unwrap();
        assert_eq!(canonicalize(decl), keys(&["a", "b"]));

        let decl: Declaration = serde_yaml::from_str("{a: 1, b: two}").unwrap();
        assert!(matches!(decl, Declaration::Mapping(_)));
        assert_eq!(canonicalize(decl), keys(&["a", "b"]));
    }

    #[test]
    fn display_quotes_keys() {
        assert_eq!(keys(&["b", "a"]).to_string(), "{'a', 'b'}");
        assert_eq!(KeySet::new().to_string(), "{}");
    }
}
