//! VariantStore - named collection of variants with prefix scoping.

use std::collections::BTreeMap;
use std::ops::{Deref, DerefMut};

use smallvec::SmallVec;

use super::serializable::Serializable;
use super::variant::Variant;
use crate::util::{Error, Result};

/// Ordered mapping from key to [`Variant`].
///
/// Keys iterate in lexicographic order. Reads and writes through the
/// keyed API are relative to the active prefix, which is changed with
/// [`VariantStore::scope`]; the stored key is always the full
/// concatenation.
#[derive(Clone, Debug)]
pub struct VariantStore {
    entries: BTreeMap<String, Variant>,
    prefixes: SmallVec<[String; 4]>,
    compatibility_mode: bool,
}

impl Default for VariantStore {
    fn default() -> Self {
        Self::new()
    }
}

impl VariantStore {
    /// Create an empty store with the empty prefix active.
    pub fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            prefixes: smallvec::smallvec![String::new()],
            compatibility_mode: false,
        }
    }

    pub(crate) fn from_entries(entries: BTreeMap<String, Variant>, compatibility_mode: bool) -> Self {
        Self {
            entries,
            compatibility_mode,
            ..Self::new()
        }
    }

    /// Flag given when the store was read. Stored, not interpreted.
    #[inline]
    pub fn compatibility_mode(&self) -> bool {
        self.compatibility_mode
    }

    /// Currently active prefix.
    #[inline]
    pub fn prefix(&self) -> &str {
        self.prefixes.last().map_or("", String::as_str)
    }

    /// Enter a nested prefix scope.
    ///
    /// The returned guard dereferences to this store with
    /// `current prefix + prefix` active. Dropping it restores the previous
    /// prefix.
    pub fn scope(&mut self, prefix: &str) -> Scope<'_> {
        let full = format!("{}{}", self.prefix(), prefix);
        self.prefixes.push(full);
        Scope { store: self }
    }

    fn full_key(&self, key: &str) -> String {
        format!("{}{}", self.prefix(), key)
    }

    /// Keys under the active prefix, with the prefix stripped.
    pub fn keys(&self) -> Vec<String> {
        let prefix = self.prefix();
        self.entries
            .keys()
            .filter_map(|k| k.strip_prefix(prefix))
            .map(str::to_string)
            .collect()
    }

    /// Insert a variant under `prefix + key`, returning any previous value.
    pub fn insert(&mut self, key: &str, variant: impl Into<Variant>) -> Option<Variant> {
        let key = self.full_key(key);
        self.entries.insert(key, variant.into())
    }

    pub fn get_variant(&self, key: &str) -> Option<&Variant> {
        self.entries.get(&self.full_key(key))
    }

    pub fn get_variant_mut(&mut self, key: &str) -> Option<&mut Variant> {
        let key = self.full_key(key);
        self.entries.get_mut(&key)
    }

    pub fn remove(&mut self, key: &str) -> Option<Variant> {
        let key = self.full_key(key);
        self.entries.remove(&key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(&self.full_key(key))
    }

    /// Store a typed value under `prefix + key`.
    pub fn set<V: Serializable>(&mut self, key: &str, value: &V) {
        self.insert(key, value.to_variant());
    }

    /// Fetch a typed value stored under `prefix + key`.
    pub fn get<V: Serializable>(&self, key: &str) -> Result<V> {
        let full = self.full_key(key);
        let variant = self
            .entries
            .get(&full)
            .ok_or_else(|| Error::KeyNotFound(full.clone()))?;
        V::from_variant(&full, variant)
    }

    /// All entries with their full keys, in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Variant)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of entries across all prefixes.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Payload bytes the encoder writes for this store in a binary body.
    pub fn total_size(&self) -> usize {
        self.entries.values().map(Variant::byte_size).sum()
    }

    pub(crate) fn entries(&self) -> &BTreeMap<String, Variant> {
        &self.entries
    }
}

/// Guard for a nested prefix scope. See [`VariantStore::scope`].
pub struct Scope<'a> {
    store: &'a mut VariantStore,
}

impl Deref for Scope<'_> {
    type Target = VariantStore;

    fn deref(&self) -> &VariantStore {
        &*self.store
    }
}

impl DerefMut for Scope<'_> {
    fn deref_mut(&mut self) -> &mut VariantStore {
        &mut *self.store
    }
}

impl Drop for Scope<'_> {
    fn drop(&mut self) {
        if self.store.prefixes.len() > 1 {
            self.store.prefixes.pop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::{Matrix, PrimitiveType};

    #[test]
    fn test_prefix_scoping() -> Result<()> {
        let mut store = VariantStore::new();
        {
            let mut scope = store.scope("a.");
            scope.insert("x", Variant::matrix(PrimitiveType::Uint8, 1, 1)?);
            assert_eq!(scope.prefix(), "a.");
        }
        assert_eq!(store.prefix(), "");
        assert_eq!(store.keys(), vec!["a.x".to_string()]);

        let scope = store.scope("a.");
        assert_eq!(scope.keys(), vec!["x".to_string()]);
        assert!(scope.contains("x"));
        assert!(!scope.contains("a.x"));
        Ok(())
    }

    #[test]
    fn test_nested_scopes_concatenate() {
        let mut store = VariantStore::new();
        {
            let mut outer = store.scope("mesh.");
            {
                let mut inner = outer.scope("attr.");
                assert_eq!(inner.prefix(), "mesh.attr.");
                inner.set("scale", &2.0f32);
            }
            assert_eq!(outer.prefix(), "mesh.");
            assert_eq!(outer.keys(), vec!["attr.scale".to_string()]);
        }
        assert_eq!(store.get::<f32>("mesh.attr.scale").ok(), Some(2.0));
    }

    #[test]
    fn test_keys_are_lexicographic() {
        let mut store = VariantStore::new();
        for key in ["zeta", "alpha", "mid", "Alpha"] {
            store.set(key, &1u8);
        }
        assert_eq!(store.keys(), vec!["Alpha", "alpha", "mid", "zeta"]);
        let order: Vec<&str> = store.iter().map(|(k, _)| k).collect();
        assert_eq!(order, vec!["Alpha", "alpha", "mid", "zeta"]);
    }

    #[test]
    fn test_insert_replaces_and_remove() {
        let mut store = VariantStore::new();
        assert!(store.insert("k", Matrix::<u8>::zeros(1, 1).unwrap()).is_none());
        assert!(store.insert("k", Matrix::<u16>::zeros(1, 1).unwrap()).is_some());
        assert_eq!(store.len(), 1);
        assert!(store.get_variant("k").is_some());
        assert!(store.remove("k").is_some());
        assert!(store.is_empty());
        assert!(matches!(store.get::<u8>("k"), Err(Error::KeyNotFound(_))));
    }

    #[test]
    fn test_total_size() {
        let mut store = VariantStore::new();
        store.insert("m", Matrix::<f32>::zeros(3, 10).unwrap());
        store.insert("l", vec![vec![1u32, 2, 3], vec![4u32]]);
        assert_eq!(store.total_size(), 3 * 10 * 4 + (4 * 4 + 2));
    }
}
