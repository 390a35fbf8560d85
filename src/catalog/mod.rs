//! # Catalogs
//!
//! Keyed collections of per-recording artifacts: thresholded graphs and
//! metric records, both addressed by `(subject, state, band)`.
//!
//! | Alias | Value |
//! |-------|-------|
//! | `GraphCatalog` | `CoherenceGraph` (thresholded) |
//! | `MetricsCatalog` | `MetricRecord` |
//!
//! Keys iterate in first-insertion order. A second `put` on an existing key
//! replaces the value in place and keeps the key's position. The catalog is
//! internally locked so independent workers can insert concurrently; each
//! insertion holds the write lock for one key only.

pub mod store;

use hashbrown::HashMap;
use parking_lot::RwLock;

use crate::metrics::MetricRecord;
use crate::model::{Band, CatalogKey, CoherenceGraph, State};
use crate::{Error, Result};

pub type GraphCatalog = Catalog<CoherenceGraph>;
pub type MetricsCatalog = Catalog<MetricRecord>;

// ============================================================================
// Catalog
// ============================================================================

/// Insertion-ordered map from `CatalogKey` to `V`.
pub struct Catalog<V> {
    inner: RwLock<CatalogInner<V>>,
}

struct CatalogInner<V> {
    entries: HashMap<CatalogKey, V>,
    order: Vec<CatalogKey>,
}

impl<V> Default for Catalog<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> Catalog<V> {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(CatalogInner {
                entries: HashMap::new(),
                order: Vec::new(),
            }),
        }
    }

    /// Insert or overwrite. Returns true when an existing entry was replaced.
    pub fn put(&self, key: CatalogKey, value: V) -> bool {
        let mut inner = self.inner.write();
        match inner.entries.insert(key.clone(), value) {
            Some(_) => true,
            None => {
                inner.order.push(key);
                false
            }
        }
    }

    pub fn contains(&self, key: &CatalogKey) -> bool {
        self.inner.read().entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.inner.read().order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All keys in insertion order.
    pub fn keys(&self) -> Vec<CatalogKey> {
        self.inner.read().order.clone()
    }

    /// Keys recorded for one `(state, band)` pair, in insertion order.
    pub fn keys_for(&self, state: State, band: Band) -> Vec<CatalogKey> {
        self.inner
            .read()
            .order
            .iter()
            .filter(|k| k.state == state && k.band == band)
            .cloned()
            .collect()
    }

    /// Run `f` on the entry without cloning it.
    pub fn with<R>(&self, key: &CatalogKey, f: impl FnOnce(&V) -> R) -> Result<R> {
        let inner = self.inner.read();
        inner
            .entries
            .get(key)
            .map(f)
            .ok_or_else(|| Error::KeyNotFound(key.clone()))
    }
}

impl<V: Clone> Catalog<V> {
    pub fn get(&self, key: &CatalogKey) -> Result<V> {
        self.with(key, V::clone)
    }

    /// Snapshot of every entry in insertion order.
    pub fn entries(&self) -> Vec<(CatalogKey, V)> {
        let inner = self.inner.read();
        inner
            .order
            .iter()
            .filter_map(|k| inner.entries.get(k).map(|v| (k.clone(), v.clone())))
            .collect()
    }
}

impl<V: Clone> Clone for Catalog<V> {
    fn clone(&self) -> Self {
        self.entries().into_iter().collect()
    }
}

impl<V> FromIterator<(CatalogKey, V)> for Catalog<V> {
    fn from_iter<I: IntoIterator<Item = (CatalogKey, V)>>(iter: I) -> Self {
        let catalog = Catalog::new();
        for (k, v) in iter {
            catalog.put(k, v);
        }
        catalog
    }
}

impl<V> std::fmt::Debug for Catalog<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Catalog").field("len", &self.len()).finish()
    }
}
