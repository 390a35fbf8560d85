//! Catalog persistence.
//!
//! A catalog is saved as one JSON snapshot document:
//!
//! ```text
//! { "format_version": 1, "saved_at": "...", "entries": [ {"key": .., "value": ..}, ... ] }
//! ```
//!
//! Entries are written in catalog key order, so a save/load cycle keeps
//! `keys()` order. Non-finite floats are encoded as strings (see
//! `model::value`), which keeps `+inf` path lengths intact.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::Catalog;
use crate::model::CatalogKey;
use crate::{Error, Result};

pub const FORMAT_VERSION: u32 = 1;

// ============================================================================
// Snapshot document
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot<V> {
    pub format_version: u32,
    pub saved_at: DateTime<Utc>,
    pub entries: Vec<SnapshotEntry<V>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotEntry<V> {
    pub key: CatalogKey,
    pub value: V,
}

impl<V: Clone> Snapshot<V> {
    pub fn of(catalog: &Catalog<V>) -> Self {
        Snapshot {
            format_version: FORMAT_VERSION,
            saved_at: Utc::now(),
            entries: catalog
                .entries()
                .into_iter()
                .map(|(key, value)| SnapshotEntry { key, value })
                .collect(),
        }
    }
}

impl<V> Snapshot<V> {
    pub fn into_catalog(self) -> Result<Catalog<V>> {
        if self.format_version != FORMAT_VERSION {
            return Err(Error::InvalidParameter(format!(
                "unsupported snapshot format version {} (expected {FORMAT_VERSION})",
                self.format_version
            )));
        }
        Ok(self.entries.into_iter().map(|e| (e.key, e.value)).collect())
    }
}

/// Write a catalog snapshot as JSON.
pub fn write_json<V>(catalog: &Catalog<V>, writer: &mut dyn Write) -> Result<()>
where
    V: Serialize + Clone,
{
    serde_json::to_writer(&mut *writer, &Snapshot::of(catalog))?;
    writer.flush()?;
    Ok(())
}

/// Read a catalog snapshot written by [`write_json`].
pub fn read_json<V>(reader: &mut dyn Read) -> Result<Catalog<V>>
where
    V: DeserializeOwned,
{
    let snapshot: Snapshot<V> = serde_json::from_reader(reader)?;
    snapshot.into_catalog()
}

// ============================================================================
// CatalogStore Trait
// ============================================================================

/// Stable external store for one catalog.
pub trait CatalogStore<V> {
    /// Replace the stored catalog with `catalog`.
    fn save(&self, catalog: &Catalog<V>) -> Result<()>;

    /// Load the last saved catalog.
    fn load(&self) -> Result<Catalog<V>>;
}

// ============================================================================
// MemoryStore
// ============================================================================

/// Keeps the serialized snapshot in memory. For tests and embedding.
#[derive(Debug, Default)]
pub struct MemoryStore {
    snapshot: RwLock<Option<Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Size of the stored snapshot in bytes, if any.
    pub fn stored_len(&self) -> Option<usize> {
        self.snapshot.read().as_ref().map(Vec::len)
    }
}

impl<V> CatalogStore<V> for MemoryStore
where
    V: Serialize + DeserializeOwned + Clone,
{
    fn save(&self, catalog: &Catalog<V>) -> Result<()> {
        let mut buf = Vec::new();
        write_json(catalog, &mut buf)?;
        *self.snapshot.write() = Some(buf);
        Ok(())
    }

    fn load(&self) -> Result<Catalog<V>> {
        let guard = self.snapshot.read();
        let bytes = guard.as_ref().ok_or_else(|| {
            Error::Io(std::io::Error::new(std::io::ErrorKind::NotFound, "memory store is empty"))
        })?;
        read_json(&mut bytes.as_slice())
    }
}

// ============================================================================
// JsonFileStore
// ============================================================================

/// One JSON snapshot file on disk.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl<V> CatalogStore<V> for JsonFileStore
where
    V: Serialize + DeserializeOwned + Clone,
{
    fn save(&self, catalog: &Catalog<V>) -> Result<()> {
        let mut writer = BufWriter::new(File::create(&self.path)?);
        write_json(catalog, &mut writer)?;
        debug!(path = %self.path.display(), entries = catalog.len(), "catalog saved");
        Ok(())
    }

    fn load(&self) -> Result<Catalog<V>> {
        let mut reader = BufReader::new(File::open(&self.path)?);
        let catalog = read_json(&mut reader)?;
        debug!(path = %self.path.display(), "catalog loaded");
        Ok(catalog)
    }
}
