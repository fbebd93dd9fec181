//! Feature catalogs: persisted embedding tables and top-K retrieval.

pub mod topk;

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::Path;

use serde::de::{self, MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::util::{GarmatchError, GarmatchResult};

pub use topk::{cosine_similarity, MatchResult};

/// One catalog entry: the region file it was embedded from and its vector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureEntry {
    pub filename: String,
    pub feature: Vec<f32>,
}

/// Ordered mapping from key to [`FeatureEntry`].
///
/// Entry order is the insertion order and survives a save/load round trip;
/// top-K ties and batch-query output both depend on it. All vectors in one
/// table share a dimension, fixed by the first entry. Once a matching run
/// starts the table is read-only and may be shared across threads.
///
/// Persisted form: `{"<key>": {"filename": ..., "feature": [...]}}`. A
/// persisted table with duplicate keys or mixed dimensions fails to load.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureTable {
    entries: Vec<(String, FeatureEntry)>,
    index: HashMap<String, usize>,
}

impl FeatureTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces an entry.
    ///
    /// A repeated key replaces the earlier entry in place, keeping its
    /// position. A vector whose length differs from the table's dimension is
    /// rejected.
    pub fn insert(&mut self, key: String, entry: FeatureEntry) -> GarmatchResult<()> {
        if let Some(expected) = self.dimension() {
            if entry.feature.len() != expected {
                return Err(GarmatchError::DimensionMismatch {
                    key,
                    expected,
                    got: entry.feature.len(),
                });
            }
        }
        match self.index.get(&key) {
            Some(&at) => self.entries[at].1 = entry,
            None => {
                self.index.insert(key.clone(), self.entries.len());
                self.entries.push((key, entry));
            }
        }
        Ok(())
    }

    /// Looks up an entry by key.
    pub fn get(&self, key: &str) -> Option<&FeatureEntry> {
        self.index.get(key).map(|&at| &self.entries[at].1)
    }

    /// Entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FeatureEntry)> {
        self.entries.iter().map(|(key, entry)| (key.as_str(), entry))
    }

    /// Keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(key, _)| key.as_str())
    }

    /// Vector dimension shared by every entry, or `None` while empty.
    pub fn dimension(&self) -> Option<usize> {
        self.entries.first().map(|(_, entry)| entry.feature.len())
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the table holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Loads a table from its persisted JSON form.
    pub fn load<P: AsRef<Path>>(path: P) -> GarmatchResult<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|err| GarmatchError::Io {
            path: path.display().to_string(),
            reason: err.to_string(),
        })?;
        serde_json::from_str(&text).map_err(|err| GarmatchError::MalformedFeatureTable {
            path: path.display().to_string(),
            reason: err.to_string(),
        })
    }

    /// Writes the table as 2-space-indented JSON, preserving entry order.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> GarmatchResult<()> {
        let path = path.as_ref();
        let json =
            serde_json::to_string_pretty(self).map_err(|err| GarmatchError::MalformedJson {
                path: path.display().to_string(),
                reason: err.to_string(),
            })?;
        fs::write(path, json).map_err(|err| GarmatchError::Io {
            path: path.display().to_string(),
            reason: err.to_string(),
        })
    }

    pub(crate) fn entries(&self) -> &[(String, FeatureEntry)] {
        &self.entries
    }
}

impl Serialize for FeatureTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, entry) in &self.entries {
            map.serialize_entry(key, entry)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for FeatureTable {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct TableVisitor;

        impl<'de> Visitor<'de> for TableVisitor {
            type Value = FeatureTable;

            fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
                formatter.write_str("a map of feature keys to entries")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut table = FeatureTable::new();
                while let Some((key, entry)) = access.next_entry::<String, FeatureEntry>()? {
                    if table.index.contains_key(&key) {
                        return Err(de::Error::custom(format!("duplicate key '{key}'")));
                    }
                    if let Some(expected) = table.dimension() {
                        if entry.feature.len() != expected {
                            return Err(de::Error::custom(format!(
                                "feature '{key}' has dimension {}, table expects {expected}",
                                entry.feature.len()
                            )));
                        }
                    }
                    table.index.insert(key.clone(), table.entries.len());
                    table.entries.push((key, entry));
                }
                Ok(table)
            }
        }

        deserializer.deserialize_map(TableVisitor)
    }
}
