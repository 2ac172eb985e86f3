use serde::Serialize;
use serde_json::Value;
use std::collections::btree_map::{self, BTreeMap};
use std::path::PathBuf;

use crate::slug;

/// One directory on disk or one collection in the catalog.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DirectoryRecord {
    pub identifier: String,
    pub parent_identifier: Option<String>,
    /// Identifiers from the content root down to this node. Empty for catalog records.
    pub path_identifier_chain: Vec<String>,
    /// Where the directory lives on disk. `None` for catalog records.
    pub location: Option<PathBuf>,
    pub metadata: Option<Value>,
    pub hero_asset: Option<String>,
    pub image_count: usize,
    pub video_count: usize,
    pub child_count: usize,
    pub image_names: Vec<String>,
    pub video_names: Vec<String>,
    pub child_identifiers: Vec<String>,
    /// Set when the catalog detail could not be fetched. Only the identifier
    /// and parent are known; counts and metadata are placeholders.
    pub partial: bool,
}

impl DirectoryRecord {
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            ..Self::default()
        }
    }

    /// Key this record would carry in the catalog, derived from its chain.
    /// Falls back to the bare identifier when no chain was recorded.
    pub fn canonical_identifier(&self) -> String {
        if self.path_identifier_chain.is_empty() {
            slug::canonical_segment(&self.identifier)
        } else {
            slug::canonical_identifier(&self.path_identifier_chain)
        }
    }

    /// Canonical key of the parent directory, if any.
    pub fn parent_canonical_identifier(&self) -> Option<String> {
        match self.path_identifier_chain.len() {
            0 => self.parent_identifier.as_deref().map(slug::canonical_segment),
            1 => None,
            n => Some(slug::canonical_identifier(&self.path_identifier_chain[..n - 1])),
        }
    }

    pub fn has_metadata(&self) -> bool {
        self.metadata.is_some()
    }

    /// Placeholder for a catalog collection whose detail fetch failed.
    pub fn partial(identifier: impl Into<String>, parent: Option<String>) -> Self {
        Self {
            identifier: identifier.into(),
            parent_identifier: parent,
            partial: true,
            ..Self::default()
        }
    }
}

/// Sorted map of key to records. The first record stored under a key is the
/// primary one; later ones are kept so collisions stay visible.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct RecordMap {
    entries: BTreeMap<String, Vec<DirectoryRecord>>,
}

impl RecordMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a record, keeping any record already present under `key`.
    pub fn insert(&mut self, key: impl Into<String>, record: DirectoryRecord) {
        self.entries.entry(key.into()).or_default().push(record);
    }

    pub fn get(&self, key: &str) -> Option<&DirectoryRecord> {
        self.entries.get(key).and_then(|records| records.first())
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut DirectoryRecord> {
        self.entries.get_mut(key).and_then(|records| records.first_mut())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Every record stored under `key`, primary first.
    pub fn occurrences(&self, key: &str) -> &[DirectoryRecord] {
        self.entries.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Primary records in key order.
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            inner: self.entries.iter(),
        }
    }

    /// Keys holding more than one record, with their occurrence lists.
    pub fn collisions(&self) -> impl Iterator<Item = (&str, &[DirectoryRecord])> {
        self.entries
            .iter()
            .filter(|(_, records)| records.len() > 1)
            .map(|(key, records)| (key.as_str(), records.as_slice()))
    }

    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of records including collided ones.
    pub fn record_count(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    /// Every record including collided ones, in key order.
    pub fn all_records(&self) -> impl Iterator<Item = &DirectoryRecord> {
        self.entries.values().flatten()
    }

    /// Image total over every record, collided ones included.
    pub fn total_images(&self) -> usize {
        self.all_records().map(|r| r.image_count).sum()
    }

    pub fn total_videos(&self) -> usize {
        self.all_records().map(|r| r.video_count).sum()
    }
}

pub struct Iter<'a> {
    inner: btree_map::Iter<'a, String, Vec<DirectoryRecord>>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = (&'a str, &'a DirectoryRecord);

    fn next(&mut self) -> Option<Self::Item> {
        for (key, records) in self.inner.by_ref() {
            if let Some(first) = records.first() {
                return Some((key.as_str(), first));
            }
        }
        None
    }
}

impl<'a> IntoIterator for &'a RecordMap {
    type Item = (&'a str, &'a DirectoryRecord);
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl FromIterator<(String, DirectoryRecord)> for RecordMap {
    fn from_iter<T: IntoIterator<Item = (String, DirectoryRecord)>>(iter: T) -> Self {
        let mut map = RecordMap::new();
        for (key, record) in iter {
            map.insert(key, record);
        }
        map
    }
}
