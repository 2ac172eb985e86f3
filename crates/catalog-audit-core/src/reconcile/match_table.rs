use ahash::AHashSet;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, info};

use crate::model::RecordMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    Exact,
    CaseInsensitive,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlugMatch {
    pub database: String,
    pub kind: MatchKind,
}

/// Filesystem canonical identifier -> catalog slug.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MatchTable {
    pairs: BTreeMap<String, SlugMatch>,
    #[serde(skip)]
    claimed: AHashSet<String>,
}

impl MatchTable {
    /// Pair filesystem keys with catalog slugs.
    ///
    /// Exact matches are resolved for every key before any case-insensitive
    /// match is tried, so an exact pairing always wins. Case-insensitive
    /// candidates are taken in sorted order and a slug is never paired twice.
    pub fn build(filesystem: &RecordMap, catalog: &RecordMap) -> Self {
        let mut table = MatchTable::default();

        for key in filesystem.keys() {
            if catalog.contains_key(key) {
                table.pair(key, key, MatchKind::Exact);
            }
        }

        let mut folded: BTreeMap<String, Vec<&str>> = BTreeMap::new();
        for slug in catalog.keys() {
            folded.entry(slug.to_lowercase()).or_default().push(slug);
        }

        for key in filesystem.keys() {
            if table.pairs.contains_key(key) {
                continue;
            }
            let candidate = folded
                .get(&key.to_lowercase())
                .and_then(|slugs| slugs.iter().find(|slug| !table.claimed.contains(**slug)));
            if let Some(slug) = candidate {
                debug!("Case-insensitive match {} -> {}", key, slug);
                table.pair(key, slug, MatchKind::CaseInsensitive);
            }
        }

        info!(
            "Matched {} of {} filesystem directories ({} catalog entries)",
            table.len(),
            filesystem.len(),
            catalog.len()
        );
        table
    }

    fn pair(&mut self, filesystem: &str, database: &str, kind: MatchKind) {
        self.claimed.insert(database.to_string());
        self.pairs.insert(
            filesystem.to_string(),
            SlugMatch {
                database: database.to_string(),
                kind,
            },
        );
    }

    /// Catalog slug paired with a filesystem key.
    pub fn get(&self, filesystem: &str) -> Option<&str> {
        self.pairs.get(filesystem).map(|m| m.database.as_str())
    }

    pub fn kind(&self, filesystem: &str) -> Option<MatchKind> {
        self.pairs.get(filesystem).map(|m| m.kind)
    }

    pub fn contains_filesystem(&self, filesystem: &str) -> bool {
        self.pairs.contains_key(filesystem)
    }

    /// Whether a catalog slug is in the table's value set.
    pub fn contains_database(&self, database: &str) -> bool {
        self.claimed.contains(database)
    }

    /// `(filesystem key, catalog slug)` pairs in filesystem key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs
            .iter()
            .map(|(fs, m)| (fs.as_str(), m.database.as_str()))
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::DirectoryRecord;

    fn map(keys: &[&str]) -> RecordMap {
        keys.iter()
            .map(|k| (k.to_string(), DirectoryRecord::new(*k)))
            .collect()
    }

    #[test]
    fn test_exact_match() {
        let table = MatchTable::build(&map(&["cafe", "cafe-coffee"]), &map(&["cafe", "cafe-coffee"]));
        assert_eq!(table.len(), 2);
        assert_eq!(table.get("cafe-coffee"), Some("cafe-coffee"));
        assert_eq!(table.kind("cafe"), Some(MatchKind::Exact));
        assert!(table.contains_database("cafe"));
    }

    #[test]
    fn test_case_insensitive_fallback() {
        let table = MatchTable::build(&map(&["cafe-darkbeauty"]), &map(&["Cafe-DarkBeauty"]));
        assert_eq!(table.get("cafe-darkbeauty"), Some("Cafe-DarkBeauty"));
        assert_eq!(table.kind("cafe-darkbeauty"), Some(MatchKind::CaseInsensitive));
    }

    #[test]
    fn test_exact_match_beats_case_variant() {
        let table = MatchTable::build(&map(&["couples"]), &map(&["Couples", "couples"]));
        assert_eq!(table.get("couples"), Some("couples"));
        assert!(!table.contains_database("Couples"));
    }

    #[test]
    fn test_claimed_slug_not_reused() {
        // "horses" takes the exact slug; "Horses" is left for nobody else
        let table = MatchTable::build(&map(&["horses", "HORSES"]), &map(&["horses"]));
        assert_eq!(table.get("horses"), Some("horses"));
        assert_eq!(table.get("HORSES"), None);
    }

    #[test]
    fn test_unmatched_left_out() {
        let table = MatchTable::build(&map(&["bugs"]), &map(&["gynoids-bugs"]));
        assert!(table.is_empty());
        assert!(!table.contains_filesystem("bugs"));
        assert!(!table.contains_database("gynoids-bugs"));
    }
}
