use ahash::AHashSet;
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::catalog::{CatalogClient, CollectionPayload};
use crate::error::Error;
use crate::model::{DirectoryRecord, RecordMap};
use crate::progress::ProgressReporter;

/// A collection whose detail could not be fetched.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FetchFailure {
    pub identifier: String,
    pub parent: Option<String>,
    pub reason: String,
}

#[derive(Debug, Default)]
pub struct CatalogScan {
    pub records: RecordMap,
    pub failures: Vec<FetchFailure>,
}

/// Walks the catalog breadth first. Every level of sub-collections is fetched
/// as a parallel fan-out bounded by `max_concurrent_fetches`.
pub struct CatalogScanner<'a> {
    client: &'a dyn CatalogClient,
    max_concurrent_fetches: usize,
}

impl<'a> CatalogScanner<'a> {
    pub fn new(client: &'a dyn CatalogClient, max_concurrent_fetches: usize) -> Self {
        Self {
            client,
            max_concurrent_fetches: max_concurrent_fetches.max(1),
        }
    }

    /// Only a failure of the top-level listing is fatal. Everything after
    /// that degrades to warnings and recorded failures.
    pub fn scan(&self, reporter: &dyn ProgressReporter) -> Result<CatalogScan, Error> {
        let collections = self.client.list_collections().map_err(|err| {
            Error::CatalogUnreachable {
                url: self.client.location(),
                reason: err.to_string(),
            }
        })?;
        info!("Found {} top-level collections", collections.len());
        if collections.is_empty() {
            warn!("Catalog at {} lists no collections", self.client.location());
        }

        let pool = ThreadPoolBuilder::new()
            .num_threads(self.max_concurrent_fetches)
            .thread_name(|i| format!("catalog-fetch-{}", i))
            .build()
            .map_err(|e| Error::Other(format!("Failed to build fetch pool: {}", e)))?;

        let mut scan = CatalogScan::default();
        let mut fetched = 0usize;

        // Top level: the listing already carries the summary, detail only adds media.
        let mut seen: AHashSet<String> = AHashSet::new();
        let mut top_level: Vec<(String, CollectionPayload)> = Vec::new();
        for collection in collections {
            match collection.slug.clone() {
                Some(slug) if !slug.is_empty() => {
                    if seen.insert(slug.clone()) {
                        top_level.push((slug, collection));
                    } else {
                        warn!("Collection '{}' listed more than once", slug);
                    }
                }
                _ => warn!("Skipping collection with no slug"),
            }
        }

        let slugs: Vec<&str> = top_level.iter().map(|(slug, _)| slug.as_str()).collect();
        let details = self.fetch_all(&pool, &slugs);

        let mut pending: Vec<(String, String)> = Vec::new();
        for ((slug, summary), detail) in top_level.into_iter().zip(details) {
            let payload = match detail {
                Ok(detail) => summary.with_detail(detail),
                Err(err) => {
                    warn!("Failed to get images for {}: {}", slug, err);
                    summary
                }
            };
            let record = record_from_payload(&slug, payload, None);
            pending.extend(child_refs(&record));
            fetched += 1;
            reporter.on_collection_fetched(fetched, &slug);
            scan.records.insert(slug, record);
        }

        // Deeper levels: the detail response is the only source for a sub-collection.
        while !pending.is_empty() {
            let mut level: Vec<(String, String)> = Vec::new();
            for (slug, parent) in pending.drain(..) {
                if scan.records.contains_key(&slug) {
                    link_known_collection(&mut scan.records, &slug, &parent);
                    continue;
                }
                if level.iter().any(|(queued, _)| queued == &slug) {
                    debug!("Sub-collection '{}' referenced twice in one level", slug);
                    continue;
                }
                level.push((slug, parent));
            }

            let slugs: Vec<&str> = level.iter().map(|(slug, _)| slug.as_str()).collect();
            let results = self.fetch_all(&pool, &slugs);

            for ((slug, parent), result) in level.into_iter().zip(results) {
                match result {
                    Ok(payload) => {
                        let key = payload
                            .slug
                            .clone()
                            .filter(|s| !s.is_empty())
                            .unwrap_or_else(|| slug.clone());
                        if scan.records.contains_key(&key) {
                            warn!(
                                "Sub-collection '{}' of '{}' resolved to known slug '{}'",
                                slug, parent, key
                            );
                            link_known_collection(&mut scan.records, &key, &parent);
                            continue;
                        }
                        let record = record_from_payload(&key, payload, Some(parent));
                        pending.extend(child_refs(&record));
                        fetched += 1;
                        reporter.on_collection_fetched(fetched, &key);
                        scan.records.insert(key, record);
                    }
                    Err(err) => {
                        warn!("Failed to get subcollection {}: {}", slug, err);
                        scan.failures.push(FetchFailure {
                            identifier: slug.clone(),
                            parent: Some(parent.clone()),
                            reason: err.to_string(),
                        });
                        // Keep the collection visible to matching with what the
                        // parent told us about it.
                        if !scan.records.contains_key(&slug) {
                            let record = DirectoryRecord::partial(slug.clone(), Some(parent));
                            scan.records.insert(slug, record);
                        }
                    }
                }
            }
        }

        info!(
            "Total catalog collections (including subcollections): {}",
            scan.records.len()
        );
        Ok(scan)
    }

    /// Fetch every slug concurrently. Results come back in input order and a
    /// failure never cancels its siblings.
    fn fetch_all(
        &self,
        pool: &ThreadPool,
        slugs: &[&str],
    ) -> Vec<Result<CollectionPayload, Error>> {
        let client = self.client;
        pool.install(|| {
            slugs
                .par_iter()
                .map(|slug| client.fetch_collection(slug))
                .collect()
        })
    }
}

/// A reference to an already recorded collection. Cycles back up the parent
/// chain are ignored, anything else may adopt the referencing parent.
fn link_known_collection(records: &mut RecordMap, slug: &str, parent: &str) {
    if is_ancestor(records, slug, parent) {
        debug!("Skipping cyclic reference {} -> {}", parent, slug);
    } else if let Some(existing) = records.get_mut(slug) {
        adopt_listed_collection(existing, slug, parent);
    }
}

/// A collection listed at top level and later referenced as a sub-collection
/// belongs to the referencing collection.
fn adopt_listed_collection(existing: &mut DirectoryRecord, slug: &str, parent: &str) {
    if existing.parent_identifier.is_none() && slug != parent {
        debug!("Collection '{}' is a sub-collection of '{}'", slug, parent);
        existing.parent_identifier = Some(parent.to_string());
    } else {
        debug!("Collection '{}' already visited", slug);
    }
}

/// Whether `slug` already sits on the parent chain of `node`.
fn is_ancestor(records: &RecordMap, slug: &str, node: &str) -> bool {
    let mut current = Some(node.to_string());
    // bounded so a corrupt chain cannot spin forever
    for _ in 0..=records.len() {
        match current {
            Some(ref id) if id == slug => return true,
            Some(id) => current = records.get(&id).and_then(|r| r.parent_identifier.clone()),
            None => return false,
        }
    }
    false
}

fn child_refs(record: &DirectoryRecord) -> Vec<(String, String)> {
    record
        .child_identifiers
        .iter()
        .map(|child| (child.clone(), record.identifier.clone()))
        .collect()
}

/// Normalize a catalog payload into a record. Counts come from the explicit
/// summary fields when present, then from pagination, then from the media list.
pub fn record_from_payload(
    slug: &str,
    payload: CollectionPayload,
    parent: Option<String>,
) -> DirectoryRecord {
    let mut image_names = Vec::new();
    let mut video_names = Vec::new();
    if let Some(media) = payload.media() {
        for item in media {
            let name = item.name().unwrap_or_default().to_string();
            if item.is_video() {
                video_names.push(name);
            } else {
                image_names.push(name);
            }
        }
    }

    let image_count = payload
        .image_count
        .or_else(|| payload.pagination.as_ref().and_then(|p| p.total))
        .map(|n| n as usize)
        .unwrap_or(image_names.len());
    let video_count = payload
        .video_count
        .map(|n| n as usize)
        .unwrap_or(video_names.len());

    let child_identifiers: Vec<String> = payload
        .subcollections
        .iter()
        .map(|s| s.slug().to_string())
        .filter(|s| !s.is_empty())
        .collect();

    DirectoryRecord {
        identifier: slug.to_string(),
        parent_identifier: parent,
        metadata: payload.effective_config().cloned(),
        hero_asset: payload.hero_image.clone(),
        image_count,
        video_count,
        child_count: child_identifiers.len(),
        image_names,
        video_names,
        child_identifiers,
        ..DirectoryRecord::default()
    }
}
