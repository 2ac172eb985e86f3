#![allow(dead_code)]

use catalog_audit_core::catalog::{CatalogClient, CollectionPayload};
use catalog_audit_core::Error;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

/// In-memory catalog answering with canned JSON bodies.
#[derive(Default)]
pub struct FakeCatalog {
    pub listing: Option<Vec<Value>>,
    pub details: HashMap<String, Value>,
    pub detail_calls: AtomicUsize,
}

impl FakeCatalog {
    pub fn new(listing: Vec<Value>) -> Self {
        Self {
            listing: Some(listing),
            ..Self::default()
        }
    }

    /// A catalog whose listing endpoint is down.
    pub fn unreachable() -> Self {
        Self::default()
    }

    pub fn with_detail(mut self, slug: &str, body: Value) -> Self {
        self.details.insert(slug.to_string(), body);
        self
    }

    pub fn calls(&self) -> usize {
        self.detail_calls.load(Ordering::SeqCst)
    }
}

impl CatalogClient for FakeCatalog {
    fn list_collections(&self) -> Result<Vec<CollectionPayload>, Error> {
        let listing = self
            .listing
            .as_ref()
            .ok_or_else(|| Error::Other("connection refused".to_string()))?;
        listing
            .iter()
            .map(|v| serde_json::from_value(v.clone()).map_err(Error::from))
            .collect()
    }

    fn fetch_collection(&self, slug: &str) -> Result<CollectionPayload, Error> {
        self.detail_calls.fetch_add(1, Ordering::SeqCst);
        let body = self.details.get(slug).ok_or_else(|| Error::Status {
            url: format!("fake://collections/{}", slug),
            status: 404,
        })?;
        Ok(serde_json::from_value(body.clone())?)
    }

    fn location(&self) -> String {
        "fake://catalog".to_string()
    }
}
