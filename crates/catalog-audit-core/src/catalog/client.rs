use reqwest::blocking::Client;
use reqwest::Url;
use serde::de::DeserializeOwned;
use std::thread;
use std::time::Duration;
use tracing::{debug, warn};

use super::wire::{CollectionPayload, DetailResponse, ListResponse};
use crate::config::AuditConfig;
use crate::error::Error;

const MAX_BACKOFF: Duration = Duration::from_secs(5);

/// Read access to the remote collection catalog.
///
/// The HTTP implementation talks to the content API; tests substitute an
/// in-memory catalog.
pub trait CatalogClient: Send + Sync {
    /// Every top-level collection, as listed by the catalog.
    fn list_collections(&self) -> Result<Vec<CollectionPayload>, Error>;

    /// Full detail for one collection, whichever response shape it came in.
    fn fetch_collection(&self, slug: &str) -> Result<CollectionPayload, Error>;

    /// Human readable location of the catalog, used in error messages.
    fn location(&self) -> String {
        "catalog".to_string()
    }
}

pub struct HttpCatalogClient {
    client: Client,
    base: Url,
    max_retries: u32,
    backoff: Duration,
}

impl HttpCatalogClient {
    pub fn new(config: &AuditConfig) -> Result<Self, Error> {
        let base = Url::parse(config.api_base())
            .map_err(|e| Error::Other(format!("Invalid api_base_url '{}': {}", config.api_base_url, e)))?;
        if base.cannot_be_a_base() {
            return Err(Error::Other(format!(
                "api_base_url '{}' cannot be used as a base URL",
                config.api_base_url
            )));
        }

        let client = Client::builder()
            .timeout(config.request_timeout())
            .user_agent(concat!("catalog-audit/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base,
            max_retries: config.max_retries,
            backoff: config.retry_backoff(),
        })
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        // `new` rejected cannot-be-a-base URLs, so segments are always available.
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn get_json<T: DeserializeOwned>(&self, url: &Url) -> Result<T, Error> {
        let mut attempt = 0;
        loop {
            match self.get_once(url) {
                Ok(value) => return Ok(value),
                Err(err) if attempt < self.max_retries && err.is_transient() => {
                    let delay = self
                        .backoff
                        .saturating_mul(2u32.saturating_pow(attempt))
                        .min(MAX_BACKOFF);
                    warn!(
                        "GET {} failed ({}), retrying in {}ms",
                        url,
                        err,
                        delay.as_millis()
                    );
                    thread::sleep(delay);
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }

    fn get_once<T: DeserializeOwned>(&self, url: &Url) -> Result<T, Error> {
        debug!("GET {}", url);
        let response = self.client.get(url.clone()).send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(response.json::<T>()?)
    }
}

impl CatalogClient for HttpCatalogClient {
    fn list_collections(&self) -> Result<Vec<CollectionPayload>, Error> {
        let url = self.endpoint(&["content", "collections"]);
        let response: ListResponse = self.get_json(&url)?;
        Ok(response.data.collections)
    }

    fn fetch_collection(&self, slug: &str) -> Result<CollectionPayload, Error> {
        let url = self.endpoint(&["content", "collections", slug]);
        let response: DetailResponse = self.get_json(&url)?;
        Ok(response.data.into_collection())
    }

    fn location(&self) -> String {
        self.base.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client_for(base: &str) -> HttpCatalogClient {
        let config = AuditConfig {
            api_base_url: base.to_string(),
            ..AuditConfig::default()
        };
        HttpCatalogClient::new(&config).unwrap()
    }

    #[test]
    fn test_endpoint_appends_segments() {
        let client = client_for("http://localhost:4000/api/");
        assert_eq!(
            client.endpoint(&["content", "collections"]).as_str(),
            "http://localhost:4000/api/content/collections"
        );
    }

    #[test]
    fn test_endpoint_escapes_slug() {
        let client = client_for("http://localhost:4000/api");
        assert_eq!(
            client
                .endpoint(&["content", "collections", "wolves n/foxes"])
                .as_str(),
            "http://localhost:4000/api/content/collections/wolves%20n%2Ffoxes"
        );
    }

    #[test]
    fn test_rejects_invalid_base() {
        let config = AuditConfig {
            api_base_url: "not a url".to_string(),
            ..AuditConfig::default()
        };
        assert!(HttpCatalogClient::new(&config).is_err());
    }
}
