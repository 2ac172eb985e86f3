use catalog_audit_core::catalog::{CatalogClient, HttpCatalogClient};
use catalog_audit_core::{AuditConfig, Error};
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config_for(server: &MockServer) -> AuditConfig {
    AuditConfig {
        api_base_url: format!("{}/api/", server.uri()),
        request_timeout_secs: 5,
        max_retries: 2,
        retry_backoff_ms: 10,
        ..AuditConfig::default()
    }
}

/// The blocking client must not run on the async runtime's worker threads.
async fn blocking<T, F>(f: F) -> T
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f).await.unwrap()
}

#[tokio::test(flavor = "multi_thread")]
async fn test_list_collections() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/content/collections"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": { "collections": [
                { "slug": "cafe", "imageCount": 4, "subcollections": ["cafe-coffee"] },
                { "slug": "couples", "imageCount": 0 }
            ] }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let config = config_for(&server);
    let collections = blocking(move || {
        HttpCatalogClient::new(&config)
            .unwrap()
            .list_collections()
            .unwrap()
    })
    .await;

    assert_eq!(collections.len(), 2);
    assert_eq!(collections[0].slug.as_deref(), Some("cafe"));
    assert_eq!(collections[0].image_count, Some(4));
    assert_eq!(collections[0].subcollections[0].slug(), "cafe-coffee");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_fetch_nested_detail() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/content/collections/cafe-coffee"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "collection": {
                "slug": "cafe-coffee",
                "gallery": [{ "filename": "a.jpg", "type": "image" }],
                "pagination": { "total": 12 }
            } }
        })))
        .mount(&server)
        .await;

    let config = config_for(&server);
    let payload = blocking(move || {
        HttpCatalogClient::new(&config)
            .unwrap()
            .fetch_collection("cafe-coffee")
            .unwrap()
    })
    .await;

    assert_eq!(payload.slug.as_deref(), Some("cafe-coffee"));
    assert_eq!(payload.pagination.and_then(|p| p.total), Some(12));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_not_found_is_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/content/collections/ghost"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let config = config_for(&server);
    let err = blocking(move || {
        HttpCatalogClient::new(&config)
            .unwrap()
            .fetch_collection("ghost")
            .unwrap_err()
    })
    .await;

    assert!(matches!(err, Error::Status { status: 404, .. }));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_server_errors_are_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/content/collections"))
        .respond_with(ResponseTemplate::new(503))
        .expect(3)
        .mount(&server)
        .await;

    let config = config_for(&server);
    let err = blocking(move || {
        HttpCatalogClient::new(&config)
            .unwrap()
            .list_collections()
            .unwrap_err()
    })
    .await;

    assert!(matches!(err, Error::Status { status: 503, .. }));
    assert!(err.is_transient());
}
