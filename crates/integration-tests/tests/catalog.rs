//! Catalog fetch: timeout, retry, cache and visibility refresh.

#![allow(clippy::unwrap_used)]

use std::time::Duration;

use sweetshop_client::ApiError;
use sweetshop_core::{Money, ProductDraft, ProductUnit};
use sweetshop_integration_tests::{TEST_TIMEOUT, catalog_json, fast_catalog, mock_api, mock_api_with};
use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

fn slow() -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_json(catalog_json())
        .set_delay(TEST_TIMEOUT * 4)
}

// =============================================================================
// Fetch and Cache
// =============================================================================

#[tokio::test]
async fn test_catalog_parses_products() {
    let (server, client) = mock_api().await;
    Mock::given(method("GET"))
        .and(path("/api/sweets"))
        .respond_with(ResponseTemplate::new(200).set_body_json(catalog_json()))
        .mount(&server)
        .await;

    let catalog = client.catalog().await.unwrap();
    assert_eq!(catalog.len(), 3);

    let kaju = catalog.first().unwrap();
    assert_eq!(kaju.id.as_str(), "kaju");
    assert_eq!(kaju.unit, ProductUnit::Kilogram);
    assert_eq!(kaju.rate, Money::from_rupees(800));

    let festival = catalog.get(2).unwrap();
    assert!(festival.is_festival());
    assert!(festival.is_out_of_stock());
}

#[tokio::test]
async fn test_catalog_is_served_from_cache() {
    let (server, client) = mock_api().await;
    Mock::given(method("GET"))
        .and(path("/api/sweets"))
        .respond_with(ResponseTemplate::new(200).set_body_json(catalog_json()))
        .expect(1)
        .mount(&server)
        .await;

    client.catalog().await.unwrap();
    client.catalog().await.unwrap();
}

#[tokio::test]
async fn test_product_change_invalidates_cache() {
    let (server, client) = mock_api().await;
    Mock::given(method("GET"))
        .and(path("/api/sweets"))
        .respond_with(ResponseTemplate::new(200).set_body_json(catalog_json()))
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/api/sweets/ladoo"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"message": "Deleted"})))
        .expect(1)
        .mount(&server)
        .await;

    client.catalog().await.unwrap();
    client
        .remove_product(&sweetshop_core::ProductId::new("ladoo"))
        .await
        .unwrap();
    client.catalog().await.unwrap();
}

#[tokio::test]
async fn test_invalid_product_is_not_sent() {
    let (server, client) = mock_api().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;

    let draft = ProductDraft {
        name: "  ".to_string(),
        category: "Classic".to_string(),
        rate: Money::from_rupees(10),
        unit: ProductUnit::Piece,
        image: None,
        is_festival: false,
        stock: None,
    };
    assert!(client.add_product(&draft).await.is_err());
}

// =============================================================================
// Timeout and Retry
// =============================================================================

#[tokio::test]
async fn test_timeout_is_retried_until_success() {
    let (server, client) = mock_api().await;
    Mock::given(method("GET"))
        .and(path("/api/sweets"))
        .respond_with(slow())
        .up_to_n_times(2)
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/sweets"))
        .respond_with(ResponseTemplate::new(200).set_body_json(catalog_json()))
        .with_priority(2)
        .mount(&server)
        .await;

    let catalog = client.catalog().await.unwrap();
    assert_eq!(catalog.len(), 3);
    assert_eq!(server.received_requests().await.unwrap().len(), 3);
}

#[tokio::test]
async fn test_timeout_gives_up_after_attempts() {
    let (server, client) = mock_api().await;
    Mock::given(method("GET"))
        .and(path("/api/sweets"))
        .respond_with(slow())
        .mount(&server)
        .await;

    let err = client.catalog().await.unwrap_err();
    assert!(matches!(err, ApiError::Timeout(limit) if limit == TEST_TIMEOUT));
    assert!(err.is_transient());
    assert_eq!(server.received_requests().await.unwrap().len(), 3);
}

#[tokio::test]
async fn test_error_status_is_not_retried() {
    let (server, client) = mock_api().await;
    Mock::given(method("GET"))
        .and(path("/api/sweets"))
        .respond_with(
            ResponseTemplate::new(500).set_body_json(serde_json::json!({"error": "Database down"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let err = client.catalog().await.unwrap_err();
    assert!(matches!(
        err,
        ApiError::Api { status: 500, ref message } if message == "Database down"
    ));
}

#[tokio::test]
async fn test_connection_refused_is_transient() {
    let (server, client) = mock_api().await;
    drop(server);

    let err = client.catalog().await.unwrap_err();
    assert!(matches!(err, ApiError::Http(_)));
}

// =============================================================================
// Visibility Refresh
// =============================================================================

#[tokio::test]
async fn test_visibility_refresh_is_debounced() {
    let (server, client) = mock_api().await;
    Mock::given(method("GET"))
        .and(path("/api/sweets"))
        .respond_with(ResponseTemplate::new(200).set_body_json(catalog_json()))
        .expect(1)
        .mount(&server)
        .await;

    client.catalog().await.unwrap();
    assert!(client.refresh_on_visible().await.unwrap().is_none());
}

#[tokio::test]
async fn test_visibility_refresh_after_interval() {
    let mut settings = fast_catalog();
    settings.refresh_min_interval = Duration::ZERO;
    let (server, client) = mock_api_with(settings).await;
    Mock::given(method("GET"))
        .and(path("/api/sweets"))
        .respond_with(ResponseTemplate::new(200).set_body_json(catalog_json()))
        .expect(2)
        .mount(&server)
        .await;

    client.catalog().await.unwrap();
    let refreshed = client.refresh_on_visible().await.unwrap();
    assert_eq!(refreshed.unwrap().len(), 3);
}

#[tokio::test]
async fn test_first_visibility_refresh_fetches() {
    let (server, client) = mock_api().await;
    Mock::given(method("GET"))
        .and(path("/api/sweets"))
        .respond_with(ResponseTemplate::new(200).set_body_json(catalog_json()))
        .expect(1)
        .mount(&server)
        .await;

    assert!(client.refresh_on_visible().await.unwrap().is_some());
}
