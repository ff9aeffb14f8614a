//! Integration tests for the sweet shop client.
//!
//! Each test starts a `wiremock` server standing in for the shop API and
//! points an [`ApiClient`] at it.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p sweetshop-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `catalog` - Timeout, retry, cache and debounced refresh
//! - `checkout` - Order submission and cart clearing
//! - `admin` - Ledger updates, edits, summaries and statements
//! - `pricing_properties` - Property tests for the pricing rules

#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

use std::time::Duration;

use chrono::NaiveDate;
use serde_json::{Value, json};
use sweetshop_client::{ApiClient, ApiConfig, CatalogConfig};
use sweetshop_core::{Money, Product, ProductId, ProductUnit};
use url::Url;
use wiremock::MockServer;

/// Catalog timeout used by tests; mock delays are set well above it.
pub const TEST_TIMEOUT: Duration = Duration::from_millis(200);

/// Settings that keep retry tests fast.
#[must_use]
pub fn fast_catalog() -> CatalogConfig {
    CatalogConfig {
        timeout: TEST_TIMEOUT,
        attempts: 3,
        retry_delay: Duration::from_millis(10),
        cache_ttl: Duration::from_secs(60),
        refresh_min_interval: Duration::from_secs(30),
    }
}

/// A config pointing at `server`.
#[must_use]
pub fn config_for(server: &MockServer, catalog: CatalogConfig) -> ApiConfig {
    let mut config = ApiConfig::new(Url::parse(&server.uri()).unwrap());
    config.catalog = catalog;
    config
}

/// A mock API and a client talking to it.
pub async fn mock_api() -> (MockServer, ApiClient) {
    mock_api_with(fast_catalog()).await
}

/// Same as [`mock_api`] with custom catalog settings.
pub async fn mock_api_with(catalog: CatalogConfig) -> (MockServer, ApiClient) {
    let server = MockServer::start().await;
    let client = ApiClient::new(&config_for(&server, catalog)).unwrap();
    (server, client)
}

/// Build a date.
#[must_use]
pub fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// A catalog product.
#[must_use]
pub fn product(id: &str, name: &str, rupees: i64, unit: ProductUnit) -> Product {
    Product {
        id: ProductId::new(id),
        name: name.to_string(),
        category: "Classic".to_string(),
        rate: Money::from_rupees(rupees),
        unit,
        image: None,
        is_festival: None,
        stock: None,
    }
}

/// The catalog as the API serves it.
#[must_use]
pub fn catalog_json() -> Value {
    json!([
        {"_id": "kaju", "name": "Kaju Katli", "category": "Dry Fruit", "rate": 800, "unit": "Kg"},
        {"_id": "ladoo", "name": "Motichoor Ladoo", "category": "Classic", "rate": 20, "unit": "piece"},
        {"_id": "diya", "name": "Diwali Box", "category": "Festival", "rate": 450, "unit": "piece",
         "isFestival": true, "stock": 0}
    ])
}

/// An order as the API lists it.
#[must_use]
pub fn order_json(id: &str, status: &str, total: i64, advance: i64, order_date: &str) -> Value {
    json!({
        "_id": id,
        "customerName": "Asha",
        "mobile": "9876543210",
        "address": "12 MG Road",
        "preference": "",
        "status": status,
        "total": total,
        "advancePaid": advance,
        "orderDate": order_date,
        "deliveryDate": "2026-10-25",
        "items": [
            {"sweetName": "Kaju Katli", "quantity": 500, "price": total, "unit": "grams"}
        ]
    })
}

/// The JSON body of the `index`-th request the server received.
pub async fn request_body(server: &MockServer, index: usize) -> Value {
    let requests = server.received_requests().await.unwrap();
    serde_json::from_slice(&requests.get(index).unwrap().body).unwrap()
}
