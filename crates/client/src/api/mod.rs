//! Shop REST API client.
//!
//! # Architecture
//!
//! - One [`ApiClient`] per process, cheap to clone (`Arc` inside)
//! - The API is the source of truth; nothing is written locally first
//! - The catalog is cached in memory via `moka` and refreshed on demand
//! - Only the catalog fetch has a timeout and retries; order placement and
//!   admin mutations fail straight away
//!
//! # Endpoints
//!
//! | Call | Method / path |
//! |------|---------------|
//! | [`ApiClient::catalog`] | `GET /api/sweets` |
//! | [`ApiClient::server_date`] | `GET /api/server-date` |
//! | [`ApiClient::place_order`] | `POST /api/orders` |
//! | [`ApiClient::submit_contact`] | `POST /api/contact` |
//! | [`ApiClient::add_product`] | `POST /api/sweets` |
//! | [`ApiClient::update_product`] | `PUT /api/sweets/{id}` |
//! | [`ApiClient::remove_product`] | `DELETE /api/sweets/{id}` |
//! | [`ApiClient::orders`] | `GET /api/orders` |
//! | [`ApiClient::daily_summary`] | `GET /api/orders/summary?date=` |
//! | [`ApiClient::update_status`] | `PATCH /api/orders/{id}/status` |
//! | [`ApiClient::save_edit`] | `PUT /api/orders/{id}` |
//! | [`ApiClient::statement`] | `GET /api/orders/statement?from=&to=` |

mod admin;
mod catalog;
mod orders;

pub use admin::AdminError;
pub use orders::PlacedOrder;

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use sweetshop_core::Product;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, error};
use url::Url;

use crate::config::{ApiConfig, CatalogConfig};
use crate::error::{ApiError, Result};

/// Client for the shop REST API.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    client: reqwest::Client,
    base_url: Url,
    catalog: CatalogConfig,
    cache: Cache<&'static str, Arc<Vec<Product>>>,
    last_refresh: Mutex<Option<Instant>>,
}

/// Status, content type and body of a finished request.
struct RawResponse {
    status: StatusCode,
    content_type: Option<String>,
    body: Vec<u8>,
}

impl ApiClient {
    /// Create a new API client.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("sweetshop/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(ApiError::Http)?;

        let cache = Cache::builder()
            .max_capacity(1)
            .time_to_live(config.catalog.cache_ttl)
            .build();

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                client,
                base_url: config.base_url.clone(),
                catalog: config.catalog.clone(),
                cache,
                last_refresh: Mutex::new(None),
            }),
        })
    }

    /// Base URL every endpoint is resolved against.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    /// Build an endpoint URL by appending path segments to the base URL.
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.inner.base_url.clone();
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|()| ApiError::InvalidEndpoint(self.inner.base_url.to_string()))?;
            path.pop_if_empty().extend(segments);
        }
        Ok(url)
    }

    /// Send a request and read the whole body.
    async fn execute(
        &self,
        request: RequestBuilder,
        timeout: Option<Duration>,
    ) -> Result<RawResponse> {
        let request = match timeout {
            Some(limit) => request.timeout(limit),
            None => request,
        };

        let response = request
            .send()
            .await
            .map_err(|e| ApiError::from_send(e, timeout))?;

        let status = response.status();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response
            .bytes()
            .await
            .map_err(|e| ApiError::from_send(e, timeout))?
            .to_vec();

        Ok(RawResponse {
            status,
            content_type,
            body,
        })
    }

    /// `GET` a JSON resource.
    async fn get_json<T: DeserializeOwned>(
        &self,
        url: Url,
        timeout: Option<Duration>,
    ) -> Result<T> {
        debug!(%url, "GET");
        let raw = self
            .execute(self.inner.client.get(url), timeout)
            .await?;
        decode_json(&raw)
    }

    /// Send a JSON body and decode the JSON answer.
    async fn send_json<B, T>(&self, method: Method, url: Url, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        debug!(%method, %url, "Sending request");
        let raw = self
            .execute(self.inner.client.request(method, url).json(body), None)
            .await?;
        decode_json(&raw)
    }

    /// `DELETE` a resource, ignoring whatever body comes back.
    async fn delete(&self, url: Url) -> Result<()> {
        debug!(%url, "DELETE");
        let raw = self
            .execute(self.inner.client.delete(url), None)
            .await?;
        decode_json::<serde::de::IgnoredAny>(&raw).map(|_| ())
    }

    /// `GET` a binary download of the given content type.
    async fn get_bytes(&self, url: Url, expected_type: &str) -> Result<Vec<u8>> {
        debug!(%url, expected_type, "GET (download)");
        let raw = self
            .execute(self.inner.client.get(url), None)
            .await?;

        if !raw.status.is_success() {
            return Err(parse_error(raw.status, &raw.body));
        }
        if let Some(content_type) = &raw.content_type
            && !content_type.starts_with(expected_type)
        {
            return Err(ApiError::UnexpectedContentType(content_type.clone()));
        }
        if raw.body.is_empty() {
            return Err(ApiError::EmptyBody);
        }
        Ok(raw.body)
    }
}

/// Decode a JSON response, turning failures and `error` bodies into errors.
fn decode_json<T: DeserializeOwned>(raw: &RawResponse) -> Result<T> {
    if !raw.status.is_success() {
        return Err(parse_error(raw.status, &raw.body));
    }

    let value: serde_json::Value = if raw.body.iter().all(u8::is_ascii_whitespace) {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&raw.body).map_err(|e| {
            error!(
                error = %e,
                body = %String::from_utf8_lossy(&raw.body).chars().take(500).collect::<String>(),
                "Failed to parse API response"
            );
            ApiError::Parse(e.to_string())
        })?
    };

    if let Some(message) = error_field(&value) {
        return Err(ApiError::Rejected(message));
    }

    serde_json::from_value(value).map_err(|e| ApiError::Parse(e.to_string()))
}

/// Build an error for a non-success response.
///
/// The message comes from the body's `error` field when there is one.
fn parse_error(status: StatusCode, body: &[u8]) -> ApiError {
    let message = serde_json::from_slice::<serde_json::Value>(body)
        .ok()
        .as_ref()
        .and_then(error_field)
        .unwrap_or_else(|| format!("Request failed with status {status}"));

    error!(status = status.as_u16(), %message, "API returned non-success status");
    ApiError::Api {
        status: status.as_u16(),
        message,
    }
}

/// The top-level `error` field of a body, if set.
fn error_field(value: &serde_json::Value) -> Option<String> {
    match value.get("error")? {
        serde_json::Value::String(message) => {
            Some(message.clone()).filter(|m| !m.trim().is_empty())
        }
        serde_json::Value::Null | serde_json::Value::Bool(false) => None,
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn client(base: &str) -> ApiClient {
        ApiClient::new(&ApiConfig::new(Url::parse(base).unwrap())).unwrap()
    }

    fn raw(status: u16, body: &str) -> RawResponse {
        RawResponse {
            status: StatusCode::from_u16(status).unwrap(),
            content_type: Some("application/json".to_string()),
            body: body.as_bytes().to_vec(),
        }
    }

    #[test]
    fn test_endpoint_joins_segments() {
        let api = client("http://localhost:5000");
        assert_eq!(
            api.endpoint(&["api", "sweets"]).unwrap().as_str(),
            "http://localhost:5000/api/sweets"
        );

        let api = client("https://example.com/shop/");
        assert_eq!(
            api.endpoint(&["api", "orders", "abc 1", "status"]).unwrap().as_str(),
            "https://example.com/shop/api/orders/abc%201/status"
        );
    }

    #[test]
    fn test_error_message_from_body() {
        let err = decode_json::<serde_json::Value>(&raw(400, r#"{"error": "Invalid mobile"}"#))
            .unwrap_err();
        assert!(
            matches!(err, ApiError::Api { status: 400, ref message } if message == "Invalid mobile")
        );
    }

    #[test]
    fn test_generic_message_for_non_json_failure() {
        let err = decode_json::<serde_json::Value>(&raw(502, "<html>Bad Gateway</html>"))
            .unwrap_err();
        assert!(matches!(
            err,
            ApiError::Api { status: 502, ref message } if message.starts_with("Request failed with status 502")
        ));
    }

    #[test]
    fn test_error_field_on_success_is_rejection() {
        let err = decode_json::<serde_json::Value>(&raw(200, r#"{"error": "Out of stock"}"#))
            .unwrap_err();
        assert!(matches!(err, ApiError::Rejected(ref m) if m == "Out of stock"));

        let ok: serde_json::Value = decode_json(&raw(200, r#"{"error": null, "id": 1}"#)).unwrap();
        assert_eq!(ok["id"], 1);
    }

    #[test]
    fn test_empty_body_decodes_as_unit() {
        decode_json::<()>(&raw(204, "")).unwrap();
        decode_json::<serde::de::IgnoredAny>(&raw(200, r#"{"deleted": true}"#)).unwrap();
    }
}
