//! Catalog fetch with timeout, retry, cache and debounced refresh.

use std::sync::Arc;

use sweetshop_core::Product;
use tokio::time::Instant;
use tracing::{debug, info, instrument};

use super::ApiClient;
use crate::error::Result;
use crate::retry::{RetryPolicy, with_retry};

const CATALOG_KEY: &str = "catalog";

impl ApiClient {
    /// The product catalog, served from cache while it is fresh.
    ///
    /// # Errors
    ///
    /// Returns error if every fetch attempt fails or the response cannot be
    /// parsed.
    #[instrument(skip(self))]
    pub async fn catalog(&self) -> Result<Arc<Vec<Product>>> {
        if let Some(products) = self.inner.cache.get(&CATALOG_KEY).await {
            debug!(count = products.len(), "Catalog cache hit");
            return Ok(products);
        }
        self.refresh_catalog().await
    }

    /// Fetch the catalog from the API and replace the cached copy.
    ///
    /// Each attempt is bounded by the catalog timeout; network failures and
    /// timeouts are retried a fixed number of times with a fixed pause.
    ///
    /// # Errors
    ///
    /// Returns the last error once attempts run out, or straight away for an
    /// error response from the API.
    #[instrument(skip(self))]
    pub async fn refresh_catalog(&self) -> Result<Arc<Vec<Product>>> {
        let url = self.endpoint(&["api", "sweets"])?;
        let settings = &self.inner.catalog;
        let policy = RetryPolicy {
            attempts: settings.attempts,
            delay: settings.retry_delay,
        };
        let timeout = settings.timeout;

        let client = self;
        let url = &url;
        let products: Vec<Product> = with_retry(policy, move || {
            client.get_json(url.clone(), Some(timeout))
        })
        .await?;

        info!(count = products.len(), "Catalog fetched");
        let products = Arc::new(products);
        self.inner
            .cache
            .insert(CATALOG_KEY, Arc::clone(&products))
            .await;
        *self.inner.last_refresh.lock().await = Some(Instant::now());
        Ok(products)
    }

    /// Refresh when the storefront comes back into view.
    ///
    /// Returns `None` without touching the network if the last refresh was
    /// less than the configured minimum interval ago.
    ///
    /// # Errors
    ///
    /// Same as [`ApiClient::refresh_catalog`].
    #[instrument(skip(self))]
    pub async fn refresh_on_visible(&self) -> Result<Option<Arc<Vec<Product>>>> {
        let min_interval = self.inner.catalog.refresh_min_interval;
        let last_refresh = *self.inner.last_refresh.lock().await;
        if let Some(last) = last_refresh
            && last.elapsed() < min_interval
        {
            debug!(
                since_ms = u64::try_from(last.elapsed().as_millis()).unwrap_or(u64::MAX),
                "Skipping visibility refresh"
            );
            return Ok(None);
        }
        self.refresh_catalog().await.map(Some)
    }

    /// Drop the cached catalog so the next read goes to the API.
    pub async fn invalidate_catalog(&self) {
        self.inner.cache.invalidate(&CATALOG_KEY).await;
    }
}
