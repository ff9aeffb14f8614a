//! Storefront order and contact endpoints.

use chrono::NaiveDate;
use reqwest::Method;
use serde::{Deserialize, Serialize};
use sweetshop_core::types::date::iso_day;
use sweetshop_core::{ContactMessage, OrderId, OrderPayload};
use tracing::{info, instrument};

use super::ApiClient;
use crate::error::Result;

/// Body of `GET /api/server-date`.
#[derive(Debug, Deserialize)]
struct ServerDate {
    #[serde(with = "iso_day")]
    date: NaiveDate,
}

/// What the API says about an order it accepted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacedOrder {
    #[serde(default, alias = "_id", alias = "orderId")]
    pub id: Option<OrderId>,
    #[serde(default)]
    pub message: Option<String>,
}

impl ApiClient {
    /// Today's date according to the server clock.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the date cannot be parsed.
    #[instrument(skip(self))]
    pub async fn server_date(&self) -> Result<NaiveDate> {
        let url = self.endpoint(&["api", "server-date"])?;
        let body: ServerDate = self.get_json(url, None).await?;
        Ok(body.date)
    }

    /// Submit an order. Never retried.
    ///
    /// # Errors
    ///
    /// Returns error on any transport failure, non-success status, or a body
    /// carrying an `error` field.
    #[instrument(skip(self, payload), fields(customer = %payload.customer_name, total = %payload.total))]
    pub async fn place_order(&self, payload: &OrderPayload) -> Result<PlacedOrder> {
        let url = self.endpoint(&["api", "orders"])?;
        let placed: Option<PlacedOrder> = self.send_json(Method::POST, url, payload).await?;
        let placed = placed.unwrap_or_default();
        info!(order_id = ?placed.id, "Order placed");
        Ok(placed)
    }

    /// Send a contact form message.
    ///
    /// # Errors
    ///
    /// Returns error if the API does not accept the message.
    #[instrument(skip(self, message), fields(name = %message.name))]
    pub async fn submit_contact(&self, message: &ContactMessage) -> Result<()> {
        let url = self.endpoint(&["api", "contact"])?;
        let _: serde::de::IgnoredAny = self.send_json(Method::POST, url, message).await?;
        info!("Contact message sent");
        Ok(())
    }
}
