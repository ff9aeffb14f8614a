//! Admin endpoints: products, order ledger, summaries and statements.
//!
//! Every mutation is confirmed by the API before any local state changes.
//! The ledger is patched with the order the server sends back.

use chrono::NaiveDate;
use reqwest::Method;
use sweetshop_core::{
    DailySummary, EditError, Order, OrderEditor, OrderId, OrderLedger, OrderStatus, Product,
    ProductDraft, ProductError, ProductId, StatusError, StatusUpdate,
};
use thiserror::Error;
use tracing::{info, instrument, warn};

use super::ApiClient;
use crate::error::{ApiError, Result};

/// Errors from admin operations: local validation or the API call.
#[derive(Debug, Error)]
pub enum AdminError {
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Product(#[from] ProductError),
    #[error(transparent)]
    Status(#[from] StatusError),
    #[error(transparent)]
    Edit(#[from] EditError),
    #[error("Order not found: {0}")]
    UnknownOrder(OrderId),
    #[error("Statement range starts {from} after it ends {to}")]
    InvalidRange { from: NaiveDate, to: NaiveDate },
}

impl ApiClient {
    /// Create a product.
    ///
    /// # Errors
    ///
    /// Returns error if the draft is invalid or the API rejects it.
    #[instrument(skip(self, draft), fields(name = %draft.name))]
    pub async fn add_product(&self, draft: &ProductDraft) -> Result<Product, AdminError> {
        draft.validate()?;
        let url = self.endpoint(&["api", "sweets"])?;
        let product: Product = self.send_json(Method::POST, url, draft).await?;
        self.invalidate_catalog().await;
        info!(product_id = %product.id, "Product added");
        Ok(product)
    }

    /// Replace a product's details.
    ///
    /// # Errors
    ///
    /// Returns error if the draft is invalid or the API rejects it.
    #[instrument(skip(self, draft), fields(product_id = %id))]
    pub async fn update_product(
        &self,
        id: &ProductId,
        draft: &ProductDraft,
    ) -> Result<Product, AdminError> {
        draft.validate()?;
        let url = self.endpoint(&["api", "sweets", id.as_str()])?;
        let product: Product = self.send_json(Method::PUT, url, draft).await?;
        self.invalidate_catalog().await;
        info!("Product updated");
        Ok(product)
    }

    /// Delete a product.
    ///
    /// # Errors
    ///
    /// Returns error if the API refuses.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn remove_product(&self, id: &ProductId) -> Result<()> {
        let url = self.endpoint(&["api", "sweets", id.as_str()])?;
        self.delete(url).await?;
        self.invalidate_catalog().await;
        info!("Product removed");
        Ok(())
    }

    /// Every order, in the order the API lists them.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the orders cannot be parsed.
    #[instrument(skip(self))]
    pub async fn orders(&self) -> Result<Vec<Order>> {
        let url = self.endpoint(&["api", "orders"])?;
        let orders: Vec<Order> = self.get_json(url, None).await?;
        info!(count = orders.len(), "Orders fetched");
        Ok(orders)
    }

    /// Re-fetch the orders into `ledger`.
    ///
    /// The ledger is left as it was if the fetch fails.
    ///
    /// # Errors
    ///
    /// Same as [`ApiClient::orders`].
    pub async fn refresh_ledger(&self, ledger: &mut OrderLedger) -> Result<()> {
        let orders = self.orders().await?;
        ledger.replace(orders);
        Ok(())
    }

    /// The server's sales summary for one day.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the summary cannot be parsed.
    #[instrument(skip(self))]
    pub async fn daily_summary(&self, day: NaiveDate) -> Result<DailySummary> {
        let mut url = self.endpoint(&["api", "orders", "summary"])?;
        url.query_pairs_mut()
            .append_pair("date", &day.format("%Y-%m-%d").to_string());
        self.get_json(url, None).await
    }

    /// Move an order to a new status and patch the ledger with the result.
    ///
    /// The transition is checked locally against the cached order first.
    ///
    /// # Errors
    ///
    /// Returns [`AdminError::UnknownOrder`] if the order is not in the
    /// ledger, [`AdminError::Status`] for a forbidden move, or the API error.
    #[instrument(skip(self, ledger), fields(order_id = %id, next = %next))]
    pub async fn update_status(
        &self,
        ledger: &mut OrderLedger,
        id: &OrderId,
        next: OrderStatus,
    ) -> Result<Order, AdminError> {
        let order = ledger
            .get(id)
            .ok_or_else(|| AdminError::UnknownOrder(id.clone()))?;
        let update = StatusUpdate::for_order(order, next)?;

        let url = self.endpoint(&["api", "orders", id.as_str(), "status"])?;
        let confirmed: Order = self.send_json(Method::PATCH, url, &update).await?;
        if confirmed.status != next {
            warn!(returned = %confirmed.status, "API returned a different status than requested");
        }

        ledger.patch(confirmed.clone());
        info!("Order status updated");
        Ok(confirmed)
    }

    /// Send the changes collected in `editor` and patch the ledger with the
    /// order the API returns.
    ///
    /// # Errors
    ///
    /// Returns [`AdminError::Edit`] if there is nothing valid to send, or the
    /// API error. The ledger is untouched on failure.
    #[instrument(skip(self, ledger, editor), fields(order_id = %editor.original().id))]
    pub async fn save_edit(
        &self,
        ledger: &mut OrderLedger,
        editor: &OrderEditor,
    ) -> Result<Order, AdminError> {
        let edit = editor.build()?;
        let id = &editor.original().id;

        let url = self.endpoint(&["api", "orders", id.as_str()])?;
        let confirmed: Order = self.send_json(Method::PUT, url, &edit).await?;

        ledger.patch(confirmed.clone());
        info!(
            advance_paid = %confirmed.advance_paid,
            total = %confirmed.total,
            "Order edited"
        );
        Ok(confirmed)
    }

    /// Download the PDF statement for an inclusive date range.
    ///
    /// # Errors
    ///
    /// Returns [`AdminError::InvalidRange`] when `from` is after `to`, and an
    /// API error for a failed, empty or non-PDF response.
    #[instrument(skip(self))]
    pub async fn statement(&self, from: NaiveDate, to: NaiveDate) -> Result<Vec<u8>, AdminError> {
        if from > to {
            return Err(AdminError::InvalidRange { from, to });
        }

        let mut url = self.endpoint(&["api", "orders", "statement"])?;
        url.query_pairs_mut()
            .append_pair("from", &from.format("%Y-%m-%d").to_string())
            .append_pair("to", &to.format("%Y-%m-%d").to_string());

        let pdf = self.get_bytes(url, "application/pdf").await?;
        info!(bytes = pdf.len(), "Statement downloaded");
        Ok(pdf)
    }
}
