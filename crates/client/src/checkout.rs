//! Turning a cart into a placed order.
//!
//! Order of checks: the cart must be non-empty with positive lines, then the
//! server date is fetched, then the form is validated against it. The cart
//! is cleared only once the API confirms the order.

use sweetshop_core::{Cart, OrderError, OrderForm, OrderPayload};
use thiserror::Error;
use tracing::{info, instrument};

use crate::api::{ApiClient, PlacedOrder};
use crate::error::ApiError;
use crate::session::{Session, SessionError, SessionHandle, SessionStore};

/// Errors from submitting an order.
#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error(transparent)]
    Order(#[from] OrderError),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Session(#[from] SessionError),
}

/// Place the session's cart as an order and empty the cart on success.
///
/// # Errors
///
/// Returns [`CheckoutError::Order`] for an empty cart or invalid form,
/// [`CheckoutError::Api`] if the server rejects the order, and
/// [`CheckoutError::Session`] if the emptied cart cannot be saved. The cart
/// is left untouched on every error except the last.
#[instrument(skip_all, fields(lines = session.cart().len()))]
pub async fn checkout<S: SessionStore>(
    client: &ApiClient,
    session: &mut SessionHandle<S>,
    form: &OrderForm,
) -> Result<PlacedOrder, CheckoutError> {
    let placed = submit(client, session.cart(), form, None).await?;
    session.clear_cart()?;
    info!(order_id = ?placed.id, "Checkout complete, cart cleared");
    Ok(placed)
}

/// Place an order on a customer's behalf from the admin console.
///
/// The order is tagged with the logged-in admin's name. The cart belongs to
/// the caller and is not cleared.
///
/// # Errors
///
/// Returns [`CheckoutError::Session`] if no admin is logged in, otherwise the
/// same errors as [`checkout`].
#[instrument(skip_all, fields(lines = cart.len()))]
pub async fn place_manual_order(
    client: &ApiClient,
    session: &Session,
    cart: &Cart,
    form: &OrderForm,
) -> Result<PlacedOrder, CheckoutError> {
    let admin = session.require_admin()?;
    submit(client, cart, form, Some(admin)).await
}

async fn submit(
    client: &ApiClient,
    cart: &Cart,
    form: &OrderForm,
    placed_by_admin: Option<&str>,
) -> Result<PlacedOrder, CheckoutError> {
    cart.validate_for_checkout().map_err(OrderError::from)?;

    let today = client.server_date().await?;
    let payload = OrderPayload::build(cart, form, today, placed_by_admin)?;
    Ok(client.place_order(&payload).await?)
}
