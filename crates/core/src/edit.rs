//! Admin-side changes to an existing order.
//!
//! [`OrderEditor`] collects a delivery-date change, a payment top-up and an
//! item rework into one [`OrderEdit`] body. Nothing here touches the ledger;
//! the caller sends the body and patches the ledger with the server's reply.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::cart::{Cart, CartError, CartLine};
use crate::ledger::Order;
use crate::order::{ItemUnit, OrderItem};
use crate::types::date::iso_day_opt;
use crate::types::{Money, OrderStatus, Product, ProductId, ProductUnit, StatusError};

/// Errors raised while preparing an order edit.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum EditError {
    #[error("payment must be greater than zero")]
    NonPositivePayment,
    #[error("payment of {payment} would take the advance to {would_be}, above the order total {total}")]
    ExceedsTotal {
        payment: Money,
        would_be: Money,
        total: Money,
    },
    #[error("advance paid {advance} is above the new order total {total}")]
    AdvanceAboveTotal { advance: Money, total: Money },
    #[error("order {0} is {1} and can no longer be edited")]
    Locked(String, OrderStatus),
    #[error("no changes to save")]
    NothingToSave,
    #[error(transparent)]
    Cart(#[from] CartError),
    #[error(transparent)]
    Status(#[from] StatusError),
}

/// Body of `PUT /api/orders/{id}`. Only changed fields are sent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderEdit {
    #[serde(
        default,
        with = "iso_day_opt",
        skip_serializing_if = "Option::is_none"
    )]
    pub delivery_date: Option<NaiveDate>,
    /// New absolute advance after any top-up.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub advance_paid: Option<Money>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Vec<OrderItem>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<Money>,
}

impl OrderEdit {
    /// Whether the edit changes nothing.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.delivery_date.is_none()
            && self.advance_paid.is_none()
            && self.items.is_none()
            && self.total.is_none()
    }
}

/// Body of `PATCH /api/orders/{id}/status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusUpdate {
    pub status: OrderStatus,
}

impl StatusUpdate {
    /// Validate a status change for `order`.
    ///
    /// # Errors
    ///
    /// Returns [`StatusError`] when the lifecycle does not allow the move.
    pub fn for_order(order: &Order, next: OrderStatus) -> Result<Self, StatusError> {
        let status = order.check_transition(next)?;
        Ok(Self { status })
    }
}

/// Working copy of an order being edited from the ledger.
#[derive(Debug, Clone)]
pub struct OrderEditor {
    original: Order,
    delivery_date: Option<NaiveDate>,
    advance_paid: Money,
    items: Option<Cart>,
}

impl OrderEditor {
    /// Start editing `order`.
    ///
    /// # Errors
    ///
    /// Returns [`EditError::Locked`] for cancelled orders.
    pub fn new(order: Order) -> Result<Self, EditError> {
        if order.status == OrderStatus::Cancelled {
            return Err(EditError::Locked(order.id.to_string(), order.status));
        }
        Ok(Self {
            delivery_date: order.delivery_date,
            advance_paid: order.advance_paid,
            items: None,
            original: order,
        })
    }

    /// The order as it was fetched.
    #[must_use]
    pub const fn original(&self) -> &Order {
        &self.original
    }

    /// Change the delivery date.
    pub const fn set_delivery_date(&mut self, date: NaiveDate) {
        self.delivery_date = Some(date);
    }

    /// Advance after any top-ups so far.
    #[must_use]
    pub const fn advance_paid(&self) -> Money {
        self.advance_paid
    }

    /// Order total, recomputed from the edited items when they changed.
    #[must_use]
    pub fn total(&self) -> Money {
        self.items
            .as_ref()
            .map_or(self.original.total, Cart::total)
    }

    /// Amount still owed after the edit.
    #[must_use]
    pub fn balance(&self) -> Money {
        self.total() - self.advance_paid
    }

    /// Record a further payment on top of the advance.
    ///
    /// The advance is left unchanged when the payment is rejected.
    ///
    /// # Errors
    ///
    /// Returns [`EditError::NonPositivePayment`] for zero or negative
    /// payments and [`EditError::ExceedsTotal`] when the advance would go
    /// above the total.
    pub fn apply_top_up(&mut self, payment: Money) -> Result<Money, EditError> {
        if !payment.is_positive() {
            return Err(EditError::NonPositivePayment);
        }
        let would_be = self.advance_paid + payment;
        let total = self.total();
        if would_be > total {
            return Err(EditError::ExceedsTotal {
                payment,
                would_be,
                total,
            });
        }
        self.advance_paid = would_be;
        Ok(would_be)
    }

    /// Item list as an editable cart, built from the order on first use.
    ///
    /// Each item is matched by name against `catalog` so that adding the same
    /// catalog product merges into its line. Lines keep the price recorded on
    /// the order, not today's catalog rate; a resized line is priced in
    /// proportion to it.
    pub fn items_mut(&mut self, catalog: &[Product]) -> &mut Cart {
        let original = &self.original;
        self.items
            .get_or_insert_with(|| rebuild_cart(&original.items, catalog))
    }

    /// Edited items, if the item list was opened.
    #[must_use]
    pub const fn items(&self) -> Option<&Cart> {
        self.items.as_ref()
    }

    /// Build the request body holding every changed field.
    ///
    /// # Errors
    ///
    /// Returns [`EditError::NothingToSave`] when nothing changed, a
    /// [`CartError`] when the edited items cannot form an order, and
    /// [`EditError::AdvanceAboveTotal`] when shrinking the items would leave
    /// the advance above the new total.
    pub fn build(&self) -> Result<OrderEdit, EditError> {
        let mut edit = OrderEdit::default();

        if self.delivery_date != self.original.delivery_date {
            edit.delivery_date = self.delivery_date;
        }
        if self.advance_paid != self.original.advance_paid {
            edit.advance_paid = Some(self.advance_paid);
        }
        if let Some(cart) = &self.items {
            cart.validate_for_checkout()?;
            let items: Vec<OrderItem> = cart.lines().iter().map(OrderItem::from).collect();
            if items != self.original.items {
                let total = cart.total();
                if self.advance_paid > total {
                    return Err(EditError::AdvanceAboveTotal {
                        advance: self.advance_paid,
                        total,
                    });
                }
                edit.items = Some(items);
                edit.total = Some(total);
            }
        }

        if edit.is_empty() {
            return Err(EditError::NothingToSave);
        }
        Ok(edit)
    }
}

fn rebuild_cart(items: &[OrderItem], catalog: &[Product]) -> Cart {
    let lines = items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            let unit = match item.unit {
                ItemUnit::Piece => ProductUnit::Piece,
                ItemUnit::Kg | ItemUnit::Grams => ProductUnit::Kilogram,
            };
            let known = catalog
                .iter()
                .find(|p| p.unit == unit && p.name.eq_ignore_ascii_case(&item.sweet_name));
            let mut product = known.cloned().unwrap_or_else(|| Product {
                id: ProductId::new(format!("order-item-{index}")),
                name: item.sweet_name.clone(),
                category: String::new(),
                rate: Money::ZERO,
                unit,
                image: None,
                is_festival: None,
                stock: None,
            });
            if let Some(rate) = item.implied_rate() {
                product.rate = rate;
            }
            CartLine::with_recorded_price(product, item.line_quantity(), item.price)
        })
        .collect();
    Cart::from_lines(lines)
}
