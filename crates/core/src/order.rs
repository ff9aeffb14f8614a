//! Order payloads and the customer-details form.
//!
//! An [`OrderPayload`] is derived from a [`Cart`] and an [`OrderForm`] at
//! submit time and is never changed afterwards; the server owns the order
//! from then on.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::cart::{Cart, CartError, CartLine};
use crate::pricing::{LineQuantity, WeightUnit, to_kilograms};
use crate::types::date::iso_day;
use crate::types::{MobileError, MobileNumber, Money, OrderStatus, ProductUnit, round_quantity};

/// Errors raised while validating an order before it is sent.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum OrderError {
    #[error("customer name is required")]
    MissingName,
    #[error(transparent)]
    Mobile(#[from] MobileError),
    #[error("delivery address is required")]
    MissingAddress,
    #[error("delivery date is required")]
    MissingDeliveryDate,
    #[error("delivery date {delivery} is before {today}")]
    DeliveryBeforeToday {
        /// Requested delivery date.
        delivery: NaiveDate,
        /// Current date according to the server.
        today: NaiveDate,
    },
    #[error(transparent)]
    Cart(#[from] CartError),
}

/// Unit recorded on an order item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ItemUnit {
    #[serde(rename = "piece", alias = "pieces", alias = "Piece")]
    Piece,
    #[serde(rename = "Kg", alias = "kg", alias = "KG")]
    Kg,
    #[serde(rename = "grams", alias = "gram", alias = "g")]
    Grams,
}

impl ItemUnit {
    /// Wire and display label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Piece => "piece",
            Self::Kg => "Kg",
            Self::Grams => "grams",
        }
    }
}

impl From<&LineQuantity> for ItemUnit {
    fn from(quantity: &LineQuantity) -> Self {
        match quantity {
            LineQuantity::Piece { .. } => Self::Piece,
            LineQuantity::Weight {
                unit: WeightUnit::Kg,
                ..
            } => Self::Kg,
            LineQuantity::Weight {
                unit: WeightUnit::Grams,
                ..
            } => Self::Grams,
        }
    }
}

impl std::fmt::Display for ItemUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One line of a submitted order.
///
/// `quantity` is in `unit` as the customer entered it; `price` is the line
/// total, not the rate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub sweet_name: String,
    pub quantity: Decimal,
    pub price: Money,
    pub unit: ItemUnit,
}

impl OrderItem {
    /// Line quantity expressed as a [`LineQuantity`].
    #[must_use]
    pub fn line_quantity(&self) -> LineQuantity {
        match self.unit {
            ItemUnit::Piece => LineQuantity::for_unit(ProductUnit::Piece, self.quantity),
            ItemUnit::Kg => LineQuantity::Weight {
                quantity: Some(self.quantity),
                unit: WeightUnit::Kg,
            },
            ItemUnit::Grams => LineQuantity::Weight {
                quantity: Some(self.quantity),
                unit: WeightUnit::Grams,
            },
        }
    }

    /// Quantity in pieces or kilograms.
    #[must_use]
    pub fn canonical_quantity(&self) -> Decimal {
        match self.unit {
            ItemUnit::Piece => self.quantity,
            ItemUnit::Kg => to_kilograms(Some(self.quantity), WeightUnit::Kg),
            ItemUnit::Grams => to_kilograms(Some(self.quantity), WeightUnit::Grams),
        }
    }

    /// Rate implied by the recorded price, if the quantity is non-zero.
    #[must_use]
    pub fn implied_rate(&self) -> Option<Money> {
        let quantity = self.canonical_quantity();
        if quantity.is_zero() {
            return None;
        }
        Some(Money::new(self.price.amount() / quantity))
    }
}

impl From<&CartLine> for OrderItem {
    fn from(line: &CartLine) -> Self {
        Self {
            sweet_name: line.product.name.clone(),
            quantity: round_quantity(line.quantity.entered()),
            price: line.total(),
            unit: ItemUnit::from(&line.quantity),
        }
    }
}

/// Customer details as typed into the order form.
///
/// The mobile field is sanitized on every keystroke, not only at submit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderForm {
    pub customer_name: String,
    mobile: String,
    pub address: String,
    pub preference: String,
    delivery_date: Option<NaiveDate>,
}

impl OrderForm {
    /// Create an empty form.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store mobile input, keeping only the first ten digits.
    pub fn set_mobile(&mut self, input: &str) {
        self.mobile = MobileNumber::sanitize(input);
    }

    /// The sanitized mobile field.
    #[must_use]
    pub fn mobile(&self) -> &str {
        &self.mobile
    }

    /// Earliest delivery date the date picker offers.
    #[must_use]
    pub const fn earliest_delivery(server_today: NaiveDate) -> NaiveDate {
        server_today
    }

    /// Pick a delivery date. Dates before the server's today are refused and
    /// leave the previous choice in place.
    ///
    /// # Errors
    ///
    /// Returns [`OrderError::DeliveryBeforeToday`] for past dates.
    pub fn set_delivery_date(
        &mut self,
        date: NaiveDate,
        server_today: NaiveDate,
    ) -> Result<(), OrderError> {
        check_delivery_date(date, server_today)?;
        self.delivery_date = Some(date);
        Ok(())
    }

    /// The chosen delivery date.
    #[must_use]
    pub const fn delivery_date(&self) -> Option<NaiveDate> {
        self.delivery_date
    }

    /// Validate every field against the server's today.
    ///
    /// # Errors
    ///
    /// Returns the first failing field.
    pub fn validate(&self, server_today: NaiveDate) -> Result<ValidatedCustomer, OrderError> {
        let customer_name = self.customer_name.trim();
        if customer_name.is_empty() {
            return Err(OrderError::MissingName);
        }
        let mobile = MobileNumber::parse(&self.mobile)?;
        let address = self.address.trim();
        if address.is_empty() {
            return Err(OrderError::MissingAddress);
        }
        let delivery_date = self.delivery_date.ok_or(OrderError::MissingDeliveryDate)?;
        check_delivery_date(delivery_date, server_today)?;

        Ok(ValidatedCustomer {
            customer_name: customer_name.to_string(),
            mobile,
            address: address.to_string(),
            preference: self.preference.trim().to_string(),
            delivery_date,
        })
    }
}

fn check_delivery_date(date: NaiveDate, server_today: NaiveDate) -> Result<(), OrderError> {
    if date < server_today {
        return Err(OrderError::DeliveryBeforeToday {
            delivery: date,
            today: server_today,
        });
    }
    Ok(())
}

/// Customer details that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedCustomer {
    pub customer_name: String,
    pub mobile: MobileNumber,
    pub address: String,
    pub preference: String,
    pub delivery_date: NaiveDate,
}

/// Body of `POST /api/orders`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderPayload {
    pub customer_name: String,
    pub mobile: MobileNumber,
    pub address: String,
    pub preference: String,
    /// Staff member who keyed the order in, `None` for storefront orders.
    pub placed_by_admin: Option<String>,
    #[serde(with = "iso_day")]
    pub order_date: NaiveDate,
    #[serde(with = "iso_day")]
    pub delivery_date: NaiveDate,
    pub items: Vec<OrderItem>,
    pub total: Money,
    pub status: OrderStatus,
}

impl OrderPayload {
    /// Build the payload for a cart and form.
    ///
    /// `server_today` must come from the server clock; it becomes the order
    /// date and the lower bound for the delivery date.
    ///
    /// # Errors
    ///
    /// Returns [`OrderError`] for any invalid field or an empty cart or a cart
    /// holding a zero/pending line.
    pub fn build(
        cart: &Cart,
        form: &OrderForm,
        server_today: NaiveDate,
        placed_by_admin: Option<&str>,
    ) -> Result<Self, OrderError> {
        let customer = form.validate(server_today)?;
        cart.validate_for_checkout()?;

        Ok(Self {
            customer_name: customer.customer_name,
            mobile: customer.mobile,
            address: customer.address,
            preference: customer.preference,
            placed_by_admin: placed_by_admin
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .map(str::to_string),
            order_date: server_today,
            delivery_date: customer.delivery_date,
            items: cart.lines().iter().map(OrderItem::from).collect(),
            total: cart.total(),
            status: OrderStatus::Pending,
        })
    }
}
