//! Cart model shared by the storefront cart, the quick-order form, the admin
//! manual-order composer and the admin order editor.
//!
//! Lines are kept in insertion order and addressed by index, the same way the
//! screens list them. Totals are recomputed from the lines on every read, so
//! there is no cached total to drift.
//!
//! Zero-quantity policy: a piece line driven to zero is removed; a weight
//! line may rest at zero (or pending) while the customer edits it, but
//! [`Cart::validate_for_checkout`] refuses to turn such a line into an order.

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

use crate::pricing::{
    self, LineQuantity, MAX_QUANTITY, QuantityError, WeightUnit, check_amount,
    parse_piece_input, parse_weight_input, resolve_on_blur, switch_weight_unit,
};
use crate::types::{Money, Product, ProductId, round_quantity};

/// Errors raised by cart mutations.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CartError {
    /// No line at the given index.
    #[error("no cart line at position {0}")]
    LineNotFound(usize),
    /// A weight-only operation was applied to a piece line.
    #[error("line {0} is sold by the piece and has no weight unit")]
    NotWeightLine(usize),
    /// The quantity input was rejected.
    #[error(transparent)]
    Quantity(#[from] QuantityError),
    /// Checkout attempted with nothing in the cart.
    #[error("cart is empty")]
    Empty,
    /// Checkout attempted with a zero or unfinished line.
    #[error("quantity for {name} must be greater than zero")]
    NonPositiveLine {
        /// Product name of the offending line.
        name: String,
    },
}

/// Price already charged for a line of an existing order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
struct RecordedPrice {
    price: Money,
    /// Pieces or kilograms the price was charged for.
    canonical: Decimal,
}

impl RecordedPrice {
    fn price_for(self, canonical: Decimal) -> Option<Money> {
        if canonical == self.canonical {
            return Some(self.price);
        }
        self.price
            .amount()
            .checked_mul(canonical)?
            .checked_div(self.canonical)
            .map(Money::new)
    }
}

/// One product in the cart with its quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub product: Product,
    pub quantity: LineQuantity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    recorded: Option<RecordedPrice>,
}

impl CartLine {
    /// Create a line for `product` with a canonical starting amount
    /// (pieces, or kilograms for weight products).
    #[must_use]
    pub fn new(product: Product, amount: Decimal) -> Self {
        let quantity = LineQuantity::for_unit(product.unit, amount);
        Self {
            product,
            quantity,
            recorded: None,
        }
    }

    /// A line of an existing order that keeps the price it was sold at.
    ///
    /// While the quantity is unchanged (a unit switch included) the line
    /// totals exactly `price`; a changed quantity is priced in proportion.
    #[must_use]
    pub fn with_recorded_price(product: Product, quantity: LineQuantity, price: Money) -> Self {
        let canonical = quantity.canonical();
        let recorded = (!canonical.is_zero()).then_some(RecordedPrice { price, canonical });
        Self {
            product,
            quantity,
            recorded,
        }
    }

    /// Price of the line.
    #[must_use]
    pub fn total(&self) -> Money {
        self.recorded
            .and_then(|recorded| recorded.price_for(self.quantity.canonical()))
            .unwrap_or_else(|| pricing::line_total(self.product.rate, &self.quantity))
    }

    /// Whether the product is sold by weight.
    #[must_use]
    pub const fn is_weight(&self) -> bool {
        matches!(self.quantity, LineQuantity::Weight { .. })
    }

    fn add_amount(&mut self, amount: Decimal) {
        self.quantity = match self.quantity {
            LineQuantity::Piece { count } => LineQuantity::Piece {
                count: count.saturating_add(pricing::decimal_to_count(amount)),
            },
            LineQuantity::Weight { quantity, unit } => {
                // `amount` is in kilograms; express it in the line's unit first.
                let extra = switch_weight_unit(amount, WeightUnit::Kg, unit);
                LineQuantity::Weight {
                    quantity: Some(round_quantity(
                        quantity.unwrap_or(Decimal::ZERO) + extra,
                    )),
                    unit,
                }
            }
        };
    }
}

/// An ordered collection of cart lines.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    /// Create an empty cart.
    #[must_use]
    pub const fn new() -> Self {
        Self { lines: Vec::new() }
    }

    /// Build a cart from existing lines, e.g. a persisted snapshot.
    #[must_use]
    pub const fn from_lines(lines: Vec<CartLine>) -> Self {
        Self { lines }
    }

    /// Lines in display order.
    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    /// Line at `index`.
    #[must_use]
    pub fn line(&self, index: usize) -> Option<&CartLine> {
        self.lines.get(index)
    }

    /// Number of lines.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Position of the line holding `product_id`.
    #[must_use]
    pub fn position(&self, product_id: &ProductId) -> Option<usize> {
        self.lines
            .iter()
            .position(|line| &line.product.id == product_id)
    }

    /// Add a product, merging into an existing line for the same product.
    ///
    /// `amount` is canonical: pieces for piece products, kilograms for weight
    /// products. New weight lines start in kilograms; merging into a line
    /// held in grams converts the amount first. Returns the index of the
    /// affected line.
    ///
    /// # Errors
    ///
    /// Returns a [`QuantityError`] for zero, negative, oversized or
    /// fractional piece amounts. The cart is left unchanged.
    pub fn add(&mut self, product: Product, amount: Decimal) -> Result<usize, CartError> {
        let amount = check_amount(product.unit, amount)?;
        if let Some(index) = self.position(&product.id)
            && let Some(line) = self.lines.get_mut(index)
        {
            line.add_amount(amount);
            return Ok(index);
        }
        self.lines.push(CartLine::new(product, amount));
        Ok(self.lines.len() - 1)
    }

    /// Set a line's quantity, in the line's own unit.
    ///
    /// A piece line set to zero or below is removed. A weight line may be set
    /// to zero and stays in the cart.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::LineNotFound`] for a bad index, and
    /// [`QuantityError`] for fractional piece counts, negative weights or
    /// quantities above [`MAX_QUANTITY`].
    pub fn update_quantity(&mut self, index: usize, quantity: Decimal) -> Result<(), CartError> {
        let line = self
            .lines
            .get_mut(index)
            .ok_or(CartError::LineNotFound(index))?;
        if quantity > MAX_QUANTITY {
            return Err(QuantityError::TooLarge(quantity).into());
        }

        match &mut line.quantity {
            LineQuantity::Piece { .. } if quantity <= Decimal::ZERO => {}
            LineQuantity::Piece { count } => {
                if !quantity.fract().is_zero() {
                    return Err(QuantityError::InputRejected(quantity.to_string()).into());
                }
                *count = quantity
                    .to_u32()
                    .ok_or_else(|| QuantityError::InputRejected(quantity.to_string()))?;
                return Ok(());
            }
            LineQuantity::Weight { .. } if quantity < Decimal::ZERO => {
                return Err(QuantityError::NonPositive.into());
            }
            LineQuantity::Weight {
                quantity: current, ..
            } => {
                *current = Some(round_quantity(quantity));
                return Ok(());
            }
        }

        // Only a piece line driven to zero or below reaches this point.
        self.lines.remove(index);
        Ok(())
    }

    /// Switch a weight line between kilograms and grams, converting the
    /// entered quantity.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::NotWeightLine`] for piece lines.
    pub fn update_weight_unit(&mut self, index: usize, new_unit: WeightUnit) -> Result<(), CartError> {
        let line = self
            .lines
            .get_mut(index)
            .ok_or(CartError::LineNotFound(index))?;

        let LineQuantity::Weight { quantity, unit } = &mut line.quantity else {
            return Err(CartError::NotWeightLine(index));
        };
        *quantity = quantity.map(|q| switch_weight_unit(q, *unit, new_unit));
        *unit = new_unit;
        Ok(())
    }

    /// The `+` control: one piece, or one step (1 kg / 100 g).
    ///
    /// # Errors
    ///
    /// Returns [`CartError::LineNotFound`] for a bad index.
    pub fn increment(&mut self, index: usize) -> Result<(), CartError> {
        let line = self
            .lines
            .get_mut(index)
            .ok_or(CartError::LineNotFound(index))?;

        match &mut line.quantity {
            LineQuantity::Piece { count } => *count = count.saturating_add(1),
            LineQuantity::Weight { quantity, unit } => {
                *quantity = Some(round_quantity(
                    quantity.unwrap_or(Decimal::ZERO) + unit.step(),
                ));
            }
        }
        Ok(())
    }

    /// The `-` control.
    ///
    /// Never removes a line: pieces stop at 1, weights stop at the unit
    /// minimum.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::LineNotFound`] for a bad index.
    pub fn decrement(&mut self, index: usize) -> Result<(), CartError> {
        let line = self
            .lines
            .get_mut(index)
            .ok_or(CartError::LineNotFound(index))?;

        match &mut line.quantity {
            LineQuantity::Piece { count } => *count = count.saturating_sub(1).max(1),
            LineQuantity::Weight { quantity, unit } => {
                let lowered = quantity.unwrap_or(Decimal::ZERO) - unit.step();
                *quantity = Some(round_quantity(lowered.max(unit.minimum())));
            }
        }
        Ok(())
    }

    /// Apply what the customer typed into a line's quantity field.
    ///
    /// Weight fields accept up to three decimals and may be left empty
    /// (pending). Piece fields accept digits only; an empty piece field is
    /// ignored, and zero removes the line.
    ///
    /// # Errors
    ///
    /// Returns [`QuantityError::InputRejected`] and leaves the line untouched
    /// when the text is not acceptable.
    pub fn set_input(&mut self, index: usize, text: &str) -> Result<(), CartError> {
        let line = self
            .lines
            .get_mut(index)
            .ok_or(CartError::LineNotFound(index))?;

        let count = match &mut line.quantity {
            LineQuantity::Piece { .. } => parse_piece_input(text)?,
            LineQuantity::Weight { quantity, .. } => {
                *quantity = parse_weight_input(text)?;
                return Ok(());
            }
        };

        match count {
            None => Ok(()),
            Some(count) => self.update_quantity(index, Decimal::from(count)),
        }
    }

    /// Resolve a weight field when it loses focus: empty or non-positive
    /// input becomes the unit minimum. Piece lines are unaffected.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::LineNotFound`] for a bad index.
    pub fn commit_input(&mut self, index: usize) -> Result<(), CartError> {
        let line = self
            .lines
            .get_mut(index)
            .ok_or(CartError::LineNotFound(index))?;

        if let LineQuantity::Weight { quantity, unit } = &mut line.quantity {
            *quantity = Some(resolve_on_blur(*quantity, *unit));
        }
        Ok(())
    }

    /// Remove a line unconditionally.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::LineNotFound`] for a bad index.
    pub fn remove(&mut self, index: usize) -> Result<CartLine, CartError> {
        if index >= self.lines.len() {
            return Err(CartError::LineNotFound(index));
        }
        Ok(self.lines.remove(index))
    }

    /// Empty the cart.
    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// Sum of all line totals.
    #[must_use]
    pub fn total(&self) -> Money {
        self.lines.iter().map(CartLine::total).sum()
    }

    /// Badge count: pieces count individually, each weight line counts once.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.lines
            .iter()
            .map(|line| match line.quantity {
                LineQuantity::Piece { count } => count,
                LineQuantity::Weight { .. } => 1,
            })
            .fold(0, u32::saturating_add)
    }

    /// Check that the cart can become an order.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::Empty`] for an empty cart and
    /// [`CartError::NonPositiveLine`] for the first zero or pending line.
    pub fn validate_for_checkout(&self) -> Result<(), CartError> {
        if self.lines.is_empty() {
            return Err(CartError::Empty);
        }
        if let Some(line) = self.lines.iter().find(|line| !line.quantity.is_positive()) {
            return Err(CartError::NonPositiveLine {
                name: line.product.name.clone(),
            });
        }
        Ok(())
    }
}
