//! Unit conversion and pricing.
//!
//! Weight products are priced per kilogram but customers may enter their
//! quantity in kilograms or grams. Everything here is pure arithmetic on
//! [`Decimal`]: quantities are rounded to three places after any conversion
//! and money to two places.
//!
//! A weight line carries `Option<Decimal>`: `None` is input still being typed
//! (an empty field) and prices as zero, `Some(0)` is a resolved zero.

use std::sync::LazyLock;

use regex::Regex;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

use crate::types::{Money, ProductUnit, round_quantity};

const GRAMS_PER_KG: Decimal = Decimal::from_parts(1000, 0, 0, false, 0);

/// Largest quantity accepted from input, in the unit it is entered in.
pub const MAX_QUANTITY: Decimal = Decimal::from_parts(999_999, 0, 0, false, 0);

/// Up to six digits, then at most one decimal point and three decimals.
static WEIGHT_INPUT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{0,6}(\.\d{0,3})?$").expect("Invalid regex"));

/// Up to six digits.
static PIECE_INPUT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{0,6}$").expect("Invalid regex"));

/// Errors raised at the quantity input boundary.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum QuantityError {
    /// A keystroke produced text the field does not accept.
    #[error("invalid quantity input: {0:?}")]
    InputRejected(String),
    /// The quantity is missing or not greater than zero.
    #[error("quantity must be greater than zero")]
    NonPositive,
    /// The quantity is above [`MAX_QUANTITY`].
    #[error("quantity {0} is above the largest accepted quantity")]
    TooLarge(Decimal),
}

/// Unit a weight line is currently entered in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum WeightUnit {
    #[default]
    #[serde(rename = "Kg", alias = "kg")]
    Kg,
    #[serde(rename = "grams", alias = "g")]
    Grams,
}

impl WeightUnit {
    /// Smallest quantity a committed line resolves to.
    #[must_use]
    pub const fn minimum(self) -> Decimal {
        match self {
            Self::Kg => Decimal::from_parts(1, 0, 0, false, 2),
            Self::Grams => Decimal::ONE,
        }
    }

    /// Increment used by the +/- controls.
    #[must_use]
    pub const fn step(self) -> Decimal {
        match self {
            Self::Kg => Decimal::ONE,
            Self::Grams => Decimal::ONE_HUNDRED,
        }
    }

    /// Wire and display label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Kg => "Kg",
            Self::Grams => "grams",
        }
    }
}

impl std::fmt::Display for WeightUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for WeightUnit {
    type Err = QuantityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "kg" | "kgs" | "kilogram" | "kilograms" => Ok(Self::Kg),
            "g" | "gm" | "gms" | "gram" | "grams" => Ok(Self::Grams),
            _ => Err(QuantityError::InputRejected(s.to_string())),
        }
    }
}

/// Quantity held by a cart or order line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LineQuantity {
    /// Whole pieces.
    Piece { count: u32 },
    /// A weight in `unit`; `None` while the field is empty.
    Weight {
        quantity: Option<Decimal>,
        unit: WeightUnit,
    },
}

impl LineQuantity {
    /// Build the quantity for a product from a canonical amount
    /// (pieces, or kilograms for weight products).
    ///
    /// Piece amounts are truncated towards zero; negative amounts become zero.
    #[must_use]
    pub fn for_unit(unit: ProductUnit, amount: Decimal) -> Self {
        match unit {
            ProductUnit::Piece => Self::Piece {
                count: decimal_to_count(amount),
            },
            ProductUnit::Kilogram => Self::Weight {
                quantity: Some(round_quantity(amount.max(Decimal::ZERO))),
                unit: WeightUnit::Kg,
            },
        }
    }

    /// Quantity in pieces or kilograms; pending input counts as zero.
    #[must_use]
    pub fn canonical(&self) -> Decimal {
        match *self {
            Self::Piece { count } => Decimal::from(count),
            Self::Weight { quantity, unit } => to_kilograms(quantity, unit),
        }
    }

    /// Whether the line is waiting on an empty input field.
    #[must_use]
    pub const fn is_pending(&self) -> bool {
        matches!(self, Self::Weight { quantity: None, .. })
    }

    /// Whether the quantity can be ordered.
    #[must_use]
    pub fn is_positive(&self) -> bool {
        self.canonical() > Decimal::ZERO
    }

    /// Unit label sent with order items.
    #[must_use]
    pub const fn unit_label(&self) -> &'static str {
        match self {
            Self::Piece { .. } => "piece",
            Self::Weight { unit, .. } => unit.as_str(),
        }
    }

    /// Quantity as entered, in the line's own unit.
    #[must_use]
    pub fn entered(&self) -> Decimal {
        match *self {
            Self::Piece { count } => Decimal::from(count),
            Self::Weight { quantity, .. } => quantity.unwrap_or(Decimal::ZERO),
        }
    }
}

impl std::fmt::Display for LineQuantity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Piece { count: 1 } => write!(f, "1 piece"),
            Self::Piece { count } => write!(f, "{count} pieces"),
            Self::Weight {
                quantity: None,
                unit,
            } => write!(f, "_ {unit}"),
            Self::Weight {
                quantity: Some(quantity),
                unit,
            } => write!(f, "{} {unit}", quantity.normalize()),
        }
    }
}

/// Convert an entered weight to kilograms.
///
/// Pending input converts to zero.
#[must_use]
pub fn to_kilograms(quantity: Option<Decimal>, unit: WeightUnit) -> Decimal {
    let Some(quantity) = quantity else {
        return Decimal::ZERO;
    };
    match unit {
        WeightUnit::Kg => round_quantity(quantity),
        WeightUnit::Grams => round_quantity(quantity / GRAMS_PER_KG),
    }
}

/// Re-express a line quantity when the customer switches its weight unit.
///
/// The rate is untouched; only the number in the field changes.
#[must_use]
pub fn switch_weight_unit(quantity: Decimal, from: WeightUnit, to: WeightUnit) -> Decimal {
    match (from, to) {
        (WeightUnit::Kg, WeightUnit::Grams) => round_quantity(quantity * GRAMS_PER_KG),
        (WeightUnit::Grams, WeightUnit::Kg) => round_quantity(quantity / GRAMS_PER_KG),
        _ => quantity,
    }
}

/// Price of one line: `rate × kilograms` or `rate × pieces`.
#[must_use]
pub fn line_total(rate: Money, quantity: &LineQuantity) -> Money {
    rate * quantity.canonical()
}

/// Sum of line totals. Pending lines contribute nothing.
#[must_use]
pub fn cart_total<'a, I>(lines: I) -> Money
where
    I: IntoIterator<Item = (Money, &'a LineQuantity)>,
{
    lines
        .into_iter()
        .map(|(rate, quantity)| line_total(rate, quantity))
        .sum()
}

/// Whether a weight field accepts `text` (digits, one point, ≤3 decimals).
#[must_use]
pub fn accepts_weight_input(text: &str) -> bool {
    WEIGHT_INPUT.is_match(text)
}

/// Whether a piece field accepts `text` (digits only).
#[must_use]
pub fn accepts_piece_input(text: &str) -> bool {
    PIECE_INPUT.is_match(text)
}

/// Parse what the customer typed into a weight field.
///
/// Returns `Ok(None)` for an empty field (pending input).
///
/// # Errors
///
/// Returns [`QuantityError::InputRejected`] when the text is not a number
/// with at most three decimals.
pub fn parse_weight_input(text: &str) -> Result<Option<Decimal>, QuantityError> {
    let text = text.trim();
    if !accepts_weight_input(text) {
        return Err(QuantityError::InputRejected(text.to_string()));
    }
    if text.is_empty() || text == "." {
        return Ok(None);
    }
    text.parse::<Decimal>()
        .map(Some)
        .map_err(|_| QuantityError::InputRejected(text.to_string()))
}

/// Parse what the customer typed into a piece field.
///
/// Returns `Ok(None)` for an empty field.
///
/// # Errors
///
/// Returns [`QuantityError::InputRejected`] for anything but digits,
/// decimals included.
pub fn parse_piece_input(text: &str) -> Result<Option<u32>, QuantityError> {
    let text = text.trim();
    if !accepts_piece_input(text) {
        return Err(QuantityError::InputRejected(text.to_string()));
    }
    if text.is_empty() {
        return Ok(None);
    }
    text.parse::<u32>()
        .map(Some)
        .map_err(|_| QuantityError::InputRejected(text.to_string()))
}

/// Resolve a weight field when it loses focus.
///
/// Empty or non-positive input becomes the unit minimum (1 gram or 0.01 kg).
#[must_use]
pub fn resolve_on_blur(quantity: Option<Decimal>, unit: WeightUnit) -> Decimal {
    match quantity {
        Some(quantity) if quantity > Decimal::ZERO => round_quantity(quantity),
        _ => unit.minimum(),
    }
}

/// Check an amount being added to a cart: pieces for piece products,
/// kilograms for weight products.
///
/// # Errors
///
/// Returns [`QuantityError::NonPositive`] for zero or negative amounts,
/// [`QuantityError::InputRejected`] for fractional pieces and
/// [`QuantityError::TooLarge`] above [`MAX_QUANTITY`].
pub fn check_amount(unit: ProductUnit, amount: Decimal) -> Result<Decimal, QuantityError> {
    if amount <= Decimal::ZERO {
        return Err(QuantityError::NonPositive);
    }
    if amount > MAX_QUANTITY {
        return Err(QuantityError::TooLarge(amount));
    }
    if unit == ProductUnit::Piece && !amount.fract().is_zero() {
        return Err(QuantityError::InputRejected(amount.to_string()));
    }
    Ok(amount)
}

/// Whole pieces in `amount`, truncated and clamped at zero.
pub(crate) fn decimal_to_count(amount: Decimal) -> u32 {
    amount.trunc().max(Decimal::ZERO).to_u32().unwrap_or(u32::MAX)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_to_kilograms() {
        assert_eq!(to_kilograms(Some(dec!(250)), WeightUnit::Grams), dec!(0.25));
        assert_eq!(to_kilograms(Some(dec!(1000)), WeightUnit::Grams), dec!(1));
        assert_eq!(to_kilograms(Some(dec!(1.5)), WeightUnit::Kg), dec!(1.5));
        assert_eq!(to_kilograms(None, WeightUnit::Kg), Decimal::ZERO);
    }

    #[test]
    fn test_line_total_grams() {
        let quantity = LineQuantity::Weight {
            quantity: Some(dec!(250)),
            unit: WeightUnit::Grams,
        };
        let total = line_total(Money::from_rupees(800), &quantity);
        assert_eq!(total.amount(), dec!(200.00));
        assert_eq!(total.to_string(), "₹200.00");
    }

    #[test]
    fn test_line_total_pieces() {
        let quantity = LineQuantity::Piece { count: 3 };
        assert_eq!(
            line_total(Money::new(dec!(12.50)), &quantity),
            Money::new(dec!(37.50))
        );
    }

    #[test]
    fn test_pending_line_totals_zero() {
        let pending = LineQuantity::Weight {
            quantity: None,
            unit: WeightUnit::Kg,
        };
        assert_eq!(
            cart_total([(Money::from_rupees(500), &pending)]),
            Money::ZERO
        );
    }

    #[test]
    fn test_empty_cart_total() {
        assert_eq!(cart_total(std::iter::empty()), Money::ZERO);
    }

    #[test]
    fn test_switch_weight_unit_round_trip() {
        for kg in [dec!(0.01), dec!(0.25), dec!(1), dec!(2.375), dec!(12.5)] {
            let grams = switch_weight_unit(kg, WeightUnit::Kg, WeightUnit::Grams);
            let back = switch_weight_unit(grams, WeightUnit::Grams, WeightUnit::Kg);
            assert!((back - kg).abs() <= dec!(0.001), "{kg} -> {grams} -> {back}");
        }
    }

    #[test]
    fn test_switch_weight_unit_values() {
        assert_eq!(
            switch_weight_unit(dec!(1.5), WeightUnit::Kg, WeightUnit::Grams),
            dec!(1500)
        );
        assert_eq!(
            switch_weight_unit(dec!(750), WeightUnit::Grams, WeightUnit::Kg),
            dec!(0.75)
        );
        assert_eq!(
            switch_weight_unit(dec!(3), WeightUnit::Kg, WeightUnit::Kg),
            dec!(3)
        );
    }

    #[test]
    fn test_weight_input_boundary() {
        assert!(accepts_weight_input(""));
        assert!(accepts_weight_input("1."));
        assert!(accepts_weight_input("0.125"));
        assert!(!accepts_weight_input("0.1255"));
        assert!(!accepts_weight_input("1a"));
        assert!(!accepts_weight_input("1.2.3"));
        assert!(!accepts_weight_input("-1"));
        assert!(accepts_weight_input("999999.999"));
        assert!(!accepts_weight_input("1000000"));
        assert!(!accepts_weight_input("9999999999999999999999999999"));
    }

    #[test]
    fn test_oversized_input_rejected_before_pricing() {
        assert!(parse_weight_input("9999999999999999999999999999").is_err());
        assert!(parse_piece_input("9999999999").is_err());

        // The largest accepted weight still prices and converts.
        let largest = parse_weight_input("999999.999").unwrap().unwrap();
        let grams = switch_weight_unit(largest, WeightUnit::Kg, WeightUnit::Grams);
        assert_eq!(grams, dec!(999999999));
        let quantity = LineQuantity::Weight {
            quantity: Some(grams),
            unit: WeightUnit::Grams,
        };
        assert_eq!(
            line_total(Money::from_rupees(5_000), &quantity),
            Money::new(dec!(4999999995))
        );
    }

    #[test]
    fn test_check_amount() {
        assert_eq!(check_amount(ProductUnit::Piece, dec!(3)), Ok(dec!(3)));
        assert_eq!(check_amount(ProductUnit::Kilogram, dec!(0.25)), Ok(dec!(0.25)));
        assert_eq!(
            check_amount(ProductUnit::Piece, Decimal::ZERO),
            Err(QuantityError::NonPositive)
        );
        assert_eq!(
            check_amount(ProductUnit::Kilogram, dec!(-1)),
            Err(QuantityError::NonPositive)
        );
        assert_eq!(
            check_amount(ProductUnit::Piece, dec!(2.9)),
            Err(QuantityError::InputRejected("2.9".to_string()))
        );
        assert_eq!(
            check_amount(ProductUnit::Kilogram, dec!(1000000)),
            Err(QuantityError::TooLarge(dec!(1000000)))
        );
    }

    #[test]
    fn test_piece_input_rejects_decimals() {
        assert!(accepts_piece_input("12"));
        assert!(!accepts_piece_input("1.5"));
        assert_eq!(
            parse_piece_input("2.0"),
            Err(QuantityError::InputRejected("2.0".to_string()))
        );
        assert_eq!(parse_piece_input(""), Ok(None));
        assert_eq!(parse_piece_input("4"), Ok(Some(4)));
    }

    #[test]
    fn test_parse_weight_input() {
        assert_eq!(parse_weight_input(""), Ok(None));
        assert_eq!(parse_weight_input("."), Ok(None));
        assert_eq!(parse_weight_input("0.5"), Ok(Some(dec!(0.5))));
        assert!(parse_weight_input("abc").is_err());
    }

    #[test]
    fn test_resolve_on_blur() {
        assert_eq!(resolve_on_blur(None, WeightUnit::Grams), dec!(1));
        assert_eq!(resolve_on_blur(None, WeightUnit::Kg), dec!(0.01));
        assert_eq!(resolve_on_blur(Some(dec!(0)), WeightUnit::Kg), dec!(0.01));
        assert_eq!(resolve_on_blur(Some(dec!(2.5)), WeightUnit::Kg), dec!(2.5));
    }

    #[test]
    fn test_for_unit() {
        assert_eq!(
            LineQuantity::for_unit(ProductUnit::Piece, dec!(2.9)),
            LineQuantity::Piece { count: 2 }
        );
        assert_eq!(
            LineQuantity::for_unit(ProductUnit::Kilogram, dec!(0.5)),
            LineQuantity::Weight {
                quantity: Some(dec!(0.5)),
                unit: WeightUnit::Kg
            }
        );
    }

    #[test]
    fn test_display() {
        assert_eq!(LineQuantity::Piece { count: 1 }.to_string(), "1 piece");
        assert_eq!(
            LineQuantity::Weight {
                quantity: Some(dec!(250.000)),
                unit: WeightUnit::Grams
            }
            .to_string(),
            "250 grams"
        );
    }

    #[test]
    fn test_line_quantity_serde() {
        let quantity = LineQuantity::Weight {
            quantity: None,
            unit: WeightUnit::Grams,
        };
        let json = serde_json::to_value(quantity).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"kind": "weight", "quantity": null, "unit": "grams"})
        );
        let back: LineQuantity = serde_json::from_value(json).unwrap();
        assert_eq!(back, quantity);
    }
}
