//! Catalog product types.

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::id::ProductId;
use super::money::Money;

/// How a product is sold.
///
/// The catalog spells weight units inconsistently (`"kg"`, `"Kg"`, `"KG"`),
/// so parsing is case-insensitive. It always serializes back as `"kg"` or
/// `"piece"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ProductUnit {
    /// Counted items (a box of laddoos, one cake).
    #[default]
    Piece,
    /// Sold by weight and priced per kilogram.
    Kilogram,
}

impl ProductUnit {
    /// Whether the product is priced by weight.
    #[must_use]
    pub const fn is_weight(self) -> bool {
        matches!(self, Self::Kilogram)
    }

    /// Wire name of the unit.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Piece => "piece",
            Self::Kilogram => "kg",
        }
    }
}

impl std::fmt::Display for ProductUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ProductUnit {
    type Err = ProductError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "piece" | "pieces" | "pc" | "pcs" => Ok(Self::Piece),
            "kg" | "kgs" | "kilogram" | "kilograms" => Ok(Self::Kilogram),
            _ => Err(ProductError::UnknownUnit(s.to_string())),
        }
    }
}

impl Serialize for ProductUnit {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ProductUnit {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// A product from the remote catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    #[serde(alias = "_id")]
    pub id: ProductId,
    pub name: String,
    #[serde(default)]
    pub category: String,
    /// Price per piece or per kilogram.
    pub rate: Money,
    pub unit: ProductUnit,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_festival: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stock: Option<Decimal>,
}

impl Product {
    /// Whether the product belongs to the festival collection.
    #[must_use]
    pub fn is_festival(&self) -> bool {
        self.is_festival.unwrap_or(false)
    }

    /// Whether the product is known to be out of stock.
    ///
    /// Products without a stock figure are treated as available.
    #[must_use]
    pub fn is_out_of_stock(&self) -> bool {
        self.stock.is_some_and(|stock| stock <= Decimal::ZERO)
    }
}

/// Errors raised while validating a [`ProductDraft`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ProductError {
    #[error("product name cannot be empty")]
    EmptyName,
    #[error("product category cannot be empty")]
    EmptyCategory,
    #[error("rate must be greater than zero")]
    NonPositiveRate,
    #[error("stock cannot be negative")]
    NegativeStock,
    #[error("unknown product unit: {0}")]
    UnknownUnit(String),
}

/// Body for creating or updating a product from the admin console.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDraft {
    pub name: String,
    pub category: String,
    pub rate: Money,
    pub unit: ProductUnit,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub is_festival: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stock: Option<Decimal>,
}

impl ProductDraft {
    /// Check the draft before it is sent to the API.
    ///
    /// # Errors
    ///
    /// Returns the first failing rule.
    pub fn validate(&self) -> Result<(), ProductError> {
        if self.name.trim().is_empty() {
            return Err(ProductError::EmptyName);
        }
        if self.category.trim().is_empty() {
            return Err(ProductError::EmptyCategory);
        }
        if !self.rate.is_positive() {
            return Err(ProductError::NonPositiveRate);
        }
        if self.stock.is_some_and(|stock| stock < Decimal::ZERO) {
            return Err(ProductError::NegativeStock);
        }
        Ok(())
    }
}

impl From<&Product> for ProductDraft {
    fn from(product: &Product) -> Self {
        Self {
            name: product.name.clone(),
            category: product.category.clone(),
            rate: product.rate,
            unit: product.unit,
            image: product.image.clone(),
            is_festival: product.is_festival(),
            stock: product.stock,
        }
    }
}
