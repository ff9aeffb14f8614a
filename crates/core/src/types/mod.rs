//! Core types for the sweet shop.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod date;
pub mod id;
pub mod mobile;
pub mod money;
pub mod product;
pub mod status;

pub use id::*;
pub use mobile::{MobileError, MobileNumber};
pub use money::{Money, round_currency, round_quantity};
pub use product::{Product, ProductDraft, ProductError, ProductUnit};
pub use status::*;
