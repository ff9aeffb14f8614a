//! Sweet Shop Core - domain types and pricing rules.
//!
//! This crate holds everything the storefront and the admin console agree on:
//! - `sweetshop-client` - REST client for the shop API, session store
//! - `sweetshop-cli` - Storefront and admin console on the command line
//!
//! # Architecture
//!
//! The core crate is pure: no I/O, no HTTP, no clock. Dates that matter
//! (today, for delivery checks) are passed in by the caller, who gets them
//! from the server.
//!
//! # Modules
//!
//! - [`types`] - Ids, money, mobile numbers, products and order status
//! - [`pricing`] - Unit conversion, line and cart totals, input parsing
//! - [`cart`] - The cart model used by every screen that collects items
//! - [`order`] - Order form validation and the order payload
//! - [`ledger`] - Admin order list with filter and sort
//! - [`edit`] - Payment top-ups, item edits and status changes
//! - [`summary`] - Per-day sales summary
//! - [`contact`] - Contact form messages

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod contact;
pub mod edit;
pub mod ledger;
pub mod order;
pub mod pricing;
pub mod summary;
pub mod types;

pub use cart::{Cart, CartError, CartLine};
pub use contact::{ContactError, ContactMessage};
pub use edit::{EditError, OrderEdit, OrderEditor, StatusUpdate};
pub use ledger::{LedgerFilter, LedgerSort, Order, OrderLedger, SortDirection, SortKey, StatusFilter};
pub use order::{ItemUnit, OrderError, OrderForm, OrderItem, OrderPayload};
pub use pricing::{LineQuantity, QuantityError, WeightUnit};
pub use summary::{DailySummary, summarize};
pub use types::*;
