//! Sweet Shop Client - REST API access and session state.
//!
//! # Modules
//!
//! - [`api`] - Typed client for the shop API with the cached catalog
//! - [`checkout`] - Storefront checkout and admin manual orders
//! - [`session`] - Cart and admin flag persisted between runs
//! - [`config`] - Environment-driven configuration
//! - [`retry`] - Fixed-delay retry for transient failures

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod checkout;
pub mod config;
pub mod error;
pub mod retry;
pub mod session;

pub use api::{AdminError, ApiClient, PlacedOrder};
pub use checkout::{CheckoutError, checkout, place_manual_order};
pub use config::{ApiConfig, CatalogConfig, ConfigError};
pub use error::ApiError;
pub use session::{
    FileSessionStore, MemorySessionStore, Session, SessionError, SessionHandle, SessionStore,
};
