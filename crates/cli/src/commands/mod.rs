//! CLI command implementations.

pub mod admin;
pub mod cart;
pub mod catalog;
pub mod order;

use rust_decimal::Decimal;
use sweetshop_client::{
    AdminError, ApiClient, ApiConfig, ApiError, CheckoutError, FileSessionStore, SessionError,
    SessionHandle,
};
use sweetshop_core::{CartError, ContactError, EditError, OrderError, Product};
use thiserror::Error;

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Admin(#[from] AdminError),

    #[error(transparent)]
    Checkout(#[from] CheckoutError),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Cart(#[from] CartError),

    #[error(transparent)]
    Order(#[from] OrderError),

    #[error(transparent)]
    Edit(#[from] EditError),

    #[error(transparent)]
    Contact(#[from] ContactError),

    #[error("File error: {0}")]
    Io(#[from] std::io::Error),

    /// No catalog product matches the id or name given.
    #[error("No product matches '{0}'")]
    UnknownProduct(String),

    /// Line numbers start at 1.
    #[error("Invalid line number: {0}")]
    InvalidLine(usize),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

/// API client plus the persisted session, shared by every command.
pub struct Context {
    pub client: ApiClient,
    pub session: SessionHandle<FileSessionStore>,
}

impl Context {
    /// Build the client and load the session file.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be built or the session file
    /// cannot be read.
    pub fn open(config: &ApiConfig) -> Result<Self, CommandError> {
        let client = ApiClient::new(config)?;
        let session = SessionHandle::open(FileSessionStore::new(&config.session_file))?;
        Ok(Self { client, session })
    }
}

/// Convert a 1-based line number from the command line to an index.
pub fn line_index(line: usize) -> Result<usize, CommandError> {
    line.checked_sub(1).ok_or(CommandError::InvalidLine(line))
}

/// Find a catalog product by exact id, then by case-insensitive name.
pub fn find_product<'a>(catalog: &'a [Product], query: &str) -> Result<&'a Product, CommandError> {
    let query = query.trim();
    catalog
        .iter()
        .find(|p| p.id.as_str() == query)
        .or_else(|| catalog.iter().find(|p| p.name.eq_ignore_ascii_case(query)))
        .ok_or_else(|| CommandError::UnknownProduct(query.to_string()))
}

/// Split a `KEY=VALUE` argument.
pub fn split_pair(arg: &str) -> Result<(&str, &str), CommandError> {
    arg.split_once('=')
        .map(|(key, value)| (key.trim(), value.trim()))
        .filter(|(key, _)| !key.is_empty())
        .ok_or_else(|| CommandError::InvalidArgument(format!("expected KEY=VALUE, got '{arg}'")))
}

/// Parse a `PRODUCT=AMOUNT` argument.
pub fn product_amount(arg: &str) -> Result<(&str, Decimal), CommandError> {
    let (product, amount) = split_pair(arg)?;
    let amount = amount
        .parse::<Decimal>()
        .map_err(|_| CommandError::InvalidArgument(format!("'{amount}' is not a number")))?;
    Ok((product, amount))
}
