//! Contact form messages (`POST /api/contact`).

use serde::{Deserialize, Serialize};

use crate::types::{MobileError, MobileNumber};

/// Longest message the form accepts.
pub const MAX_MESSAGE_LENGTH: usize = 2000;

/// Errors raised while validating a contact message.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ContactError {
    #[error("name is required")]
    MissingName,
    #[error("message is required")]
    MissingMessage,
    #[error("message must be at most {max} characters")]
    MessageTooLong { max: usize },
    #[error("invalid email address: {0}")]
    InvalidEmail(String),
    #[error(transparent)]
    Mobile(#[from] MobileError),
}

/// A message from the contact form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactMessage {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mobile: Option<MobileNumber>,
    pub message: String,
}

impl ContactMessage {
    /// Build a message from raw form fields. Blank optional fields are
    /// dropped; the mobile field is sanitized like the order form.
    ///
    /// # Errors
    ///
    /// Returns the first failing field.
    pub fn new(
        name: &str,
        email: Option<&str>,
        mobile: Option<&str>,
        message: &str,
    ) -> Result<Self, ContactError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ContactError::MissingName);
        }

        let message = message.trim();
        if message.is_empty() {
            return Err(ContactError::MissingMessage);
        }
        if message.chars().count() > MAX_MESSAGE_LENGTH {
            return Err(ContactError::MessageTooLong {
                max: MAX_MESSAGE_LENGTH,
            });
        }

        let email = match email.map(str::trim).filter(|e| !e.is_empty()) {
            Some(email) if is_plausible_email(email) => Some(email.to_string()),
            Some(email) => return Err(ContactError::InvalidEmail(email.to_string())),
            None => None,
        };

        let mobile = mobile
            .filter(|m| !m.trim().is_empty())
            .map(MobileNumber::parse)
            .transpose()?;

        Ok(Self {
            name: name.to_string(),
            email,
            mobile,
            message: message.to_string(),
        })
    }
}

/// One `@` with something on both sides.
fn is_plausible_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => !local.is_empty() && !domain.is_empty() && !domain.contains('@'),
        None => false,
    }
}
