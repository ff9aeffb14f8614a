//! Indian mobile number type.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`MobileNumber`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum MobileError {
    /// The input has no digits at all.
    #[error("mobile number cannot be empty")]
    Empty,
    /// The input has fewer than ten digits.
    #[error("mobile number must have {expected} digits (got {got})")]
    WrongLength {
        /// Required digit count.
        expected: usize,
        /// Digits present.
        got: usize,
    },
}

/// A ten-digit mobile number.
///
/// Input is sanitized the same way the order forms do it while the customer
/// types: everything that is not an ASCII digit is dropped and the result is
/// cut to ten characters. Validation then requires exactly ten digits.
///
/// ## Examples
///
/// ```
/// use sweetshop_core::MobileNumber;
///
/// assert_eq!(MobileNumber::sanitize("98a76!543210extra"), "9876543210");
/// assert!(MobileNumber::parse("98765 43210").is_ok());
/// assert!(MobileNumber::parse("12345").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct MobileNumber(String);

impl MobileNumber {
    /// Number of digits in a valid mobile number.
    pub const LENGTH: usize = 10;

    /// Strip non-digits and truncate to [`Self::LENGTH`] characters.
    #[must_use]
    pub fn sanitize(input: &str) -> String {
        input
            .chars()
            .filter(char::is_ascii_digit)
            .take(Self::LENGTH)
            .collect()
    }

    /// Parse a `MobileNumber` from raw form input.
    ///
    /// # Errors
    ///
    /// Returns an error if the sanitized input is empty or shorter than ten
    /// digits.
    pub fn parse(input: &str) -> Result<Self, MobileError> {
        let digits = Self::sanitize(input);
        if digits.is_empty() {
            return Err(MobileError::Empty);
        }
        if digits.len() != Self::LENGTH {
            return Err(MobileError::WrongLength {
                expected: Self::LENGTH,
                got: digits.len(),
            });
        }
        Ok(Self(digits))
    }

    /// Returns the digits as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the `MobileNumber` and returns its digits.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for MobileNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for MobileNumber {
    type Err = MobileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for MobileNumber {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
