//! Order status and its transition rules.

use serde::{Deserialize, Serialize};

/// Errors raised when a status change is not allowed.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum StatusError {
    /// The order is already delivered or cancelled.
    #[error("order is {0} and can no longer change status")]
    Terminal(OrderStatus),
    /// The requested transition is not part of the order lifecycle.
    #[error("cannot move order from {from} to {to}")]
    InvalidTransition {
        /// Current status.
        from: OrderStatus,
        /// Requested status.
        to: OrderStatus,
    },
    /// The status string is not recognised.
    #[error("invalid order status: {0}")]
    Unknown(String),
}

/// Order lifecycle status.
///
/// ```text
/// pending ──► processing ──► delivered
///    │            │
///    └────────────┴────────► cancelled
/// pending ─────────────────► delivered
/// ```
///
/// `delivered` and `cancelled` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Pending,
    Processing,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    /// All statuses in lifecycle order.
    pub const ALL: [Self; 4] = [
        Self::Pending,
        Self::Processing,
        Self::Delivered,
        Self::Cancelled,
    ];

    /// Whether the order still shows up in the default admin view.
    #[must_use]
    pub const fn is_active(self) -> bool {
        matches!(self, Self::Pending | Self::Processing)
    }

    /// Whether no further transition is possible.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Delivered | Self::Cancelled)
    }

    /// Whether `self → next` is a permitted transition.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Processing | Self::Delivered | Self::Cancelled)
                | (Self::Processing, Self::Delivered | Self::Cancelled)
        )
    }

    /// Validate a transition, returning the new status.
    ///
    /// # Errors
    ///
    /// Returns [`StatusError::Terminal`] when the order is delivered or
    /// cancelled, and [`StatusError::InvalidTransition`] for any other move
    /// outside the lifecycle (including staying in the same status).
    pub fn transition_to(self, next: Self) -> Result<Self, StatusError> {
        if self.is_terminal() {
            return Err(StatusError::Terminal(self));
        }
        if !self.can_transition_to(next) {
            return Err(StatusError::InvalidTransition {
                from: self,
                to: next,
            });
        }
        Ok(next)
    }

    /// Statuses reachable from this one.
    #[must_use]
    pub fn next_statuses(self) -> Vec<Self> {
        Self::ALL
            .into_iter()
            .filter(|next| self.can_transition_to(*next))
            .collect()
    }

    /// Wire name of the status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = StatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "processing" => Ok(Self::Processing),
            "delivered" => Ok(Self::Delivered),
            "cancelled" | "canceled" => Ok(Self::Cancelled),
            _ => Err(StatusError::Unknown(s.to_string())),
        }
    }
}
