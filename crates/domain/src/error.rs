//! Domain error types.

use thiserror::Error;

/// Errors raised by domain validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    /// Quantity must be at least one.
    #[error("Invalid quantity: {quantity} (must be greater than 0)")]
    InvalidQuantity { quantity: u32 },

    /// Points to redeem must be positive.
    #[error("Invalid points: {points} (must be greater than 0)")]
    InvalidPoints { points: i64 },

    /// The cart has no items.
    #[error("Cart is empty")]
    EmptyCart,

    /// A label that is not one of the known intents.
    #[error("Unknown intent: {0}")]
    UnknownIntent(String),

    /// A budget range that is not of the form `min-max`.
    #[error("Invalid budget range: {0}")]
    InvalidBudgetRange(String),
}
