//! Domain error types.

use thiserror::Error;

use crate::item::ItemError;
use crate::order::OrderError;

/// Errors raised by domain invariants.
#[derive(Debug, Error)]
pub enum DomainError {
    /// An order invariant was violated.
    #[error("Order error: {0}")]
    Order(#[from] OrderError),

    /// Item data was rejected.
    #[error("Item error: {0}")]
    Item(#[from] ItemError),
}
