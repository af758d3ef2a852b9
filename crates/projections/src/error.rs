//! Projection error types.

use thiserror::Error;

/// Errors that can occur while reading orders.
#[derive(Debug, Error)]
pub enum ProjectionError {
    /// An error occurred in the store.
    #[error("Store error: {0}")]
    Store(#[from] store::StoreError),

    /// The strategy joins the order-item collection, so a limit/offset window
    /// would cut through an order's lines instead of counting orders.
    #[error("Strategy {strategy} cannot be paginated")]
    PaginationUnsupported { strategy: &'static str },
}

/// Result type for projection operations.
pub type Result<T> = std::result::Result<T, ProjectionError>;
