//! Service error types.

use common::{CategoryId, ItemId, MemberId, OrderId};
use domain::{DomainError, ItemError, OrderError};
use store::StoreError;
use thiserror::Error;

/// Errors that can occur in a service operation.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// A member with this name is already registered.
    #[error("Member name already exists: {name}")]
    DuplicateMember { name: String },

    #[error("Member {0} not found")]
    MemberNotFound(MemberId),

    #[error("Item {0} not found")]
    ItemNotFound(ItemId),

    #[error("Category {0} not found")]
    CategoryNotFound(CategoryId),

    #[error("Order {0} not found")]
    OrderNotFound(OrderId),

    /// A business rule rejected the operation.
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Store(StoreError),
}

impl From<OrderError> for ServiceError {
    fn from(e: OrderError) -> Self {
        ServiceError::Domain(DomainError::Order(e))
    }
}

impl From<ItemError> for ServiceError {
    fn from(e: ItemError) -> Self {
        ServiceError::Domain(DomainError::Item(e))
    }
}

impl From<StoreError> for ServiceError {
    fn from(e: StoreError) -> Self {
        ServiceError::Store(e)
    }
}

impl ServiceError {
    /// Maps a member-name uniqueness violation to [`ServiceError::DuplicateMember`].
    pub(crate) fn member_write(e: StoreError, name: &str) -> Self {
        match e {
            StoreError::UniqueViolation { .. } => ServiceError::DuplicateMember {
                name: name.to_string(),
            },
            other => ServiceError::Store(other),
        }
    }
}

/// Result type for service operations.
pub type Result<T> = std::result::Result<T, ServiceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unique_violation_becomes_duplicate_member() {
        let err = ServiceError::member_write(
            StoreError::UniqueViolation {
                constraint: "uk_member_name".to_string(),
            },
            "kim",
        );
        assert!(matches!(err, ServiceError::DuplicateMember { ref name } if name == "kim"));
        assert_eq!(err.to_string(), "Member name already exists: kim");
    }

    #[test]
    fn other_store_errors_pass_through() {
        let err = ServiceError::member_write(StoreError::InvalidData("bad".to_string()), "kim");
        assert!(matches!(err, ServiceError::Store(StoreError::InvalidData(_))));
    }

    #[test]
    fn order_errors_wrap_into_domain() {
        let err: ServiceError = OrderError::NoItems.into();
        assert!(matches!(err, ServiceError::Domain(DomainError::Order(OrderError::NoItems))));
    }

    #[test]
    fn item_errors_wrap_into_domain() {
        let err: ServiceError = ItemError::InvalidPrice {
            price: domain::Money::new(-1),
        }
        .into();
        assert!(matches!(
            err,
            ServiceError::Domain(DomainError::Item(ItemError::InvalidPrice { .. }))
        ));
    }
}
