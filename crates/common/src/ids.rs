use serde::{Deserialize, Serialize};

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            /// Wraps a raw storage key.
            pub fn new(id: i64) -> Self {
                Self(id)
            }

            /// Returns the underlying storage key.
            pub fn as_i64(&self) -> i64 {
                self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i64> for $name {
            fn from(id: i64) -> Self {
                Self(id)
            }
        }

        impl From<$name> for i64 {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

entity_id!(
    /// Identifier of a registered member.
    MemberId
);

entity_id!(
    /// Identifier of a catalog item (book, album or movie).
    ItemId
);

entity_id!(
    /// Identifier of a category node.
    CategoryId
);

entity_id!(
    /// Identifier of an order aggregate.
    OrderId
);

entity_id!(
    /// Identifier of the delivery owned by an order.
    DeliveryId
);

entity_id!(OrderItemId);
