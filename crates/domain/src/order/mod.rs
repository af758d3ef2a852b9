//! Order aggregate and related types.

mod aggregate;
mod order_item;
mod status;

pub use aggregate::{NewOrder, Order};
pub use order_item::{NewOrderItem, OrderItem};
pub use status::OrderStatus;

use common::{ItemId, OrderId};
use thiserror::Error;

use crate::item::StockError;

/// Errors that can occur during order operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrderError {
    /// An order needs at least one order item.
    #[error("Order has no items")]
    NoItems,

    /// Invalid count on an order line.
    #[error("Invalid quantity: {count} (must be greater than 0)")]
    InvalidQuantity { count: u32 },

    /// The delivery has already completed.
    #[error("Order {order_id} has already been delivered and cannot be cancelled")]
    AlreadyDelivered { order_id: OrderId },

    /// The order was cancelled before.
    #[error("Order {order_id} is already cancelled")]
    AlreadyCancelled { order_id: OrderId },

    /// Cancellation needs every ordered item loaded to restore its stock.
    #[error("Item {item_id} was not loaded for stock restoration")]
    ItemNotLoaded { item_id: ItemId },

    /// A line or order total does not fit in [`Money`](crate::Money).
    #[error("Order amount exceeds the supported range")]
    AmountOverflow,

    /// Stock could not cover or take back an order line.
    #[error(transparent)]
    Stock(#[from] StockError),
}
