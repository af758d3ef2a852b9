//! Order lines.

use common::{ItemId, OrderId, OrderItemId};
use serde::{Deserialize, Serialize};

use crate::{Item, Money, StockError};

use super::OrderError;

/// A persisted order line.
///
/// Price and count are snapshots taken when the order was placed and do not
/// follow later changes to the item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: OrderItemId,

    /// Back-reference used for lookups only.
    #[serde(skip)]
    pub order_id: OrderId,

    pub item_id: ItemId,
    pub order_price: Money,
    pub count: u32,
}

impl OrderItem {
    /// Returns `order_price * count`.
    pub fn total_price(&self) -> Money {
        self.order_price.multiply(self.count)
    }

    /// Gives the ordered count back to the item's stock.
    pub fn cancel(&self, item: &mut Item) -> Result<(), StockError> {
        item.add_stock(self.count)
    }
}

/// An order line that has taken stock but has not been persisted yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewOrderItem {
    pub item_id: ItemId,
    pub order_price: Money,
    pub count: u32,
}

impl NewOrderItem {
    /// Creates an order line and removes `count` from the item's stock.
    ///
    /// Fails without touching the item when `count` is zero, stock is short,
    /// or the line total does not fit in [`Money`].
    pub fn create(item: &mut Item, order_price: Money, count: u32) -> Result<Self, OrderError> {
        if count == 0 {
            return Err(OrderError::InvalidQuantity { count });
        }
        order_price
            .checked_multiply(count)
            .ok_or(OrderError::AmountOverflow)?;
        item.remove_stock(count)?;

        Ok(Self {
            item_id: item.id,
            order_price,
            count,
        })
    }

    pub fn total_price(&self) -> Money {
        self.order_price.multiply(self.count)
    }

    /// Attaches the storage keys assigned on insert.
    pub fn with_id(self, id: OrderItemId, order_id: OrderId) -> OrderItem {
        OrderItem {
            id,
            order_id,
            item_id: self.item_id,
            order_price: self.order_price,
            count: self.count,
        }
    }
}
