//! Raw entity views: the loaded entities serialized as they are.

use chrono::{DateTime, Utc};
use common::{OrderId, OrderItemId};
use domain::{Delivery, Item, Member, Money, OrderStatus};
use serde::Serialize;

/// An order with every association loaded.
///
/// The member is embedded without its orders, so serialization never
/// recurses back into the order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderEntityView {
    pub id: OrderId,
    pub member: Member,
    pub order_items: Vec<OrderItemEntityView>,
    pub delivery: Delivery,
    pub order_date: DateTime<Utc>,
    pub status: OrderStatus,
}

/// An order line with its item loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderItemEntityView {
    pub id: OrderItemId,
    pub item: Item,
    pub order_price: Money,
    pub count: u32,
}

/// An order with its to-one associations loaded and no lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SimpleOrderEntityView {
    pub id: OrderId,
    pub member: Member,
    pub delivery: Delivery,
    pub order_date: DateTime<Utc>,
    pub status: OrderStatus,
}
