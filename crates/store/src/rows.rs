//! Row shapes returned by order queries.
//!
//! Entity rows carry foreign keys only; join rows carry the joined entities
//! already materialized; query rows are flat projections that never touch the
//! entity model.

use chrono::{DateTime, Utc};
use common::{DeliveryId, MemberId, OrderId};
use domain::{Address, Delivery, Item, Member, Money, OrderItem, OrderStatus};
use serde::Serialize;

/// The `orders` row without any association loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderRow {
    pub id: OrderId,
    pub member_id: MemberId,
    pub delivery_id: DeliveryId,
    pub order_date: DateTime<Utc>,
    pub status: OrderStatus,
}

/// An order joined with its member and delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderMemberDeliveryRow {
    pub order: OrderRow,
    pub member: Member,
    pub delivery: Delivery,
}

/// One row of the full join `orders ⋈ member ⋈ delivery ⋈ order_item ⋈ item`.
///
/// An order with n lines appears n times.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderItemJoinRow {
    pub order: OrderRow,
    pub member: Member,
    pub delivery: Delivery,
    pub order_item: OrderItem,
    pub item: Item,
}

/// Order header projected directly from `orders ⋈ member ⋈ delivery`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderQueryRow {
    pub order_id: OrderId,
    pub name: String,
    pub order_date: DateTime<Utc>,
    pub order_status: OrderStatus,
    pub address: Address,
}

/// Order line projected directly from `order_item ⋈ item`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderItemQueryRow {
    pub order_id: OrderId,
    pub item_name: String,
    pub order_price: Money,
    pub count: u32,
}

/// Order header and one of its lines in a single flat row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderFlatRow {
    pub order_id: OrderId,
    pub name: String,
    pub order_date: DateTime<Utc>,
    pub order_status: OrderStatus,
    pub address: Address,
    pub item_name: String,
    pub order_price: Money,
    pub count: u32,
}
