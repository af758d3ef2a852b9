//! Order aggregate implementation.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use common::{DeliveryId, ItemId, MemberId, OrderId, OrderItemId};
use serde::{Deserialize, Serialize};

use crate::{Delivery, Item, Member, Money, NewDelivery, StockError};

use super::{NewOrderItem, OrderError, OrderItem, OrderStatus};

/// Order aggregate root.
///
/// The order exclusively owns its delivery and order items; they are created,
/// persisted and removed together with it. The member is referenced by id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub member_id: MemberId,
    pub delivery: Delivery,
    pub order_items: Vec<OrderItem>,
    pub order_date: DateTime<Utc>,
    status: OrderStatus,
}

/// An order assembled by [`Order::create`] and waiting to be persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
    pub member_id: MemberId,
    pub delivery: NewDelivery,
    pub order_items: Vec<NewOrderItem>,
    pub order_date: DateTime<Utc>,
    pub status: OrderStatus,
}

impl Order {
    /// Builds a new order for `member`.
    ///
    /// The order lines have already taken their stock (see
    /// [`NewOrderItem::create`]); the order starts as `Ordered` and is stamped
    /// with `now`. Fails when the order total does not fit in [`Money`].
    pub fn create(
        member: &Member,
        delivery: NewDelivery,
        order_items: Vec<NewOrderItem>,
        now: DateTime<Utc>,
    ) -> Result<NewOrder, OrderError> {
        if order_items.is_empty() {
            return Err(OrderError::NoItems);
        }
        order_items
            .iter()
            .try_fold(Money::zero(), |total, line| {
                line.order_price
                    .checked_multiply(line.count)
                    .and_then(|line_total| total.checked_add(line_total))
            })
            .ok_or(OrderError::AmountOverflow)?;

        Ok(NewOrder {
            member_id: member.id,
            delivery,
            order_items,
            order_date: now,
            status: OrderStatus::Ordered,
        })
    }

    /// Rebuilds an order from stored rows.
    pub fn from_parts(
        id: OrderId,
        member_id: MemberId,
        delivery: Delivery,
        order_items: Vec<OrderItem>,
        order_date: DateTime<Utc>,
        status: OrderStatus,
    ) -> Self {
        Self {
            id,
            member_id,
            delivery,
            order_items,
            order_date,
            status,
        }
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    /// Cancels the order and restores stock for every line.
    ///
    /// `items` must hold every item referenced by the order. All checks run
    /// before anything is mutated, so a failed cancel leaves both the order
    /// and the items untouched.
    pub fn cancel(&mut self, items: &mut HashMap<ItemId, Item>) -> Result<(), OrderError> {
        if self.delivery.is_completed() {
            return Err(OrderError::AlreadyDelivered { order_id: self.id });
        }
        if !self.status.can_cancel() {
            return Err(OrderError::AlreadyCancelled { order_id: self.id });
        }
        if let Some(missing) = self
            .order_items
            .iter()
            .find(|line| !items.contains_key(&line.item_id))
        {
            return Err(OrderError::ItemNotLoaded {
                item_id: missing.item_id,
            });
        }
        self.check_restorable(items)?;

        self.status = OrderStatus::Cancelled;
        for line in &self.order_items {
            if let Some(item) = items.get_mut(&line.item_id) {
                line.cancel(item)?;
            }
        }
        Ok(())
    }

    /// Checks that every item can take back the summed count of its lines.
    fn check_restorable(&self, items: &HashMap<ItemId, Item>) -> Result<(), OrderError> {
        let mut restoring: HashMap<ItemId, u64> = HashMap::new();
        for line in &self.order_items {
            *restoring.entry(line.item_id).or_default() += u64::from(line.count);
        }
        for (item_id, count) in restoring {
            let Some(item) = items.get(&item_id) else {
                continue;
            };
            let available = item.stock_quantity();
            if u64::from(available) + count > u64::from(u32::MAX) {
                return Err(StockError::Overflow {
                    item_id,
                    restoring: u32::try_from(count).unwrap_or(u32::MAX),
                    available,
                }
                .into());
            }
        }
        Ok(())
    }

    /// Sum of `order_price * count` over all lines.
    pub fn total_price(&self) -> Money {
        self.order_items.iter().map(OrderItem::total_price).sum()
    }

    /// Ids of all items referenced by the order, without duplicates.
    pub fn item_ids(&self) -> Vec<ItemId> {
        let mut ids: Vec<ItemId> = self.order_items.iter().map(|line| line.item_id).collect();
        ids.sort();
        ids.dedup();
        ids
    }
}

impl NewOrder {
    pub fn total_price(&self) -> Money {
        self.order_items.iter().map(NewOrderItem::total_price).sum()
    }

    /// Attaches the storage keys assigned on insert.
    ///
    /// `order_item_ids` must match `order_items` one to one.
    pub fn with_ids(
        self,
        id: OrderId,
        delivery_id: DeliveryId,
        order_item_ids: Vec<OrderItemId>,
    ) -> Order {
        let order_items = self
            .order_items
            .into_iter()
            .zip(order_item_ids)
            .map(|(line, line_id)| line.with_id(line_id, id))
            .collect();

        Order {
            id,
            member_id: self.member_id,
            delivery: self.delivery.with_id(delivery_id),
            order_items,
            order_date: self.order_date,
            status: self.status,
        }
    }
}
