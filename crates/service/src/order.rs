//! Order placement, cancellation and delivery.

use std::collections::HashMap;

use chrono::Utc;
use common::{ItemId, MemberId, OrderId};
use domain::{Item, NewDelivery, NewOrderItem, Order};
use store::{OrderRow, OrderSearch, Store, StoreError, Transaction, TransactionExt};

use crate::{Result, ServiceError};

/// Service for managing orders.
#[derive(Clone)]
pub struct OrderService<S> {
    store: S,
}

impl<S: Store> OrderService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Places an order for `member_id`.
    ///
    /// Each line is an `(item, count)` pair. Prices are taken from the items
    /// as they are now and the delivery goes to the member's address. Stock
    /// for every line is taken in the same transaction as the insert, so a
    /// shortage on any line leaves all stock untouched.
    #[tracing::instrument(skip(self))]
    pub async fn order(&self, member_id: MemberId, lines: &[(ItemId, u32)]) -> Result<OrderId> {
        let mut tx = self.store.begin().await?;

        let member = tx
            .find_member(member_id)
            .await?
            .ok_or(ServiceError::MemberNotFound(member_id))?;

        let mut items = load_items(&mut tx, lines.iter().map(|(id, _)| *id)).await?;

        let mut order_items = Vec::with_capacity(lines.len());
        for (item_id, count) in lines {
            let item = items
                .get_mut(item_id)
                .ok_or(ServiceError::ItemNotFound(*item_id))?;
            let price = item.price;
            order_items.push(NewOrderItem::create(item, price, *count)?);
        }

        let new_order = Order::create(
            &member,
            NewDelivery::to(member.address.clone()),
            order_items,
            Utc::now(),
        )?;
        for item in items.values() {
            tx.update_item(item).await?;
        }
        let order = tx.insert_order(new_order).await?;
        tx.commit().await?;

        metrics::counter!("orders_created_total").increment(1);
        tracing::info!(order_id = %order.id, total = order.total_price().amount(), "order placed");
        Ok(order.id)
    }

    /// Cancels an order and restores the stock of every line.
    #[tracing::instrument(skip(self))]
    pub async fn cancel_order(&self, order_id: OrderId) -> Result<Order> {
        let mut tx = self.store.begin().await?;

        let mut order = tx
            .load_order(order_id)
            .await?
            .ok_or(ServiceError::OrderNotFound(order_id))?;
        let mut items = load_items(&mut tx, order.item_ids()).await?;

        order.cancel(&mut items)?;

        tx.update_order_status(order.id, order.status()).await?;
        for item in items.values() {
            tx.update_item(item).await?;
        }
        tx.commit().await?;

        metrics::counter!("orders_cancelled_total").increment(1);
        tracing::info!(order_id = %order.id, "order cancelled");
        Ok(order)
    }

    /// Marks the delivery of an order as completed.
    ///
    /// A completed delivery can no longer be cancelled.
    #[tracing::instrument(skip(self))]
    pub async fn complete_delivery(&self, order_id: OrderId) -> Result<Order> {
        let mut tx = self.store.begin().await?;

        let mut order = tx
            .load_order(order_id)
            .await?
            .ok_or(ServiceError::OrderNotFound(order_id))?;
        if !order.delivery.is_completed() {
            order.delivery.complete();
            tx.update_delivery(&order.delivery).await?;
            tx.commit().await?;
            tracing::info!(order_id = %order.id, "delivery completed");
        }
        Ok(order)
    }

    /// Fully loaded orders matching `search`, in order-id order.
    #[tracing::instrument(skip(self))]
    pub async fn find_orders(&self, search: &OrderSearch) -> Result<Vec<Order>> {
        let mut tx = self.store.begin().await?;
        let rows = tx.find_order_rows(search, None).await?;
        assemble_orders(&mut tx, rows).await
    }

    /// Every order a member has placed, in order-id order.
    #[tracing::instrument(skip(self))]
    pub async fn find_member_orders(&self, member_id: MemberId) -> Result<Vec<Order>> {
        let mut tx = self.store.begin().await?;
        if tx.find_member(member_id).await?.is_none() {
            return Err(ServiceError::MemberNotFound(member_id));
        }
        let rows = tx.find_order_rows_by_member(member_id).await?;
        assemble_orders(&mut tx, rows).await
    }

    #[tracing::instrument(skip(self))]
    pub async fn find_order(&self, order_id: OrderId) -> Result<Option<Order>> {
        let mut tx = self.store.begin().await?;
        Ok(tx.load_order(order_id).await?)
    }
}

/// Attaches deliveries and lines to order roots with one query each.
async fn assemble_orders<T: Transaction>(tx: &mut T, rows: Vec<OrderRow>) -> Result<Vec<Order>> {
    if rows.is_empty() {
        return Ok(Vec::new());
    }

    let delivery_ids: Vec<_> = rows.iter().map(|row| row.delivery_id).collect();
    let order_ids: Vec<_> = rows.iter().map(|row| row.id).collect();
    let mut deliveries: HashMap<_, _> = tx
        .find_deliveries_by_ids(&delivery_ids)
        .await?
        .into_iter()
        .map(|delivery| (delivery.id, delivery))
        .collect();
    let mut lines: HashMap<OrderId, Vec<_>> = HashMap::new();
    for line in tx.find_order_items_in(&order_ids).await? {
        lines.entry(line.order_id).or_default().push(line);
    }

    rows.into_iter()
        .map(|row| -> Result<Order> {
            let delivery = deliveries
                .remove(&row.delivery_id)
                .ok_or(StoreError::NotFound {
                    entity: "Delivery",
                    id: row.delivery_id.as_i64(),
                })?;
            Ok(Order::from_parts(
                row.id,
                row.member_id,
                delivery,
                lines.remove(&row.id).unwrap_or_default(),
                row.order_date,
                row.status,
            ))
        })
        .collect()
}

/// Loads and locks the given items with one query, keyed by id.
///
/// Missing ids are simply absent from the map.
async fn load_items<T: Transaction>(
    tx: &mut T,
    ids: impl IntoIterator<Item = ItemId>,
) -> Result<HashMap<ItemId, Item>> {
    let mut ids: Vec<ItemId> = ids.into_iter().collect();
    ids.sort();
    ids.dedup();

    Ok(tx
        .lock_items_by_ids(&ids)
        .await?
        .into_iter()
        .map(|item| (item.id, item))
        .collect())
}
