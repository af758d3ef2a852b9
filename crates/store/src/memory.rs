use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use common::{CategoryId, DeliveryId, ItemId, MemberId, OrderId, OrderItemId};
use domain::{
    Category, Delivery, Item, Member, NewCategory, NewItem, NewMember, NewOrder, Order, OrderItem,
    OrderStatus,
};
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::query::window;
use crate::{
    OrderFlatRow, OrderItemJoinRow, OrderItemQueryRow, OrderMemberDeliveryRow, OrderQueryRow,
    OrderRow, OrderSearch, Page, Result, StoreError,
    store::{Store, Transaction},
};

const MEMBER_NAME_CONSTRAINT: &str = "uk_member_name";

#[derive(Debug, Clone, Default)]
struct Tables {
    members: BTreeMap<MemberId, Member>,
    items: BTreeMap<ItemId, Item>,
    categories: BTreeMap<CategoryId, Category>,
    deliveries: BTreeMap<DeliveryId, Delivery>,
    orders: BTreeMap<OrderId, OrderRow>,
    order_items: BTreeMap<OrderItemId, OrderItem>,
    sequence: i64,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.sequence += 1;
        self.sequence
    }

    fn name_taken(&self, name: &str, except: Option<MemberId>) -> bool {
        self.members
            .values()
            .any(|m| m.name == name && Some(m.id) != except)
    }

    /// Order roots matching `search`, in id order, windowed by `page`.
    fn select_orders(&self, search: &OrderSearch, page: Option<Page>) -> Vec<OrderRow> {
        let (offset, limit) = window(page);
        self.orders
            .values()
            .filter(|order| {
                let name = self
                    .members
                    .get(&order.member_id)
                    .map(|m| m.name.as_str())
                    .unwrap_or_default();
                search.matches(order.status, name)
            })
            .skip(offset)
            .take(limit)
            .cloned()
            .collect()
    }

    fn member(&self, id: MemberId) -> Result<&Member> {
        self.members.get(&id).ok_or(StoreError::NotFound {
            entity: "Member",
            id: id.as_i64(),
        })
    }

    fn delivery(&self, id: DeliveryId) -> Result<&Delivery> {
        self.deliveries.get(&id).ok_or(StoreError::NotFound {
            entity: "Delivery",
            id: id.as_i64(),
        })
    }

    fn item(&self, id: ItemId) -> Result<&Item> {
        self.items.get(&id).ok_or(StoreError::NotFound {
            entity: "Item",
            id: id.as_i64(),
        })
    }

    fn lines_of(&self, order: OrderId) -> impl Iterator<Item = &OrderItem> {
        self.order_items
            .values()
            .filter(move |line| line.order_id == order)
    }

    fn query_row(&self, order: &OrderRow) -> Result<OrderQueryRow> {
        Ok(OrderQueryRow {
            order_id: order.id,
            name: self.member(order.member_id)?.name.clone(),
            order_date: order.order_date,
            order_status: order.status,
            address: self.delivery(order.delivery_id)?.address.clone(),
        })
    }

    fn item_query_row(&self, line: &OrderItem) -> Result<OrderItemQueryRow> {
        Ok(OrderItemQueryRow {
            order_id: line.order_id,
            item_name: self.item(line.item_id)?.name.clone(),
            order_price: line.order_price,
            count: line.count,
        })
    }
}

/// In-memory store for tests and local runs.
///
/// Transactions are serialized: [`Store::begin`] waits until the previous
/// transaction commits or is dropped. Each transaction works on a private copy
/// of the tables which replaces the shared state on commit.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    tables: Arc<Mutex<Tables>>,
    queries: Arc<AtomicU64>,
}

impl InMemoryStore {
    /// Creates a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of queries issued through this store.
    pub fn total_queries(&self) -> u64 {
        self.queries.load(Ordering::Relaxed)
    }

    /// Returns the number of stored orders.
    pub async fn order_count(&self) -> usize {
        self.tables.lock().await.orders.len()
    }
}

#[async_trait]
impl Store for InMemoryStore {
    type Tx = InMemoryTransaction;

    async fn begin(&self) -> Result<Self::Tx> {
        let guard = self.tables.clone().lock_owned().await;
        let working = (*guard).clone();
        Ok(InMemoryTransaction {
            guard,
            working,
            queries: 0,
            total: self.queries.clone(),
        })
    }
}

/// Unit of work over an [`InMemoryStore`].
pub struct InMemoryTransaction {
    guard: OwnedMutexGuard<Tables>,
    working: Tables,
    queries: u64,
    total: Arc<AtomicU64>,
}

impl InMemoryTransaction {
    fn record(&mut self, query: &'static str) {
        self.queries += 1;
        self.total.fetch_add(1, Ordering::Relaxed);
        metrics::counter!("store_queries_total", "query" => query).increment(1);
        tracing::trace!(query, "in-memory query");
    }
}

#[async_trait]
impl Transaction for InMemoryTransaction {
    fn query_count(&self) -> u64 {
        self.queries
    }

    async fn commit(self) -> Result<()> {
        let Self {
            mut guard, working, ..
        } = self;
        *guard = working;
        Ok(())
    }

    async fn insert_member(&mut self, member: NewMember) -> Result<Member> {
        self.record("insert_member");
        if self.working.name_taken(&member.name, None) {
            return Err(StoreError::UniqueViolation {
                constraint: MEMBER_NAME_CONSTRAINT.to_string(),
            });
        }
        let id = MemberId::new(self.working.next_id());
        let member = member.with_id(id);
        self.working.members.insert(id, member.clone());
        Ok(member)
    }

    async fn find_member(&mut self, id: MemberId) -> Result<Option<Member>> {
        self.record("find_member");
        Ok(self.working.members.get(&id).cloned())
    }

    async fn find_all_members(&mut self) -> Result<Vec<Member>> {
        self.record("find_all_members");
        Ok(self.working.members.values().cloned().collect())
    }

    async fn find_members_by_name(&mut self, name: &str) -> Result<Vec<Member>> {
        self.record("find_members_by_name");
        Ok(self
            .working
            .members
            .values()
            .filter(|m| m.name == name)
            .cloned()
            .collect())
    }

    async fn update_member(&mut self, member: &Member) -> Result<()> {
        self.record("update_member");
        if !self.working.members.contains_key(&member.id) {
            return Err(StoreError::NotFound {
                entity: "Member",
                id: member.id.as_i64(),
            });
        }
        if self.working.name_taken(&member.name, Some(member.id)) {
            return Err(StoreError::UniqueViolation {
                constraint: MEMBER_NAME_CONSTRAINT.to_string(),
            });
        }
        self.working.members.insert(member.id, member.clone());
        Ok(())
    }

    async fn insert_item(&mut self, item: NewItem) -> Result<Item> {
        self.record("insert_item");
        let id = ItemId::new(self.working.next_id());
        let item = item.with_id(id);
        self.working.items.insert(id, item.clone());
        Ok(item)
    }

    async fn find_item(&mut self, id: ItemId) -> Result<Option<Item>> {
        self.record("find_item");
        Ok(self.working.items.get(&id).cloned())
    }

    async fn find_items_by_ids(&mut self, ids: &[ItemId]) -> Result<Vec<Item>> {
        self.record("find_items_by_ids");
        Ok(ids_in(&self.working.items, ids))
    }

    async fn lock_items_by_ids(&mut self, ids: &[ItemId]) -> Result<Vec<Item>> {
        // Transactions already run one at a time.
        self.record("lock_items_by_ids");
        Ok(ids_in(&self.working.items, ids))
    }

    async fn find_all_items(&mut self) -> Result<Vec<Item>> {
        self.record("find_all_items");
        Ok(self.working.items.values().cloned().collect())
    }

    async fn update_item(&mut self, item: &Item) -> Result<()> {
        self.record("update_item");
        match self.working.items.get_mut(&item.id) {
            Some(stored) => {
                *stored = item.clone();
                Ok(())
            }
            None => Err(StoreError::NotFound {
                entity: "Item",
                id: item.id.as_i64(),
            }),
        }
    }

    async fn insert_category(&mut self, category: NewCategory) -> Result<Category> {
        self.record("insert_category");
        if let Some(parent) = category.parent_id
            && !self.working.categories.contains_key(&parent)
        {
            return Err(StoreError::NotFound {
                entity: "Category",
                id: parent.as_i64(),
            });
        }
        let id = CategoryId::new(self.working.next_id());
        let category = category.with_id(id);
        self.working.categories.insert(id, category.clone());
        Ok(category)
    }

    async fn find_category(&mut self, id: CategoryId) -> Result<Option<Category>> {
        self.record("find_category");
        Ok(self.working.categories.get(&id).cloned())
    }

    async fn find_child_categories(&mut self, parent: CategoryId) -> Result<Vec<Category>> {
        self.record("find_child_categories");
        Ok(self
            .working
            .categories
            .values()
            .filter(|c| c.parent_id == Some(parent))
            .cloned()
            .collect())
    }

    async fn add_category_item(&mut self, category: CategoryId, item: ItemId) -> Result<()> {
        self.record("add_category_item");
        self.working.item(item)?;
        let stored = self
            .working
            .categories
            .get_mut(&category)
            .ok_or(StoreError::NotFound {
                entity: "Category",
                id: category.as_i64(),
            })?;
        stored.add_item(item);
        Ok(())
    }

    async fn find_delivery(&mut self, id: DeliveryId) -> Result<Option<Delivery>> {
        self.record("find_delivery");
        Ok(self.working.deliveries.get(&id).cloned())
    }

    async fn find_deliveries_by_ids(&mut self, ids: &[DeliveryId]) -> Result<Vec<Delivery>> {
        self.record("find_deliveries_by_ids");
        Ok(ids_in(&self.working.deliveries, ids))
    }

    async fn update_delivery(&mut self, delivery: &Delivery) -> Result<()> {
        self.record("update_delivery");
        match self.working.deliveries.get_mut(&delivery.id) {
            Some(stored) => {
                *stored = delivery.clone();
                Ok(())
            }
            None => Err(StoreError::NotFound {
                entity: "Delivery",
                id: delivery.id.as_i64(),
            }),
        }
    }

    async fn insert_order(&mut self, order: NewOrder) -> Result<Order> {
        self.record("insert_order");
        self.working.member(order.member_id)?;
        for line in &order.order_items {
            self.working.item(line.item_id)?;
        }

        let tables = &mut self.working;
        let order_id = OrderId::new(tables.next_id());
        let delivery_id = DeliveryId::new(tables.next_id());
        let line_ids = order
            .order_items
            .iter()
            .map(|_| OrderItemId::new(tables.next_id()))
            .collect();
        let order = order.with_ids(order_id, delivery_id, line_ids);

        tables.deliveries.insert(delivery_id, order.delivery.clone());
        for line in &order.order_items {
            tables.order_items.insert(line.id, line.clone());
        }
        tables.orders.insert(
            order_id,
            OrderRow {
                id: order_id,
                member_id: order.member_id,
                delivery_id,
                order_date: order.order_date,
                status: order.status(),
            },
        );
        Ok(order)
    }

    async fn find_order_row(&mut self, id: OrderId) -> Result<Option<OrderRow>> {
        self.record("find_order_row");
        Ok(self.working.orders.get(&id).cloned())
    }

    async fn find_order_rows(
        &mut self,
        search: &OrderSearch,
        page: Option<Page>,
    ) -> Result<Vec<OrderRow>> {
        self.record("find_order_rows");
        Ok(self.working.select_orders(search, page))
    }

    async fn find_order_rows_by_member(&mut self, member: MemberId) -> Result<Vec<OrderRow>> {
        self.record("find_order_rows_by_member");
        Ok(self
            .working
            .orders
            .values()
            .filter(|o| o.member_id == member)
            .cloned()
            .collect())
    }

    async fn update_order_status(&mut self, id: OrderId, status: OrderStatus) -> Result<()> {
        self.record("update_order_status");
        let order = self
            .working
            .orders
            .get_mut(&id)
            .ok_or(StoreError::NotFound {
                entity: "Order",
                id: id.as_i64(),
            })?;
        order.status = status;
        Ok(())
    }

    async fn find_order_items(&mut self, order: OrderId) -> Result<Vec<OrderItem>> {
        self.record("find_order_items");
        Ok(self.working.lines_of(order).cloned().collect())
    }

    async fn find_order_items_in(&mut self, orders: &[OrderId]) -> Result<Vec<OrderItem>> {
        self.record("find_order_items_in");
        let wanted: HashSet<&OrderId> = orders.iter().collect();
        Ok(self
            .working
            .order_items
            .values()
            .filter(|line| wanted.contains(&line.order_id))
            .cloned()
            .collect())
    }

    async fn find_orders_with_member_delivery(
        &mut self,
        search: &OrderSearch,
        page: Option<Page>,
    ) -> Result<Vec<OrderMemberDeliveryRow>> {
        self.record("find_orders_with_member_delivery");
        let tables = &self.working;
        tables
            .select_orders(search, page)
            .into_iter()
            .map(|order| {
                Ok(OrderMemberDeliveryRow {
                    member: tables.member(order.member_id)?.clone(),
                    delivery: tables.delivery(order.delivery_id)?.clone(),
                    order,
                })
            })
            .collect()
    }

    async fn find_orders_with_items(
        &mut self,
        search: &OrderSearch,
    ) -> Result<Vec<OrderItemJoinRow>> {
        self.record("find_orders_with_items");
        let tables = &self.working;
        let mut rows = Vec::new();
        for order in tables.select_orders(search, None) {
            let member = tables.member(order.member_id)?;
            let delivery = tables.delivery(order.delivery_id)?;
            for line in tables.lines_of(order.id) {
                rows.push(OrderItemJoinRow {
                    order: order.clone(),
                    member: member.clone(),
                    delivery: delivery.clone(),
                    order_item: line.clone(),
                    item: tables.item(line.item_id)?.clone(),
                });
            }
        }
        Ok(rows)
    }

    async fn find_order_query_rows(
        &mut self,
        search: &OrderSearch,
        page: Option<Page>,
    ) -> Result<Vec<OrderQueryRow>> {
        self.record("find_order_query_rows");
        let tables = &self.working;
        tables
            .select_orders(search, page)
            .iter()
            .map(|order| tables.query_row(order))
            .collect()
    }

    async fn find_order_item_query_rows(
        &mut self,
        order: OrderId,
    ) -> Result<Vec<OrderItemQueryRow>> {
        self.record("find_order_item_query_rows");
        let tables = &self.working;
        tables
            .lines_of(order)
            .map(|line| tables.item_query_row(line))
            .collect()
    }

    async fn find_order_item_query_rows_in(
        &mut self,
        orders: &[OrderId],
    ) -> Result<Vec<OrderItemQueryRow>> {
        self.record("find_order_item_query_rows_in");
        let tables = &self.working;
        let wanted: HashSet<&OrderId> = orders.iter().collect();
        tables
            .order_items
            .values()
            .filter(|line| wanted.contains(&line.order_id))
            .map(|line| tables.item_query_row(line))
            .collect()
    }

    async fn find_order_flat_rows(&mut self, search: &OrderSearch) -> Result<Vec<OrderFlatRow>> {
        self.record("find_order_flat_rows");
        let tables = &self.working;
        let mut rows = Vec::new();
        for order in tables.select_orders(search, None) {
            let header = tables.query_row(&order)?;
            for line in tables.lines_of(order.id) {
                let line = tables.item_query_row(line)?;
                rows.push(OrderFlatRow {
                    order_id: header.order_id,
                    name: header.name.clone(),
                    order_date: header.order_date,
                    order_status: header.order_status,
                    address: header.address.clone(),
                    item_name: line.item_name,
                    order_price: line.order_price,
                    count: line.count,
                });
            }
        }
        Ok(rows)
    }
}

/// Rows whose keys appear in `ids`, in key order, without duplicates.
fn ids_in<K: Ord + std::hash::Hash, V: Clone>(table: &BTreeMap<K, V>, ids: &[K]) -> Vec<V> {
    let wanted: HashSet<&K> = ids.iter().collect();
    table
        .iter()
        .filter(|(id, _)| wanted.contains(id))
        .map(|(_, row)| row.clone())
        .collect()
}
