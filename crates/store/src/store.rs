use async_trait::async_trait;
use common::{CategoryId, DeliveryId, ItemId, MemberId, OrderId};
use domain::{
    Category, Delivery, Item, Member, NewCategory, NewItem, NewMember, NewOrder, Order, OrderItem,
    OrderStatus,
};

use crate::{
    OrderFlatRow, OrderItemJoinRow, OrderItemQueryRow, OrderMemberDeliveryRow, OrderQueryRow,
    OrderRow, OrderSearch, Page, Result,
};

/// Source of units of work.
///
/// Implementations must be cheap to clone and safe to share across request
/// handlers.
#[async_trait]
pub trait Store: Send + Sync {
    /// The unit of work handed out by [`Store::begin`].
    type Tx: Transaction;

    /// Starts a new transaction.
    async fn begin(&self) -> Result<Self::Tx>;
}

/// A transaction-scoped unit of work.
///
/// Every method is one logical statement against the backing storage and
/// bumps [`Transaction::query_count`] once; cascading writes such as
/// [`Transaction::insert_order`] count as a single statement. Nothing is
/// loaded implicitly: callers ask for each association they need.
#[async_trait]
pub trait Transaction: Send {
    /// Number of queries issued so far.
    fn query_count(&self) -> u64;

    /// Makes all writes of this transaction durable.
    async fn commit(self) -> Result<()>;

    // -- members --

    /// Inserts a member. Fails with `UniqueViolation` if the name is taken.
    async fn insert_member(&mut self, member: NewMember) -> Result<Member>;

    async fn find_member(&mut self, id: MemberId) -> Result<Option<Member>>;

    async fn find_all_members(&mut self) -> Result<Vec<Member>>;

    /// Exact name match.
    async fn find_members_by_name(&mut self, name: &str) -> Result<Vec<Member>>;

    async fn update_member(&mut self, member: &Member) -> Result<()>;

    // -- items --

    async fn insert_item(&mut self, item: NewItem) -> Result<Item>;

    async fn find_item(&mut self, id: ItemId) -> Result<Option<Item>>;

    /// Loads several items with one `IN` query.
    async fn find_items_by_ids(&mut self, ids: &[ItemId]) -> Result<Vec<Item>>;

    /// Like [`Transaction::find_items_by_ids`], but holds the rows until the
    /// transaction ends so concurrent stock changes serialize.
    async fn lock_items_by_ids(&mut self, ids: &[ItemId]) -> Result<Vec<Item>>;

    async fn find_all_items(&mut self) -> Result<Vec<Item>>;

    async fn update_item(&mut self, item: &Item) -> Result<()>;

    // -- categories --

    async fn insert_category(&mut self, category: NewCategory) -> Result<Category>;

    async fn find_category(&mut self, id: CategoryId) -> Result<Option<Category>>;

    async fn find_child_categories(&mut self, parent: CategoryId) -> Result<Vec<Category>>;

    async fn add_category_item(&mut self, category: CategoryId, item: ItemId) -> Result<()>;

    // -- deliveries --

    async fn find_delivery(&mut self, id: DeliveryId) -> Result<Option<Delivery>>;

    /// Loads several deliveries with one `IN` query.
    async fn find_deliveries_by_ids(&mut self, ids: &[DeliveryId]) -> Result<Vec<Delivery>>;

    async fn update_delivery(&mut self, delivery: &Delivery) -> Result<()>;

    // -- orders --

    /// Inserts the order together with its delivery and order items.
    async fn insert_order(&mut self, order: NewOrder) -> Result<Order>;

    async fn find_order_row(&mut self, id: OrderId) -> Result<Option<OrderRow>>;

    /// Order roots matching `search`, joined to member for the name filter only.
    async fn find_order_rows(
        &mut self,
        search: &OrderSearch,
        page: Option<Page>,
    ) -> Result<Vec<OrderRow>>;

    async fn find_order_rows_by_member(&mut self, member: MemberId) -> Result<Vec<OrderRow>>;

    async fn update_order_status(&mut self, id: OrderId, status: OrderStatus) -> Result<()>;

    async fn find_order_items(&mut self, order: OrderId) -> Result<Vec<OrderItem>>;

    /// Order items of several orders with one `IN` query.
    async fn find_order_items_in(&mut self, orders: &[OrderId]) -> Result<Vec<OrderItem>>;

    // -- join projections --

    /// Orders with member and delivery fetched in the same query.
    async fn find_orders_with_member_delivery(
        &mut self,
        search: &OrderSearch,
        page: Option<Page>,
    ) -> Result<Vec<OrderMemberDeliveryRow>>;

    /// Orders joined all the way to their items; one row per order item.
    ///
    /// Rows multiply by the number of lines, so this query has no page
    /// parameter.
    async fn find_orders_with_items(&mut self, search: &OrderSearch)
    -> Result<Vec<OrderItemJoinRow>>;

    /// Order headers joined to member and delivery, one row per order.
    async fn find_order_query_rows(
        &mut self,
        search: &OrderSearch,
        page: Option<Page>,
    ) -> Result<Vec<OrderQueryRow>>;

    async fn find_order_item_query_rows(&mut self, order: OrderId)
    -> Result<Vec<OrderItemQueryRow>>;

    async fn find_order_item_query_rows_in(
        &mut self,
        orders: &[OrderId],
    ) -> Result<Vec<OrderItemQueryRow>>;

    /// Header and line columns in one join; one row per order item.
    async fn find_order_flat_rows(&mut self, search: &OrderSearch) -> Result<Vec<OrderFlatRow>>;
}

/// Convenience methods composed from the primitive queries.
#[async_trait]
pub trait TransactionExt: Transaction {
    /// Loads a complete order aggregate: root, delivery and order items.
    async fn load_order(&mut self, id: OrderId) -> Result<Option<Order>> {
        let Some(row) = self.find_order_row(id).await? else {
            return Ok(None);
        };
        let delivery = self
            .find_delivery(row.delivery_id)
            .await?
            .ok_or(crate::StoreError::NotFound {
                entity: "Delivery",
                id: row.delivery_id.as_i64(),
            })?;
        let order_items = self.find_order_items(id).await?;

        Ok(Some(Order::from_parts(
            row.id,
            row.member_id,
            delivery,
            order_items,
            row.order_date,
            row.status,
        )))
    }

    /// Checks whether a member with exactly this name exists.
    async fn member_name_taken(&mut self, name: &str) -> Result<bool> {
        Ok(!self.find_members_by_name(name).await?.is_empty())
    }
}

impl<T: Transaction> TransactionExt for T {}
