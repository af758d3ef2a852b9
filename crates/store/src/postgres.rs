use async_trait::async_trait;
use common::{CategoryId, DeliveryId, ItemId, MemberId, OrderId, OrderItemId};
use domain::{
    Address, Category, Delivery, DeliveryStatus, Item, ItemKind, Member, Money, NewCategory,
    NewItem, NewMember, NewOrder, Order, OrderItem, OrderStatus,
};
use sqlx::postgres::{PgArguments, PgRow};
use sqlx::query::Query;
use sqlx::{PgPool, Postgres, Row};

use crate::query::sql_window;
use crate::{
    OrderFlatRow, OrderItemJoinRow, OrderItemQueryRow, OrderMemberDeliveryRow, OrderQueryRow,
    OrderRow, OrderSearch, Page, Result, StoreError,
    store::{Store, Transaction},
};

const MEMBER_COLUMNS: &str = "m.member_id AS m_id, m.name AS m_name, m.city AS m_city, \
     m.street AS m_street, m.zipcode AS m_zipcode";

const DELIVERY_COLUMNS: &str = "d.delivery_id AS d_id, d.city AS d_city, d.street AS d_street, \
     d.zipcode AS d_zipcode, d.status AS d_status";

const ORDER_COLUMNS: &str = "o.order_id AS o_id, o.member_id AS o_member_id, \
     o.delivery_id AS o_delivery_id, o.order_date AS o_order_date, o.status AS o_status";

const ITEM_COLUMNS: &str = "i.item_id AS i_id, i.dtype AS i_dtype, i.name AS i_name, \
     i.price AS i_price, i.stock_quantity AS i_stock, i.author AS i_author, i.isbn AS i_isbn, \
     i.artist AS i_artist, i.etc AS i_etc, i.director AS i_director, i.actor AS i_actor";

const ORDER_ITEM_COLUMNS: &str = "oi.order_item_id AS oi_id, oi.order_id AS oi_order_id, \
     oi.item_id AS oi_item_id, oi.order_price AS oi_order_price, oi.count AS oi_count";

const CATEGORY_COLUMNS: &str = "c.category_id AS c_id, c.name AS c_name, c.parent_id AS c_parent_id, \
     COALESCE(ARRAY(SELECT ci.item_id FROM category_item ci \
     WHERE ci.category_id = c.category_id ORDER BY ci.item_id), '{}') AS c_item_ids";

/// PostgreSQL-backed store implementation.
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Creates a new PostgreSQL store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl Store for PostgresStore {
    type Tx = PostgresTransaction;

    async fn begin(&self) -> Result<Self::Tx> {
        Ok(PostgresTransaction {
            tx: self.pool.begin().await?,
            queries: 0,
        })
    }
}

/// Unit of work backed by a database transaction.
///
/// Dropping it without [`Transaction::commit`] rolls back.
pub struct PostgresTransaction {
    tx: sqlx::Transaction<'static, Postgres>,
    queries: u64,
}

impl PostgresTransaction {
    fn record(&mut self, query: &'static str) {
        self.queries += 1;
        metrics::counter!("store_queries_total", "query" => query).increment(1);
        tracing::trace!(query, "postgres query");
    }
}

// -- row mapping --

fn to_u32(value: i32, column: &str) -> Result<u32> {
    u32::try_from(value).map_err(|_| StoreError::InvalidData(format!("negative {column}: {value}")))
}

fn to_i32(value: u32, column: &str) -> Result<i32> {
    i32::try_from(value).map_err(|_| StoreError::InvalidData(format!("{column} too large: {value}")))
}

fn order_status(value: &str) -> Result<OrderStatus> {
    OrderStatus::parse(value)
        .ok_or_else(|| StoreError::InvalidData(format!("unknown order status: {value}")))
}

fn delivery_status(value: &str) -> Result<DeliveryStatus> {
    DeliveryStatus::parse(value)
        .ok_or_else(|| StoreError::InvalidData(format!("unknown delivery status: {value}")))
}

fn member_from_row(row: &PgRow) -> Result<Member> {
    Ok(Member {
        id: MemberId::new(row.try_get("m_id")?),
        name: row.try_get("m_name")?,
        address: Address::new(
            row.try_get::<String, _>("m_city")?,
            row.try_get::<String, _>("m_street")?,
            row.try_get::<String, _>("m_zipcode")?,
        ),
    })
}

fn delivery_from_row(row: &PgRow) -> Result<Delivery> {
    Ok(Delivery {
        id: DeliveryId::new(row.try_get("d_id")?),
        address: delivery_address(row)?,
        status: delivery_status(row.try_get("d_status")?)?,
    })
}

fn delivery_address(row: &PgRow) -> Result<Address> {
    Ok(Address::new(
        row.try_get::<String, _>("d_city")?,
        row.try_get::<String, _>("d_street")?,
        row.try_get::<String, _>("d_zipcode")?,
    ))
}

fn order_from_row(row: &PgRow) -> Result<OrderRow> {
    Ok(OrderRow {
        id: OrderId::new(row.try_get("o_id")?),
        member_id: MemberId::new(row.try_get("o_member_id")?),
        delivery_id: DeliveryId::new(row.try_get("o_delivery_id")?),
        order_date: row.try_get("o_order_date")?,
        status: order_status(row.try_get("o_status")?)?,
    })
}

fn item_from_row(row: &PgRow) -> Result<Item> {
    let text = |column: &str| -> Result<String> {
        Ok(row
            .try_get::<Option<String>, _>(column)?
            .unwrap_or_default())
    };
    let dtype: String = row.try_get("i_dtype")?;
    let kind = match dtype.as_str() {
        "B" => ItemKind::Book {
            author: text("i_author")?,
            isbn: text("i_isbn")?,
        },
        "A" => ItemKind::Album {
            artist: text("i_artist")?,
            etc: text("i_etc")?,
        },
        "M" => ItemKind::Movie {
            director: text("i_director")?,
            actor: text("i_actor")?,
        },
        other => return Err(StoreError::InvalidData(format!("unknown item dtype: {other}"))),
    };

    Ok(Item::from_parts(
        ItemId::new(row.try_get("i_id")?),
        row.try_get::<String, _>("i_name")?,
        Money::new(row.try_get("i_price")?),
        to_u32(row.try_get("i_stock")?, "stock_quantity")?,
        kind,
    ))
}

fn order_item_from_row(row: &PgRow) -> Result<OrderItem> {
    Ok(OrderItem {
        id: OrderItemId::new(row.try_get("oi_id")?),
        order_id: OrderId::new(row.try_get("oi_order_id")?),
        item_id: ItemId::new(row.try_get("oi_item_id")?),
        order_price: Money::new(row.try_get("oi_order_price")?),
        count: to_u32(row.try_get("oi_count")?, "count")?,
    })
}

fn category_from_row(row: &PgRow) -> Result<Category> {
    let item_ids: Vec<i64> = row.try_get("c_item_ids")?;
    Ok(Category {
        id: CategoryId::new(row.try_get("c_id")?),
        name: row.try_get("c_name")?,
        parent_id: row
            .try_get::<Option<i64>, _>("c_parent_id")?
            .map(CategoryId::new),
        item_ids: item_ids.into_iter().map(ItemId::new).collect(),
    })
}

fn query_row_from_row(row: &PgRow) -> Result<OrderQueryRow> {
    Ok(OrderQueryRow {
        order_id: OrderId::new(row.try_get("o_id")?),
        name: row.try_get("m_name")?,
        order_date: row.try_get("o_order_date")?,
        order_status: order_status(row.try_get("o_status")?)?,
        address: delivery_address(row)?,
    })
}

fn item_query_row_from_row(row: &PgRow) -> Result<OrderItemQueryRow> {
    Ok(OrderItemQueryRow {
        order_id: OrderId::new(row.try_get("oi_order_id")?),
        item_name: row.try_get("i_name")?,
        order_price: Money::new(row.try_get("oi_order_price")?),
        count: to_u32(row.try_get("oi_count")?, "count")?,
    })
}

fn map_write_error(e: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(ref db_err) = e
        && db_err.is_unique_violation()
    {
        return StoreError::UniqueViolation {
            constraint: db_err.constraint().unwrap_or_default().to_string(),
        };
    }
    StoreError::Database(e)
}

fn ensure_found(rows_affected: u64, entity: &'static str, id: i64) -> Result<()> {
    if rows_affected == 0 {
        return Err(StoreError::NotFound { entity, id });
    }
    Ok(())
}

// -- order search --

/// Appends the `WHERE` clause for `search`, numbering parameters from
/// `param_count + 1`.
fn push_search(sql: &mut String, search: &OrderSearch, param_count: &mut usize) {
    sql.push_str(" WHERE 1=1");
    if search.status.is_some() {
        *param_count += 1;
        sql.push_str(&format!(" AND o.status = ${param_count}"));
    }
    if search.member_name_filter().is_some() {
        *param_count += 1;
        sql.push_str(&format!(" AND strpos(m.name, ${param_count}) > 0"));
    }
}

/// Appends ordering and the offset/limit window.
fn push_window(sql: &mut String, param_count: &mut usize) {
    sql.push_str(" ORDER BY o.order_id ASC");
    *param_count += 1;
    sql.push_str(&format!(" LIMIT ${param_count}"));
    *param_count += 1;
    sql.push_str(&format!(" OFFSET ${param_count}"));
}

fn bind_search<'q>(
    mut query: Query<'q, Postgres, PgArguments>,
    search: &'q OrderSearch,
) -> Query<'q, Postgres, PgArguments> {
    if let Some(status) = search.status {
        query = query.bind(status.as_str());
    }
    if let Some(name) = search.member_name_filter() {
        query = query.bind(name);
    }
    query
}

fn bind_window(
    query: Query<'_, Postgres, PgArguments>,
    page: Option<Page>,
) -> Query<'_, Postgres, PgArguments> {
    let (limit, offset) = sql_window(page);
    query.bind(limit).bind(offset)
}

#[async_trait]
impl Transaction for PostgresTransaction {
    fn query_count(&self) -> u64 {
        self.queries
    }

    async fn commit(self) -> Result<()> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn insert_member(&mut self, member: NewMember) -> Result<Member> {
        self.record("insert_member");
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO member (name, city, street, zipcode)
            VALUES ($1, $2, $3, $4)
            RETURNING member_id
            "#,
        )
        .bind(&member.name)
        .bind(member.address.city())
        .bind(member.address.street())
        .bind(member.address.zipcode())
        .fetch_one(&mut *self.tx)
        .await
        .map_err(map_write_error)?;

        Ok(member.with_id(MemberId::new(id)))
    }

    async fn find_member(&mut self, id: MemberId) -> Result<Option<Member>> {
        self.record("find_member");
        let sql = format!("SELECT {MEMBER_COLUMNS} FROM member m WHERE m.member_id = $1");
        let row = sqlx::query(&sql)
            .bind(id.as_i64())
            .fetch_optional(&mut *self.tx)
            .await?;
        row.as_ref().map(member_from_row).transpose()
    }

    async fn find_all_members(&mut self) -> Result<Vec<Member>> {
        self.record("find_all_members");
        let sql = format!("SELECT {MEMBER_COLUMNS} FROM member m ORDER BY m.member_id");
        let rows = sqlx::query(&sql).fetch_all(&mut *self.tx).await?;
        rows.iter().map(member_from_row).collect()
    }

    async fn find_members_by_name(&mut self, name: &str) -> Result<Vec<Member>> {
        self.record("find_members_by_name");
        let sql = format!("SELECT {MEMBER_COLUMNS} FROM member m WHERE m.name = $1");
        let rows = sqlx::query(&sql)
            .bind(name)
            .fetch_all(&mut *self.tx)
            .await?;
        rows.iter().map(member_from_row).collect()
    }

    async fn update_member(&mut self, member: &Member) -> Result<()> {
        self.record("update_member");
        let result = sqlx::query(
            r#"
            UPDATE member SET name = $2, city = $3, street = $4, zipcode = $5
            WHERE member_id = $1
            "#,
        )
        .bind(member.id.as_i64())
        .bind(&member.name)
        .bind(member.address.city())
        .bind(member.address.street())
        .bind(member.address.zipcode())
        .execute(&mut *self.tx)
        .await
        .map_err(map_write_error)?;

        ensure_found(result.rows_affected(), "Member", member.id.as_i64())
    }

    async fn insert_item(&mut self, item: NewItem) -> Result<Item> {
        self.record("insert_item");
        let (author, isbn, artist, etc, director, actor) = match &item.kind {
            ItemKind::Book { author, isbn } => (Some(author), Some(isbn), None, None, None, None),
            ItemKind::Album { artist, etc } => (None, None, Some(artist), Some(etc), None, None),
            ItemKind::Movie { director, actor } => {
                (None, None, None, None, Some(director), Some(actor))
            }
        };
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO item (dtype, name, price, stock_quantity, author, isbn, artist, etc, director, actor)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING item_id
            "#,
        )
        .bind(item.kind.dtype())
        .bind(&item.name)
        .bind(item.price.amount())
        .bind(to_i32(item.stock_quantity, "stock_quantity")?)
        .bind(author)
        .bind(isbn)
        .bind(artist)
        .bind(etc)
        .bind(director)
        .bind(actor)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(map_write_error)?;

        Ok(item.with_id(ItemId::new(id)))
    }

    async fn find_item(&mut self, id: ItemId) -> Result<Option<Item>> {
        self.record("find_item");
        let sql = format!("SELECT {ITEM_COLUMNS} FROM item i WHERE i.item_id = $1");
        let row = sqlx::query(&sql)
            .bind(id.as_i64())
            .fetch_optional(&mut *self.tx)
            .await?;
        row.as_ref().map(item_from_row).transpose()
    }

    async fn find_items_by_ids(&mut self, ids: &[ItemId]) -> Result<Vec<Item>> {
        self.record("find_items_by_ids");
        let keys: Vec<i64> = ids.iter().map(ItemId::as_i64).collect();
        let sql =
            format!("SELECT {ITEM_COLUMNS} FROM item i WHERE i.item_id = ANY($1) ORDER BY i.item_id");
        let rows = sqlx::query(&sql)
            .bind(keys)
            .fetch_all(&mut *self.tx)
            .await?;
        rows.iter().map(item_from_row).collect()
    }

    async fn lock_items_by_ids(&mut self, ids: &[ItemId]) -> Result<Vec<Item>> {
        self.record("lock_items_by_ids");
        let keys: Vec<i64> = ids.iter().map(ItemId::as_i64).collect();
        let sql = format!(
            "SELECT {ITEM_COLUMNS} FROM item i WHERE i.item_id = ANY($1) ORDER BY i.item_id FOR UPDATE"
        );
        let rows = sqlx::query(&sql)
            .bind(keys)
            .fetch_all(&mut *self.tx)
            .await?;
        rows.iter().map(item_from_row).collect()
    }

    async fn find_all_items(&mut self) -> Result<Vec<Item>> {
        self.record("find_all_items");
        let sql = format!("SELECT {ITEM_COLUMNS} FROM item i ORDER BY i.item_id");
        let rows = sqlx::query(&sql).fetch_all(&mut *self.tx).await?;
        rows.iter().map(item_from_row).collect()
    }

    async fn update_item(&mut self, item: &Item) -> Result<()> {
        self.record("update_item");
        let result = sqlx::query(
            "UPDATE item SET name = $2, price = $3, stock_quantity = $4 WHERE item_id = $1",
        )
        .bind(item.id.as_i64())
        .bind(&item.name)
        .bind(item.price.amount())
        .bind(to_i32(item.stock_quantity(), "stock_quantity")?)
        .execute(&mut *self.tx)
        .await
        .map_err(map_write_error)?;

        ensure_found(result.rows_affected(), "Item", item.id.as_i64())
    }

    async fn insert_category(&mut self, category: NewCategory) -> Result<Category> {
        self.record("insert_category");
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO category (name, parent_id) VALUES ($1, $2) RETURNING category_id",
        )
        .bind(&category.name)
        .bind(category.parent_id.map(|p| p.as_i64()))
        .fetch_one(&mut *self.tx)
        .await
        .map_err(map_write_error)?;

        Ok(category.with_id(CategoryId::new(id)))
    }

    async fn find_category(&mut self, id: CategoryId) -> Result<Option<Category>> {
        self.record("find_category");
        let sql = format!("SELECT {CATEGORY_COLUMNS} FROM category c WHERE c.category_id = $1");
        let row = sqlx::query(&sql)
            .bind(id.as_i64())
            .fetch_optional(&mut *self.tx)
            .await?;
        row.as_ref().map(category_from_row).transpose()
    }

    async fn find_child_categories(&mut self, parent: CategoryId) -> Result<Vec<Category>> {
        self.record("find_child_categories");
        let sql = format!(
            "SELECT {CATEGORY_COLUMNS} FROM category c WHERE c.parent_id = $1 ORDER BY c.category_id"
        );
        let rows = sqlx::query(&sql)
            .bind(parent.as_i64())
            .fetch_all(&mut *self.tx)
            .await?;
        rows.iter().map(category_from_row).collect()
    }

    async fn add_category_item(&mut self, category: CategoryId, item: ItemId) -> Result<()> {
        self.record("add_category_item");
        sqlx::query(
            r#"
            INSERT INTO category_item (category_id, item_id)
            VALUES ($1, $2)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(category.as_i64())
        .bind(item.as_i64())
        .execute(&mut *self.tx)
        .await
        .map_err(map_write_error)?;
        Ok(())
    }

    async fn find_delivery(&mut self, id: DeliveryId) -> Result<Option<Delivery>> {
        self.record("find_delivery");
        let sql = format!("SELECT {DELIVERY_COLUMNS} FROM delivery d WHERE d.delivery_id = $1");
        let row = sqlx::query(&sql)
            .bind(id.as_i64())
            .fetch_optional(&mut *self.tx)
            .await?;
        row.as_ref().map(delivery_from_row).transpose()
    }

    async fn find_deliveries_by_ids(&mut self, ids: &[DeliveryId]) -> Result<Vec<Delivery>> {
        self.record("find_deliveries_by_ids");
        let keys: Vec<i64> = ids.iter().map(DeliveryId::as_i64).collect();
        let sql = format!(
            "SELECT {DELIVERY_COLUMNS} FROM delivery d WHERE d.delivery_id = ANY($1) ORDER BY d.delivery_id"
        );
        let rows = sqlx::query(&sql)
            .bind(keys)
            .fetch_all(&mut *self.tx)
            .await?;
        rows.iter().map(delivery_from_row).collect()
    }

    async fn update_delivery(&mut self, delivery: &Delivery) -> Result<()> {
        self.record("update_delivery");
        let result = sqlx::query(
            r#"
            UPDATE delivery SET city = $2, street = $3, zipcode = $4, status = $5
            WHERE delivery_id = $1
            "#,
        )
        .bind(delivery.id.as_i64())
        .bind(delivery.address.city())
        .bind(delivery.address.street())
        .bind(delivery.address.zipcode())
        .bind(delivery.status.as_str())
        .execute(&mut *self.tx)
        .await?;

        ensure_found(result.rows_affected(), "Delivery", delivery.id.as_i64())
    }

    async fn insert_order(&mut self, order: NewOrder) -> Result<Order> {
        self.record("insert_order");
        let delivery_id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO delivery (city, street, zipcode, status)
            VALUES ($1, $2, $3, $4)
            RETURNING delivery_id
            "#,
        )
        .bind(order.delivery.address.city())
        .bind(order.delivery.address.street())
        .bind(order.delivery.address.zipcode())
        .bind(order.delivery.status.as_str())
        .fetch_one(&mut *self.tx)
        .await?;

        let order_id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO orders (member_id, delivery_id, order_date, status)
            VALUES ($1, $2, $3, $4)
            RETURNING order_id
            "#,
        )
        .bind(order.member_id.as_i64())
        .bind(delivery_id)
        .bind(order.order_date)
        .bind(order.status.as_str())
        .fetch_one(&mut *self.tx)
        .await?;

        let mut line_ids = Vec::with_capacity(order.order_items.len());
        for line in &order.order_items {
            let line_id: i64 = sqlx::query_scalar(
                r#"
                INSERT INTO order_item (order_id, item_id, order_price, count)
                VALUES ($1, $2, $3, $4)
                RETURNING order_item_id
                "#,
            )
            .bind(order_id)
            .bind(line.item_id.as_i64())
            .bind(line.order_price.amount())
            .bind(to_i32(line.count, "count")?)
            .fetch_one(&mut *self.tx)
            .await?;
            line_ids.push(OrderItemId::new(line_id));
        }

        Ok(order.with_ids(
            OrderId::new(order_id),
            DeliveryId::new(delivery_id),
            line_ids,
        ))
    }

    async fn find_order_row(&mut self, id: OrderId) -> Result<Option<OrderRow>> {
        self.record("find_order_row");
        let sql = format!("SELECT {ORDER_COLUMNS} FROM orders o WHERE o.order_id = $1");
        let row = sqlx::query(&sql)
            .bind(id.as_i64())
            .fetch_optional(&mut *self.tx)
            .await?;
        row.as_ref().map(order_from_row).transpose()
    }

    async fn find_order_rows(
        &mut self,
        search: &OrderSearch,
        page: Option<Page>,
    ) -> Result<Vec<OrderRow>> {
        self.record("find_order_rows");
        let mut sql = format!(
            "SELECT {ORDER_COLUMNS} FROM orders o JOIN member m ON m.member_id = o.member_id"
        );
        let mut param_count = 0;
        push_search(&mut sql, search, &mut param_count);
        push_window(&mut sql, &mut param_count);

        let query = bind_window(bind_search(sqlx::query(&sql), search), page);
        let rows = query.fetch_all(&mut *self.tx).await?;
        rows.iter().map(order_from_row).collect()
    }

    async fn find_order_rows_by_member(&mut self, member: MemberId) -> Result<Vec<OrderRow>> {
        self.record("find_order_rows_by_member");
        let sql = format!(
            "SELECT {ORDER_COLUMNS} FROM orders o WHERE o.member_id = $1 ORDER BY o.order_id"
        );
        let rows = sqlx::query(&sql)
            .bind(member.as_i64())
            .fetch_all(&mut *self.tx)
            .await?;
        rows.iter().map(order_from_row).collect()
    }

    async fn update_order_status(&mut self, id: OrderId, status: OrderStatus) -> Result<()> {
        self.record("update_order_status");
        let result = sqlx::query("UPDATE orders SET status = $2 WHERE order_id = $1")
            .bind(id.as_i64())
            .bind(status.as_str())
            .execute(&mut *self.tx)
            .await?;

        ensure_found(result.rows_affected(), "Order", id.as_i64())
    }

    async fn find_order_items(&mut self, order: OrderId) -> Result<Vec<OrderItem>> {
        self.record("find_order_items");
        let sql = format!(
            "SELECT {ORDER_ITEM_COLUMNS} FROM order_item oi WHERE oi.order_id = $1 ORDER BY oi.order_item_id"
        );
        let rows = sqlx::query(&sql)
            .bind(order.as_i64())
            .fetch_all(&mut *self.tx)
            .await?;
        rows.iter().map(order_item_from_row).collect()
    }

    async fn find_order_items_in(&mut self, orders: &[OrderId]) -> Result<Vec<OrderItem>> {
        self.record("find_order_items_in");
        let keys: Vec<i64> = orders.iter().map(OrderId::as_i64).collect();
        let sql = format!(
            "SELECT {ORDER_ITEM_COLUMNS} FROM order_item oi WHERE oi.order_id = ANY($1) ORDER BY oi.order_item_id"
        );
        let rows = sqlx::query(&sql)
            .bind(keys)
            .fetch_all(&mut *self.tx)
            .await?;
        rows.iter().map(order_item_from_row).collect()
    }

    async fn find_orders_with_member_delivery(
        &mut self,
        search: &OrderSearch,
        page: Option<Page>,
    ) -> Result<Vec<OrderMemberDeliveryRow>> {
        self.record("find_orders_with_member_delivery");
        let mut sql = format!(
            "SELECT {ORDER_COLUMNS}, {MEMBER_COLUMNS}, {DELIVERY_COLUMNS} \
             FROM orders o \
             JOIN member m ON m.member_id = o.member_id \
             JOIN delivery d ON d.delivery_id = o.delivery_id"
        );
        let mut param_count = 0;
        push_search(&mut sql, search, &mut param_count);
        push_window(&mut sql, &mut param_count);

        let query = bind_window(bind_search(sqlx::query(&sql), search), page);
        let rows = query.fetch_all(&mut *self.tx).await?;
        rows.iter()
            .map(|row| {
                Ok(OrderMemberDeliveryRow {
                    order: order_from_row(row)?,
                    member: member_from_row(row)?,
                    delivery: delivery_from_row(row)?,
                })
            })
            .collect()
    }

    async fn find_orders_with_items(
        &mut self,
        search: &OrderSearch,
    ) -> Result<Vec<OrderItemJoinRow>> {
        self.record("find_orders_with_items");
        let mut sql = format!(
            "SELECT {ORDER_COLUMNS}, {MEMBER_COLUMNS}, {DELIVERY_COLUMNS}, {ORDER_ITEM_COLUMNS}, {ITEM_COLUMNS} \
             FROM orders o \
             JOIN member m ON m.member_id = o.member_id \
             JOIN delivery d ON d.delivery_id = o.delivery_id \
             JOIN order_item oi ON oi.order_id = o.order_id \
             JOIN item i ON i.item_id = oi.item_id"
        );
        let mut param_count = 0;
        push_search(&mut sql, search, &mut param_count);
        sql.push_str(" ORDER BY o.order_id ASC, oi.order_item_id ASC");

        let rows = bind_search(sqlx::query(&sql), search)
            .fetch_all(&mut *self.tx)
            .await?;
        rows.iter()
            .map(|row| {
                Ok(OrderItemJoinRow {
                    order: order_from_row(row)?,
                    member: member_from_row(row)?,
                    delivery: delivery_from_row(row)?,
                    order_item: order_item_from_row(row)?,
                    item: item_from_row(row)?,
                })
            })
            .collect()
    }

    async fn find_order_query_rows(
        &mut self,
        search: &OrderSearch,
        page: Option<Page>,
    ) -> Result<Vec<OrderQueryRow>> {
        self.record("find_order_query_rows");
        let mut sql = format!(
            "SELECT {ORDER_COLUMNS}, m.name AS m_name, {DELIVERY_COLUMNS} \
             FROM orders o \
             JOIN member m ON m.member_id = o.member_id \
             JOIN delivery d ON d.delivery_id = o.delivery_id"
        );
        let mut param_count = 0;
        push_search(&mut sql, search, &mut param_count);
        push_window(&mut sql, &mut param_count);

        let query = bind_window(bind_search(sqlx::query(&sql), search), page);
        let rows = query.fetch_all(&mut *self.tx).await?;
        rows.iter().map(query_row_from_row).collect()
    }

    async fn find_order_item_query_rows(
        &mut self,
        order: OrderId,
    ) -> Result<Vec<OrderItemQueryRow>> {
        self.record("find_order_item_query_rows");
        let rows = sqlx::query(
            r#"
            SELECT oi.order_id AS oi_order_id, i.name AS i_name,
                   oi.order_price AS oi_order_price, oi.count AS oi_count
            FROM order_item oi
            JOIN item i ON i.item_id = oi.item_id
            WHERE oi.order_id = $1
            ORDER BY oi.order_item_id
            "#,
        )
        .bind(order.as_i64())
        .fetch_all(&mut *self.tx)
        .await?;
        rows.iter().map(item_query_row_from_row).collect()
    }

    async fn find_order_item_query_rows_in(
        &mut self,
        orders: &[OrderId],
    ) -> Result<Vec<OrderItemQueryRow>> {
        self.record("find_order_item_query_rows_in");
        let keys: Vec<i64> = orders.iter().map(OrderId::as_i64).collect();
        let rows = sqlx::query(
            r#"
            SELECT oi.order_id AS oi_order_id, i.name AS i_name,
                   oi.order_price AS oi_order_price, oi.count AS oi_count
            FROM order_item oi
            JOIN item i ON i.item_id = oi.item_id
            WHERE oi.order_id = ANY($1)
            ORDER BY oi.order_item_id
            "#,
        )
        .bind(keys)
        .fetch_all(&mut *self.tx)
        .await?;
        rows.iter().map(item_query_row_from_row).collect()
    }

    async fn find_order_flat_rows(&mut self, search: &OrderSearch) -> Result<Vec<OrderFlatRow>> {
        self.record("find_order_flat_rows");
        let mut sql = format!(
            "SELECT {ORDER_COLUMNS}, m.name AS m_name, {DELIVERY_COLUMNS}, \
                    oi.order_id AS oi_order_id, i.name AS i_name, \
                    oi.order_price AS oi_order_price, oi.count AS oi_count \
             FROM orders o \
             JOIN member m ON m.member_id = o.member_id \
             JOIN delivery d ON d.delivery_id = o.delivery_id \
             JOIN order_item oi ON oi.order_id = o.order_id \
             JOIN item i ON i.item_id = oi.item_id"
        );
        let mut param_count = 0;
        push_search(&mut sql, search, &mut param_count);
        sql.push_str(" ORDER BY o.order_id ASC, oi.order_item_id ASC");

        let rows = bind_search(sqlx::query(&sql), search)
            .fetch_all(&mut *self.tx)
            .await?;
        rows.iter()
            .map(|row| {
                let header = query_row_from_row(row)?;
                let line = item_query_row_from_row(row)?;
                Ok(OrderFlatRow {
                    order_id: header.order_id,
                    name: header.name,
                    order_date: header.order_date,
                    order_status: header.order_status,
                    address: header.address,
                    item_name: line.item_name,
                    order_price: line.order_price,
                    count: line.count,
                })
            })
            .collect()
    }
}
