//! Order listings, one function per strategy.
//!
//! Every function runs inside the caller's transaction and returns orders in
//! order-id order.

use std::collections::{BTreeMap, HashMap};

use common::{ItemId, OrderId};
use domain::{Address, Item, Member};
use store::{OrderRow, OrderSearch, Page, StoreError, Transaction};

use crate::context::LoadedEntities;
use crate::dto::{OrderDto, OrderFlatDto, OrderItemDto, OrderItemQueryDto, OrderQueryDto};
use crate::strategy::OrderReadStrategy;
use crate::view::{OrderEntityView, OrderItemEntityView};
use crate::{ProjectionError, Result};

/// Reads orders with the given strategy.
///
/// Fails with [`ProjectionError::PaginationUnsupported`] before issuing any
/// query when a page is requested from a strategy that cannot honour it.
pub async fn read_orders<T: Transaction>(
    tx: &mut T,
    strategy: OrderReadStrategy,
    search: &OrderSearch,
    page: Option<Page>,
) -> Result<Vec<OrderDto>> {
    if page.is_some() && !strategy.is_pagination_safe() {
        return Err(ProjectionError::PaginationUnsupported {
            strategy: strategy.name(),
        });
    }

    match strategy {
        OrderReadStrategy::EntityGraph | OrderReadStrategy::EntityDto => {
            let views = entity_graph(tx, search, page).await?;
            Ok(views.into_iter().map(OrderDto::from).collect())
        }
        OrderReadStrategy::ToOneFetchJoin => to_one_fetch_join(tx, search, page).await,
        OrderReadStrategy::FullFetchJoin => full_fetch_join(tx, search).await,
        OrderReadStrategy::DtoPerOrder => {
            let dtos = dto_per_order(tx, search, page).await?;
            Ok(dtos.into_iter().map(OrderDto::from).collect())
        }
        OrderReadStrategy::DtoBatched => {
            let dtos = dto_batched(tx, search, page).await?;
            Ok(dtos.into_iter().map(OrderDto::from).collect())
        }
        OrderReadStrategy::FlatGrouped => {
            let dtos = flat_grouped(tx, search).await?;
            Ok(dtos.into_iter().map(OrderDto::from).collect())
        }
    }
}

/// Loads each order's member, delivery, lines and items one at a time.
pub async fn entity_graph<T: Transaction>(
    tx: &mut T,
    search: &OrderSearch,
    page: Option<Page>,
) -> Result<Vec<OrderEntityView>> {
    let rows = tx.find_order_rows(search, page).await?;
    let mut loaded = LoadedEntities::default();

    let mut views = Vec::with_capacity(rows.len());
    for row in rows {
        let member = loaded.member(tx, row.member_id).await?;
        let delivery = tx
            .find_delivery(row.delivery_id)
            .await?
            .ok_or(StoreError::NotFound {
                entity: "Delivery",
                id: row.delivery_id.as_i64(),
            })?;

        let lines = tx.find_order_items(row.id).await?;
        let mut order_items = Vec::with_capacity(lines.len());
        for line in lines {
            order_items.push(OrderItemEntityView {
                id: line.id,
                item: loaded.item(tx, line.item_id).await?,
                order_price: line.order_price,
                count: line.count,
            });
        }

        views.push(OrderEntityView {
            id: row.id,
            member,
            order_items,
            delivery,
            order_date: row.order_date,
            status: row.status,
        });
    }
    Ok(views)
}

impl From<OrderEntityView> for OrderDto {
    fn from(view: OrderEntityView) -> Self {
        Self {
            order_id: view.id,
            name: view.member.name,
            order_date: view.order_date,
            order_status: view.status,
            address: view.delivery.address,
            order_items: view
                .order_items
                .into_iter()
                .map(|line| OrderItemDto {
                    item_name: line.item.name,
                    order_price: line.order_price,
                    count: line.count,
                })
                .collect(),
        }
    }
}

/// Roots with member and delivery in one query, then lines and items in one
/// `IN` query each.
async fn to_one_fetch_join<T: Transaction>(
    tx: &mut T,
    search: &OrderSearch,
    page: Option<Page>,
) -> Result<Vec<OrderDto>> {
    let roots = tx.find_orders_with_member_delivery(search, page).await?;
    if roots.is_empty() {
        return Ok(Vec::new());
    }

    let order_ids: Vec<OrderId> = roots.iter().map(|root| root.order.id).collect();
    let lines = tx.find_order_items_in(&order_ids).await?;

    let mut item_ids: Vec<ItemId> = lines.iter().map(|line| line.item_id).collect();
    item_ids.sort();
    item_ids.dedup();
    let items: HashMap<ItemId, Item> = tx
        .find_items_by_ids(&item_ids)
        .await?
        .into_iter()
        .map(|item| (item.id, item))
        .collect();

    let mut lines_by_order: HashMap<OrderId, Vec<OrderItemDto>> = HashMap::new();
    for line in lines {
        let item = items.get(&line.item_id).ok_or(StoreError::NotFound {
            entity: "Item",
            id: line.item_id.as_i64(),
        })?;
        lines_by_order
            .entry(line.order_id)
            .or_default()
            .push(OrderItemDto {
                item_name: item.name.clone(),
                order_price: line.order_price,
                count: line.count,
            });
    }

    Ok(roots
        .into_iter()
        .map(|root| OrderDto {
            order_id: root.order.id,
            name: root.member.name,
            order_date: root.order.order_date,
            order_status: root.order.status,
            address: root.delivery.address,
            order_items: lines_by_order.remove(&root.order.id).unwrap_or_default(),
        })
        .collect())
}

/// One joined query; repeated order rows are collapsed by order id.
async fn full_fetch_join<T: Transaction>(
    tx: &mut T,
    search: &OrderSearch,
) -> Result<Vec<OrderDto>> {
    let rows = tx.find_orders_with_items(search).await?;

    let mut orders: BTreeMap<OrderId, OrderDto> = BTreeMap::new();
    for row in rows {
        let line = OrderItemDto {
            item_name: row.item.name,
            order_price: row.order_item.order_price,
            count: row.order_item.count,
        };
        orders
            .entry(row.order.id)
            .or_insert_with(|| order_header(&row.order, &row.member, row.delivery.address))
            .order_items
            .push(line);
    }
    Ok(orders.into_values().collect())
}

fn order_header(order: &OrderRow, member: &Member, address: Address) -> OrderDto {
    OrderDto {
        order_id: order.id,
        name: member.name.clone(),
        order_date: order.order_date,
        order_status: order.status,
        address,
        order_items: Vec::new(),
    }
}

/// Header projection, then one line query per order.
pub async fn dto_per_order<T: Transaction>(
    tx: &mut T,
    search: &OrderSearch,
    page: Option<Page>,
) -> Result<Vec<OrderQueryDto>> {
    let headers = tx.find_order_query_rows(search, page).await?;

    let mut dtos = Vec::with_capacity(headers.len());
    for header in headers {
        let mut dto = OrderQueryDto::header(header);
        dto.order_items = tx
            .find_order_item_query_rows(dto.order_id)
            .await?
            .into_iter()
            .map(OrderItemQueryDto::from)
            .collect();
        dtos.push(dto);
    }
    Ok(dtos)
}

/// Header projection, then one line query for all orders matched in memory.
pub async fn dto_batched<T: Transaction>(
    tx: &mut T,
    search: &OrderSearch,
    page: Option<Page>,
) -> Result<Vec<OrderQueryDto>> {
    let headers = tx.find_order_query_rows(search, page).await?;
    if headers.is_empty() {
        return Ok(Vec::new());
    }

    let order_ids: Vec<OrderId> = headers.iter().map(|header| header.order_id).collect();
    let mut lines_by_order: HashMap<OrderId, Vec<OrderItemQueryDto>> = HashMap::new();
    for line in tx.find_order_item_query_rows_in(&order_ids).await? {
        lines_by_order
            .entry(line.order_id)
            .or_default()
            .push(line.into());
    }

    Ok(headers
        .into_iter()
        .map(|header| {
            let mut dto = OrderQueryDto::header(header);
            dto.order_items = lines_by_order.remove(&dto.order_id).unwrap_or_default();
            dto
        })
        .collect())
}

/// The flat rows as stored, one per order line.
pub async fn flat_rows<T: Transaction>(
    tx: &mut T,
    search: &OrderSearch,
) -> Result<Vec<OrderFlatDto>> {
    Ok(tx
        .find_order_flat_rows(search)
        .await?
        .into_iter()
        .map(OrderFlatDto::from)
        .collect())
}

/// One flat join, grouped on order identity.
pub async fn flat_grouped<T: Transaction>(
    tx: &mut T,
    search: &OrderSearch,
) -> Result<Vec<OrderQueryDto>> {
    Ok(group_flat(flat_rows(tx, search).await?))
}

/// Groups flat records by order, keeping line order within each order.
pub fn group_flat(rows: Vec<OrderFlatDto>) -> Vec<OrderQueryDto> {
    let mut orders: BTreeMap<OrderId, OrderQueryDto> = BTreeMap::new();
    for row in rows {
        let (header, line) = row.split();
        orders
            .entry(header.order_id)
            .or_insert(header)
            .order_items
            .push(line);
    }
    orders.into_values().collect()
}
