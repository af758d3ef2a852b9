//! Order listings with member and delivery only.

use store::{OrderSearch, StoreError, Transaction};

use crate::Result;
use crate::context::LoadedEntities;
use crate::dto::{OrderSimpleQueryDto, SimpleOrderDto};
use crate::strategy::SimpleOrderStrategy;
use crate::view::SimpleOrderEntityView;

/// Reads orders without lines using the given strategy.
pub async fn read_simple_orders<T: Transaction>(
    tx: &mut T,
    strategy: SimpleOrderStrategy,
    search: &OrderSearch,
) -> Result<Vec<SimpleOrderDto>> {
    match strategy {
        SimpleOrderStrategy::EntityGraph | SimpleOrderStrategy::EntityDto => {
            let views = simple_entity_graph(tx, search).await?;
            Ok(views.into_iter().map(SimpleOrderDto::from).collect())
        }
        SimpleOrderStrategy::FetchJoin => simple_fetch_join(tx, search).await,
        SimpleOrderStrategy::DirectDto => {
            let dtos = simple_direct_dto(tx, search).await?;
            Ok(dtos.into_iter().map(SimpleOrderDto::from).collect())
        }
    }
}

/// Roots, then the member and delivery of each order.
pub async fn simple_entity_graph<T: Transaction>(
    tx: &mut T,
    search: &OrderSearch,
) -> Result<Vec<SimpleOrderEntityView>> {
    let rows = tx.find_order_rows(search, None).await?;
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
        views.push(SimpleOrderEntityView {
            id: row.id,
            member,
            delivery,
            order_date: row.order_date,
            status: row.status,
        });
    }
    Ok(views)
}

async fn simple_fetch_join<T: Transaction>(
    tx: &mut T,
    search: &OrderSearch,
) -> Result<Vec<SimpleOrderDto>> {
    Ok(tx
        .find_orders_with_member_delivery(search, None)
        .await?
        .into_iter()
        .map(|row| SimpleOrderDto {
            order_id: row.order.id,
            name: row.member.name,
            order_date: row.order.order_date,
            order_status: row.order.status,
            address: row.delivery.address,
        })
        .collect())
}

/// One projection query straight into DTOs.
pub async fn simple_direct_dto<T: Transaction>(
    tx: &mut T,
    search: &OrderSearch,
) -> Result<Vec<OrderSimpleQueryDto>> {
    Ok(tx
        .find_order_query_rows(search, None)
        .await?
        .into_iter()
        .map(OrderSimpleQueryDto::from)
        .collect())
}

impl From<SimpleOrderEntityView> for SimpleOrderDto {
    fn from(view: SimpleOrderEntityView) -> Self {
        Self {
            order_id: view.id,
            name: view.member.name,
            order_date: view.order_date,
            order_status: view.status,
            address: view.delivery.address,
        }
    }
}
