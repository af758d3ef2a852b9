//! Order placement and lifecycle endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use common::{ItemId, MemberId, OrderId};
use domain::{Delivery, Money, Order, OrderItem, OrderStatus};
use serde::{Deserialize, Serialize};
use store::Store;

use super::{AppState, SearchParams};
use crate::error::ApiError;

// -- Request types --

#[derive(Deserialize)]
pub struct CreateOrderRequest {
    pub member_id: MemberId,
    pub items: Vec<OrderLineRequest>,
}

#[derive(Deserialize)]
pub struct OrderLineRequest {
    pub item_id: ItemId,
    pub count: u32,
}

// -- Response types --

#[derive(Serialize)]
pub struct OrderCreatedResponse {
    pub order_id: OrderId,
}

#[derive(Serialize)]
pub struct OrderResponse {
    pub id: OrderId,
    pub member_id: MemberId,
    pub status: OrderStatus,
    pub order_date: DateTime<Utc>,
    pub delivery: Delivery,
    pub order_items: Vec<OrderItem>,
    pub total_price: Money,
}

impl From<Order> for OrderResponse {
    fn from(order: Order) -> Self {
        Self {
            id: order.id,
            member_id: order.member_id,
            status: order.status(),
            order_date: order.order_date,
            total_price: order.total_price(),
            delivery: order.delivery,
            order_items: order.order_items,
        }
    }
}

// -- Handlers --

/// POST /orders: place an order for a member.
#[tracing::instrument(skip(state, req), fields(member_id = %req.member_id))]
pub async fn create<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Json(req): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<OrderCreatedResponse>), ApiError> {
    let lines: Vec<(ItemId, u32)> = req
        .items
        .iter()
        .map(|line| (line.item_id, line.count))
        .collect();

    let order_id = state.orders.order(req.member_id, &lines).await?;
    Ok((StatusCode::CREATED, Json(OrderCreatedResponse { order_id })))
}

/// GET /orders?status=&member_name=: search orders.
pub async fn list<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<OrderResponse>>, ApiError> {
    let search = params.into_search()?;
    let orders = state.orders.find_orders(&search).await?;
    Ok(Json(orders.into_iter().map(OrderResponse::from).collect()))
}

/// GET /orders/{id}
pub async fn get<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<i64>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order = state
        .orders
        .find_order(OrderId::new(id))
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Order {id} not found")))?;
    Ok(Json(order.into()))
}

/// POST /orders/{id}/cancel: cancel an order and restore stock.
#[tracing::instrument(skip(state))]
pub async fn cancel<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<i64>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order = state.orders.cancel_order(OrderId::new(id)).await?;
    Ok(Json(order.into()))
}

/// POST /orders/{id}/delivery/complete: mark the delivery as done.
#[tracing::instrument(skip(state))]
pub async fn complete_delivery<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<i64>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order = state.orders.complete_delivery(OrderId::new(id)).await?;
    Ok(Json(order.into()))
}
