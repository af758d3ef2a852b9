//! Versioned order listings, one route per read strategy.
//!
//! | route | strategy |
//! |-------|----------|
//! | `/api/v1/orders` | raw entity graph |
//! | `/api/v2/orders` | entity graph mapped to DTOs |
//! | `/api/v3/orders` | full fetch join (rejects paging) |
//! | `/api/v3.1/orders` | to-one fetch join + batched lines (paged) |
//! | `/api/v4/orders` | DTO query, one line query per order |
//! | `/api/v5/orders` | DTO query, one batched line query |
//! | `/api/v6/orders` | flat join grouped in memory (rejects paging) |
//!
//! Only v3.1 pages. v1, v2, v4 and v5 ignore `offset`/`limit`.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Query, State};
use projections::{
    OrderDto, OrderEntityView, OrderReadStrategy, SimpleOrderDto, SimpleOrderEntityView,
    SimpleOrderStrategy,
};
use serde::Deserialize;
use store::{Page, Store};

use super::{AppState, PageParams, SearchParams};
use crate::error::ApiError;

/// Filter and window parameters accepted by every order listing.
#[derive(Debug, Default, Deserialize)]
pub struct OrderListParams {
    pub status: Option<String>,
    pub member_name: Option<String>,
    pub offset: Option<usize>,
    pub limit: Option<usize>,
}

impl OrderListParams {
    fn split(self) -> (SearchParams, PageParams) {
        (
            SearchParams {
                status: self.status,
                member_name: self.member_name,
            },
            PageParams {
                offset: self.offset,
                limit: self.limit,
            },
        )
    }
}

async fn read_with<S: Store + Clone + 'static>(
    state: &AppState<S>,
    strategy: OrderReadStrategy,
    search: SearchParams,
    page: Option<Page>,
) -> Result<Json<Vec<OrderDto>>, ApiError> {
    let search = search.into_search()?;
    let orders = state.order_queries.read(strategy, &search, page).await?;
    Ok(Json(orders))
}

/// Reads without a window; paging parameters are ignored.
async fn read_unpaged<S: Store + Clone + 'static>(
    state: &AppState<S>,
    strategy: OrderReadStrategy,
    params: OrderListParams,
) -> Result<Json<Vec<OrderDto>>, ApiError> {
    let (search, _) = params.split();
    read_with(state, strategy, search, None).await
}

/// Passes a requested window through so the strategy can reject it.
async fn read_rejecting_page<S: Store + Clone + 'static>(
    state: &AppState<S>,
    strategy: OrderReadStrategy,
    params: OrderListParams,
) -> Result<Json<Vec<OrderDto>>, ApiError> {
    let (search, page) = params.split();
    read_with(state, strategy, search, page.requested()).await
}

/// GET /api/v1/orders: the entity graph as loaded.
pub async fn v1<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Query(params): Query<OrderListParams>,
) -> Result<Json<Vec<OrderEntityView>>, ApiError> {
    let (search, _) = params.split();
    let search = search.into_search()?;
    let views = state.order_queries.entities(&search, None).await?;
    Ok(Json(views))
}

/// GET /api/v2/orders
pub async fn v2<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Query(params): Query<OrderListParams>,
) -> Result<Json<Vec<OrderDto>>, ApiError> {
    read_unpaged(&state, OrderReadStrategy::EntityDto, params).await
}

/// GET /api/v3/orders: rejects `offset`/`limit`.
pub async fn v3<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Query(params): Query<OrderListParams>,
) -> Result<Json<Vec<OrderDto>>, ApiError> {
    read_rejecting_page(&state, OrderReadStrategy::FullFetchJoin, params).await
}

/// GET /api/v3.1/orders: always paged, defaulting to the first page.
pub async fn v3_1<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Query(params): Query<OrderListParams>,
) -> Result<Json<Vec<OrderDto>>, ApiError> {
    let (search, page) = params.split();
    read_with(
        &state,
        OrderReadStrategy::ToOneFetchJoin,
        search,
        Some(page.or_default()),
    )
    .await
}

/// GET /api/v4/orders
pub async fn v4<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Query(params): Query<OrderListParams>,
) -> Result<Json<Vec<OrderDto>>, ApiError> {
    read_unpaged(&state, OrderReadStrategy::DtoPerOrder, params).await
}

/// GET /api/v5/orders
pub async fn v5<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Query(params): Query<OrderListParams>,
) -> Result<Json<Vec<OrderDto>>, ApiError> {
    read_unpaged(&state, OrderReadStrategy::DtoBatched, params).await
}

/// GET /api/v6/orders: rejects `offset`/`limit`.
pub async fn v6<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Query(params): Query<OrderListParams>,
) -> Result<Json<Vec<OrderDto>>, ApiError> {
    read_rejecting_page(&state, OrderReadStrategy::FlatGrouped, params).await
}

// -- Simple orders: member and delivery only --

async fn read_simple_with<S: Store + Clone + 'static>(
    state: &AppState<S>,
    strategy: SimpleOrderStrategy,
    params: SearchParams,
) -> Result<Json<Vec<SimpleOrderDto>>, ApiError> {
    let search = params.into_search()?;
    let orders = state.order_queries.read_simple(strategy, &search).await?;
    Ok(Json(orders))
}

/// GET /api/v1/simple-orders: the entity graph as loaded.
pub async fn simple_v1<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<SimpleOrderEntityView>>, ApiError> {
    let search = params.into_search()?;
    let views = state.order_queries.simple_entities(&search).await?;
    Ok(Json(views))
}

/// GET /api/v2/simple-orders
pub async fn simple_v2<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<SimpleOrderDto>>, ApiError> {
    read_simple_with(&state, SimpleOrderStrategy::EntityDto, params).await
}

/// GET /api/v3/simple-orders
pub async fn simple_v3<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<SimpleOrderDto>>, ApiError> {
    read_simple_with(&state, SimpleOrderStrategy::FetchJoin, params).await
}

/// GET /api/v4/simple-orders
pub async fn simple_v4<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<SimpleOrderDto>>, ApiError> {
    read_simple_with(&state, SimpleOrderStrategy::DirectDto, params).await
}
