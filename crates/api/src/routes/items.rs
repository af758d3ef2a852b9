//! Catalog item endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use common::ItemId;
use domain::{Item, ItemKind, Money, NewItem};
use serde::{Deserialize, Serialize};
use store::Store;

use super::AppState;
use crate::error::ApiError;

/// Item registration body; the `dtype` tag selects book, album or movie.
#[derive(Deserialize)]
pub struct CreateItemRequest {
    pub name: String,
    pub price: i64,
    pub stock_quantity: u32,
    #[serde(flatten)]
    pub kind: ItemKind,
}

#[derive(Deserialize)]
pub struct UpdateItemRequest {
    pub name: String,
    pub price: i64,
    pub stock_quantity: u32,
}

#[derive(Serialize)]
pub struct ItemResponse {
    pub id: ItemId,
    pub name: String,
    pub price: Money,
    pub stock_quantity: u32,
    #[serde(flatten)]
    pub kind: ItemKind,
}

impl From<Item> for ItemResponse {
    fn from(item: Item) -> Self {
        Self {
            id: item.id,
            stock_quantity: item.stock_quantity(),
            name: item.name,
            price: item.price,
            kind: item.kind,
        }
    }
}

fn validate(name: &str) -> Result<(), ApiError> {
    if name.trim().is_empty() {
        return Err(ApiError::BadRequest("Item name is required".to_string()));
    }
    Ok(())
}

/// POST /items: register a catalog item.
#[tracing::instrument(skip(state, req))]
pub async fn create<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Json(req): Json<CreateItemRequest>,
) -> Result<(StatusCode, Json<ItemResponse>), ApiError> {
    validate(&req.name)?;
    let item = state
        .items
        .save_item(NewItem {
            name: req.name.trim().to_string(),
            price: Money::new(req.price),
            stock_quantity: req.stock_quantity,
            kind: req.kind,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(item.into())))
}

/// GET /items
pub async fn list<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<Vec<ItemResponse>>, ApiError> {
    let items = state.items.find_items().await?;
    Ok(Json(items.into_iter().map(ItemResponse::from).collect()))
}

/// GET /items/{id}
pub async fn get<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<i64>,
) -> Result<Json<ItemResponse>, ApiError> {
    let item = state
        .items
        .find_one(ItemId::new(id))
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Item {id} not found")))?;
    Ok(Json(item.into()))
}

/// PUT /items/{id}: overwrite name, price and stock.
#[tracing::instrument(skip(state, req))]
pub async fn update<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateItemRequest>,
) -> Result<Json<ItemResponse>, ApiError> {
    validate(&req.name)?;
    let item = state
        .items
        .update_item(
            ItemId::new(id),
            req.name.trim(),
            Money::new(req.price),
            req.stock_quantity,
        )
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Item {id} not found")))?;
    Ok(Json(item.into()))
}
