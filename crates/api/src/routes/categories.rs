//! Category tree endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use common::{CategoryId, ItemId};
use domain::Category;
use serde::{Deserialize, Serialize};
use store::Store;

use super::AppState;
use crate::error::ApiError;

#[derive(Deserialize)]
pub struct CreateCategoryRequest {
    pub name: String,
    pub parent_id: Option<CategoryId>,
}

#[derive(Serialize)]
pub struct CategoryResponse {
    pub id: CategoryId,
    pub name: String,
    pub parent_id: Option<CategoryId>,
    pub item_ids: Vec<ItemId>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<CategoryResponse>,
}

impl From<Category> for CategoryResponse {
    fn from(category: Category) -> Self {
        Self {
            id: category.id,
            name: category.name,
            parent_id: category.parent_id,
            item_ids: category.item_ids,
            children: Vec::new(),
        }
    }
}

/// POST /categories: create a root or child category.
#[tracing::instrument(skip(state, req))]
pub async fn create<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Json(req): Json<CreateCategoryRequest>,
) -> Result<(StatusCode, Json<CategoryResponse>), ApiError> {
    let name = req.name.trim();
    if name.is_empty() {
        return Err(ApiError::BadRequest("Category name is required".to_string()));
    }
    let category = state.categories.create(name, req.parent_id).await?;
    Ok((StatusCode::CREATED, Json(category.into())))
}

/// GET /categories/{id}: a category with its direct children.
pub async fn get<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<i64>,
) -> Result<Json<CategoryResponse>, ApiError> {
    let id = CategoryId::new(id);
    let category = state
        .categories
        .find_one(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Category {id} not found")))?;

    let mut response = CategoryResponse::from(category);
    response.children = state
        .categories
        .children(id)
        .await?
        .into_iter()
        .map(CategoryResponse::from)
        .collect();
    Ok(Json(response))
}

/// POST /categories/{id}/items/{item_id}: classify an item.
#[tracing::instrument(skip(state))]
pub async fn add_item<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path((id, item_id)): Path<(i64, i64)>,
) -> Result<Json<CategoryResponse>, ApiError> {
    let category = state
        .categories
        .add_item(CategoryId::new(id), ItemId::new(item_id))
        .await?;
    Ok(Json(category.into()))
}
