//! Member registration endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use common::MemberId;
use domain::{Address, Member, NewMember};
use serde::{Deserialize, Serialize};
use store::Store;

use super::AppState;
use super::orders::OrderResponse;
use crate::error::ApiError;

#[derive(Deserialize)]
pub struct CreateMemberRequest {
    pub name: String,
    pub city: Option<String>,
    pub street: Option<String>,
    pub zipcode: Option<String>,
}

#[derive(Deserialize)]
pub struct UpdateMemberRequest {
    pub name: String,
}

#[derive(Serialize)]
pub struct MemberCreatedResponse {
    pub id: MemberId,
}

#[derive(Serialize)]
pub struct MemberResponse {
    pub id: MemberId,
    pub name: String,
    pub address: Address,
}

impl From<Member> for MemberResponse {
    fn from(member: Member) -> Self {
        Self {
            id: member.id,
            name: member.name,
            address: member.address,
        }
    }
}

fn required_name(name: &str) -> Result<&str, ApiError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ApiError::BadRequest("Member name is required".to_string()));
    }
    Ok(name)
}

/// POST /members: register a member; names are unique.
#[tracing::instrument(skip(state, req))]
pub async fn create<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Json(req): Json<CreateMemberRequest>,
) -> Result<(StatusCode, Json<MemberCreatedResponse>), ApiError> {
    let name = required_name(&req.name)?;
    let address = Address::new(
        req.city.unwrap_or_default(),
        req.street.unwrap_or_default(),
        req.zipcode.unwrap_or_default(),
    );

    let id = state.members.join(NewMember::new(name, address)).await?;
    Ok((StatusCode::CREATED, Json(MemberCreatedResponse { id })))
}

/// GET /members: list all members.
pub async fn list<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<Vec<MemberResponse>>, ApiError> {
    let members = state.members.find_members().await?;
    Ok(Json(members.into_iter().map(MemberResponse::from).collect()))
}

/// GET /members/{id}
pub async fn get<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<i64>,
) -> Result<Json<MemberResponse>, ApiError> {
    let member = state
        .members
        .find_one(MemberId::new(id))
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Member {id} not found")))?;
    Ok(Json(member.into()))
}

/// PUT /members/{id}: rename a member.
#[tracing::instrument(skip(state, req))]
pub async fn update<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateMemberRequest>,
) -> Result<Json<MemberResponse>, ApiError> {
    let name = required_name(&req.name)?;
    let member = state
        .members
        .update(MemberId::new(id), name)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Member {id} not found")))?;
    Ok(Json(member.into()))
}

/// GET /members/{id}/orders: every order the member has placed.
pub async fn orders<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<i64>,
) -> Result<Json<Vec<OrderResponse>>, ApiError> {
    let orders = state.orders.find_member_orders(MemberId::new(id)).await?;
    Ok(Json(orders.into_iter().map(OrderResponse::from).collect()))
}
