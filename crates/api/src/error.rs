//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use domain::{DomainError, OrderError};
use projections::ProjectionError;
use service::ServiceError;
use store::StoreError;

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Resource not found.
    NotFound(String),
    /// Bad request from the client.
    BadRequest(String),
    /// Service-layer error.
    Service(ServiceError),
    /// Order read error.
    Projection(ProjectionError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Service(err) => service_error_to_response(err),
            ApiError::Projection(err) => projection_error_to_response(err),
        };

        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %message, "internal server error");
        }

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

fn service_error_to_response(err: ServiceError) -> (StatusCode, String) {
    let status = match &err {
        ServiceError::DuplicateMember { .. } => StatusCode::CONFLICT,
        ServiceError::MemberNotFound(_)
        | ServiceError::ItemNotFound(_)
        | ServiceError::CategoryNotFound(_)
        | ServiceError::OrderNotFound(_) => StatusCode::NOT_FOUND,
        ServiceError::Domain(domain_err) => domain_status(domain_err),
        ServiceError::Store(store_err) => store_status(store_err),
    };
    (status, err.to_string())
}

fn domain_status(err: &DomainError) -> StatusCode {
    match err {
        DomainError::Order(order_err) => match order_err {
            OrderError::Stock(_)
            | OrderError::AlreadyDelivered { .. }
            | OrderError::AlreadyCancelled { .. } => StatusCode::CONFLICT,
            OrderError::NoItems
            | OrderError::InvalidQuantity { .. }
            | OrderError::AmountOverflow => StatusCode::BAD_REQUEST,
            OrderError::ItemNotLoaded { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        },
        DomainError::Item(_) => StatusCode::BAD_REQUEST,
    }
}

fn store_status(err: &StoreError) -> StatusCode {
    match err {
        StoreError::NotFound { .. } => StatusCode::NOT_FOUND,
        StoreError::UniqueViolation { .. } => StatusCode::CONFLICT,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn projection_error_to_response(err: ProjectionError) -> (StatusCode, String) {
    let status = match &err {
        ProjectionError::PaginationUnsupported { .. } => StatusCode::BAD_REQUEST,
        ProjectionError::Store(store_err) => store_status(store_err),
    };
    (status, err.to_string())
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        ApiError::Service(err)
    }
}

impl From<ProjectionError> for ApiError {
    fn from(err: ProjectionError) -> Self {
        ApiError::Projection(err)
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        ApiError::Service(ServiceError::Store(err))
    }
}
