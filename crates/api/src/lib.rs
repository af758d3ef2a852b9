//! HTTP API for the shop backend.
//!
//! Exposes member, item, category and order endpoints plus the versioned
//! order listings that compare read strategies, with structured logging
//! (tracing) and Prometheus metrics.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use metrics_exporter_prometheus::PrometheusHandle;
use projections::OrderQueryService;
use service::{CategoryService, ItemService, MemberService, OrderService};
use store::Store;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use config::Config;
pub use routes::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S: Store + Clone + 'static>(
    state: Arc<AppState<S>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route(
            "/members",
            post(routes::members::create::<S>).get(routes::members::list::<S>),
        )
        .route(
            "/members/{id}",
            get(routes::members::get::<S>).put(routes::members::update::<S>),
        )
        .route("/members/{id}/orders", get(routes::members::orders::<S>))
        .route(
            "/items",
            post(routes::items::create::<S>).get(routes::items::list::<S>),
        )
        .route(
            "/items/{id}",
            get(routes::items::get::<S>).put(routes::items::update::<S>),
        )
        .route("/categories", post(routes::categories::create::<S>))
        .route("/categories/{id}", get(routes::categories::get::<S>))
        .route(
            "/categories/{id}/items/{item_id}",
            post(routes::categories::add_item::<S>),
        )
        .route(
            "/orders",
            post(routes::orders::create::<S>).get(routes::orders::list::<S>),
        )
        .route("/orders/{id}", get(routes::orders::get::<S>))
        .route("/orders/{id}/cancel", post(routes::orders::cancel::<S>))
        .route(
            "/orders/{id}/delivery/complete",
            post(routes::orders::complete_delivery::<S>),
        )
        .merge(order_api_router::<S>())
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

fn order_api_router<S: Store + Clone + 'static>() -> Router<Arc<AppState<S>>> {
    use routes::order_api;

    Router::new()
        .route("/api/v1/orders", get(order_api::v1::<S>))
        .route("/api/v2/orders", get(order_api::v2::<S>))
        .route("/api/v3/orders", get(order_api::v3::<S>))
        .route("/api/v3.1/orders", get(order_api::v3_1::<S>))
        .route("/api/v4/orders", get(order_api::v4::<S>))
        .route("/api/v5/orders", get(order_api::v5::<S>))
        .route("/api/v6/orders", get(order_api::v6::<S>))
        .route("/api/v1/simple-orders", get(order_api::simple_v1::<S>))
        .route("/api/v2/simple-orders", get(order_api::simple_v2::<S>))
        .route("/api/v3/simple-orders", get(order_api::simple_v3::<S>))
        .route("/api/v4/simple-orders", get(order_api::simple_v4::<S>))
}

/// Creates the application state, every service sharing one store.
pub fn create_default_state<S: Store + Clone + 'static>(store: S) -> Arc<AppState<S>> {
    Arc::new(AppState {
        members: MemberService::new(store.clone()),
        items: ItemService::new(store.clone()),
        categories: CategoryService::new(store.clone()),
        orders: OrderService::new(store.clone()),
        order_queries: OrderQueryService::new(store),
    })
}
