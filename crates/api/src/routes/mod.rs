//! HTTP route handlers.

pub mod categories;
pub mod health;
pub mod items;
pub mod members;
pub mod metrics;
pub mod order_api;
pub mod orders;

use domain::OrderStatus;
use projections::OrderQueryService;
use serde::Deserialize;
use service::{CategoryService, ItemService, MemberService, OrderService};
use store::{OrderSearch, Page};

use crate::error::ApiError;

/// Shared application state accessible from all handlers.
pub struct AppState<S> {
    pub members: MemberService<S>,
    pub items: ItemService<S>,
    pub categories: CategoryService<S>,
    pub orders: OrderService<S>,
    pub order_queries: OrderQueryService<S>,
}

/// `?status=&member_name=` filter shared by every order listing.
#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    pub status: Option<String>,
    pub member_name: Option<String>,
}

impl SearchParams {
    /// Validates the raw parameters into an [`OrderSearch`].
    ///
    /// The status is matched case-insensitively; an empty status means no
    /// status filter.
    pub fn into_search(self) -> Result<OrderSearch, ApiError> {
        let mut search = OrderSearch::new();
        if let Some(raw) = self.status.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            let status = OrderStatus::parse(raw)
                .ok_or_else(|| ApiError::BadRequest(format!("Invalid order status: {raw}")))?;
            search = search.status(status);
        }
        if let Some(name) = self.member_name {
            search = search.member_name(name);
        }
        Ok(search)
    }
}

/// Optional `?offset=&limit=` window.
#[derive(Debug, Default, Deserialize)]
pub struct PageParams {
    pub offset: Option<usize>,
    pub limit: Option<usize>,
}

impl PageParams {
    /// Returns a page only when the caller asked for one.
    pub fn requested(&self) -> Option<Page> {
        if self.offset.is_none() && self.limit.is_none() {
            return None;
        }
        Some(self.or_default())
    }

    /// Returns the requested page, filling gaps with defaults.
    pub fn or_default(&self) -> Page {
        Page::new(
            self.offset.unwrap_or(0),
            self.limit.unwrap_or(Page::DEFAULT_LIMIT),
        )
    }
}
