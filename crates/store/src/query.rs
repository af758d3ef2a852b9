use domain::OrderStatus;
use serde::Deserialize;

/// Filter for order listings.
///
/// Both criteria are optional; an empty search matches every order. Results
/// are always ordered by order id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct OrderSearch {
    /// Filter by order status.
    pub status: Option<OrderStatus>,

    /// Filter by members whose name contains this text.
    pub member_name: Option<String>,
}

impl OrderSearch {
    /// Upper bound on rows returned by an unpaginated order listing.
    pub const MAX_RESULTS: usize = 1000;

    /// Creates a search that matches every order.
    pub fn new() -> Self {
        Self::default()
    }

    /// Filters by order status.
    pub fn status(mut self, status: OrderStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Filters by a substring of the member's name.
    pub fn member_name(mut self, name: impl Into<String>) -> Self {
        self.member_name = Some(name.into());
        self
    }

    /// Returns the member-name filter, ignoring blank input.
    pub fn member_name_filter(&self) -> Option<&str> {
        self.member_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
    }

    /// Returns true if an order with this status and member name matches.
    pub fn matches(&self, status: OrderStatus, member_name: &str) -> bool {
        if let Some(wanted) = self.status
            && wanted != status
        {
            return false;
        }
        if let Some(fragment) = self.member_name_filter()
            && !member_name.contains(fragment)
        {
            return false;
        }
        true
    }
}

/// Offset/limit window over order roots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    /// Number of orders to skip.
    pub offset: usize,

    /// Maximum number of orders to return.
    pub limit: usize,
}

impl Page {
    pub const DEFAULT_LIMIT: usize = 100;

    pub fn new(offset: usize, limit: usize) -> Self {
        Self { offset, limit }
    }
}

impl Default for Page {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: Self::DEFAULT_LIMIT,
        }
    }
}

/// Resolves the window applied to an order-root query.
pub(crate) fn window(page: Option<Page>) -> (usize, usize) {
    match page {
        Some(page) => (page.offset, page.limit.min(OrderSearch::MAX_RESULTS)),
        None => (0, OrderSearch::MAX_RESULTS),
    }
}

/// [`window`] as SQL `LIMIT`/`OFFSET` values; offsets past `i64::MAX` clamp.
pub(crate) fn sql_window(page: Option<Page>) -> (i64, i64) {
    let (offset, limit) = window(page);
    (
        i64::try_from(limit).unwrap_or(i64::MAX),
        i64::try_from(offset).unwrap_or(i64::MAX),
    )
}
