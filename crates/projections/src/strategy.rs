//! The read strategies and what they cost.

use serde::{Deserialize, Serialize};

/// How an order listing with member, delivery and lines is assembled.
///
/// | Strategy | Queries for N orders | Paginates |
/// |---|---|---|
/// | `EntityGraph` | 1 + members + N deliveries + N lines + items | yes |
/// | `EntityDto` | same as `EntityGraph` | yes |
/// | `ToOneFetchJoin` | 3 (roots with member/delivery, lines, items) | yes |
/// | `FullFetchJoin` | 1, one row per line | no |
/// | `DtoPerOrder` | 1 + N | yes |
/// | `DtoBatched` | 2 | yes |
/// | `FlatGrouped` | 1, one row per line | no |
///
/// Members and items are counted once per distinct entity in a read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderReadStrategy {
    /// Loads every association of every order one query at a time.
    EntityGraph,
    /// `EntityGraph`, then converted to DTOs.
    EntityDto,
    /// Fetch-joins member and delivery; lines and items come from two
    /// batched `IN` queries.
    ToOneFetchJoin,
    /// Fetch-joins everything and removes duplicate order rows in memory.
    FullFetchJoin,
    /// Projects headers, then one line query per order.
    DtoPerOrder,
    /// Projects headers, then one line query for all orders.
    DtoBatched,
    /// One flat join, grouped by order in memory.
    FlatGrouped,
}

impl OrderReadStrategy {
    pub const ALL: [OrderReadStrategy; 7] = [
        OrderReadStrategy::EntityGraph,
        OrderReadStrategy::EntityDto,
        OrderReadStrategy::ToOneFetchJoin,
        OrderReadStrategy::FullFetchJoin,
        OrderReadStrategy::DtoPerOrder,
        OrderReadStrategy::DtoBatched,
        OrderReadStrategy::FlatGrouped,
    ];

    /// Returns false when rows multiply by order lines, which makes a
    /// limit/offset window count lines instead of orders.
    pub fn is_pagination_safe(&self) -> bool {
        !matches!(
            self,
            OrderReadStrategy::FullFetchJoin | OrderReadStrategy::FlatGrouped
        )
    }

    /// Metric label and log name.
    pub fn name(&self) -> &'static str {
        match self {
            OrderReadStrategy::EntityGraph => "entity_graph",
            OrderReadStrategy::EntityDto => "entity_dto",
            OrderReadStrategy::ToOneFetchJoin => "to_one_fetch_join",
            OrderReadStrategy::FullFetchJoin => "full_fetch_join",
            OrderReadStrategy::DtoPerOrder => "dto_per_order",
            OrderReadStrategy::DtoBatched => "dto_batched",
            OrderReadStrategy::FlatGrouped => "flat_grouped",
        }
    }
}

impl std::fmt::Display for OrderReadStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// How an order listing without lines is assembled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimpleOrderStrategy {
    /// Roots, then member and delivery per order, returned as entities.
    EntityGraph,
    /// `EntityGraph`, then converted to DTOs.
    EntityDto,
    /// One query joining member and delivery.
    FetchJoin,
    /// One projection query straight into DTOs.
    DirectDto,
}

impl SimpleOrderStrategy {
    pub const ALL: [SimpleOrderStrategy; 4] = [
        SimpleOrderStrategy::EntityGraph,
        SimpleOrderStrategy::EntityDto,
        SimpleOrderStrategy::FetchJoin,
        SimpleOrderStrategy::DirectDto,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            SimpleOrderStrategy::EntityGraph => "simple_entity_graph",
            SimpleOrderStrategy::EntityDto => "simple_entity_dto",
            SimpleOrderStrategy::FetchJoin => "simple_fetch_join",
            SimpleOrderStrategy::DirectDto => "simple_direct_dto",
        }
    }
}

impl std::fmt::Display for SimpleOrderStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
