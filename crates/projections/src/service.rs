//! Read-only order query service.

use std::time::Instant;

use store::{OrderSearch, Page, Store, Transaction};

use crate::Result;
use crate::dto::{OrderDto, SimpleOrderDto};
use crate::reads::{entity_graph, read_orders};
use crate::simple::{read_simple_orders, simple_entity_graph};
use crate::strategy::{OrderReadStrategy, SimpleOrderStrategy};
use crate::view::{OrderEntityView, SimpleOrderEntityView};

/// Order listings over a [`Store`].
///
/// Each call runs in its own transaction, which is dropped without commit.
#[derive(Clone)]
pub struct OrderQueryService<S> {
    store: S,
}

impl<S: Store> OrderQueryService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Orders with member, delivery and lines, assembled by `strategy`.
    #[tracing::instrument(skip(self, search, strategy), fields(strategy = %strategy))]
    pub async fn read(
        &self,
        strategy: OrderReadStrategy,
        search: &OrderSearch,
        page: Option<Page>,
    ) -> Result<Vec<OrderDto>> {
        let started = Instant::now();
        let mut tx = self.store.begin().await?;
        let orders = read_orders(&mut tx, strategy, search, page).await?;
        record_read(strategy.name(), started, tx.query_count(), orders.len());
        Ok(orders)
    }

    /// The loaded entities behind [`OrderReadStrategy::EntityGraph`].
    #[tracing::instrument(skip(self, search))]
    pub async fn entities(
        &self,
        search: &OrderSearch,
        page: Option<Page>,
    ) -> Result<Vec<OrderEntityView>> {
        let started = Instant::now();
        let mut tx = self.store.begin().await?;
        let views = entity_graph(&mut tx, search, page).await?;
        record_read(
            OrderReadStrategy::EntityGraph.name(),
            started,
            tx.query_count(),
            views.len(),
        );
        Ok(views)
    }

    /// Orders with member and delivery only.
    #[tracing::instrument(skip(self, search, strategy), fields(strategy = %strategy))]
    pub async fn read_simple(
        &self,
        strategy: SimpleOrderStrategy,
        search: &OrderSearch,
    ) -> Result<Vec<SimpleOrderDto>> {
        let started = Instant::now();
        let mut tx = self.store.begin().await?;
        let orders = read_simple_orders(&mut tx, strategy, search).await?;
        record_read(strategy.name(), started, tx.query_count(), orders.len());
        Ok(orders)
    }

    /// The loaded entities behind [`SimpleOrderStrategy::EntityGraph`].
    #[tracing::instrument(skip(self, search))]
    pub async fn simple_entities(&self, search: &OrderSearch) -> Result<Vec<SimpleOrderEntityView>> {
        let started = Instant::now();
        let mut tx = self.store.begin().await?;
        let views = simple_entity_graph(&mut tx, search).await?;
        record_read(
            SimpleOrderStrategy::EntityGraph.name(),
            started,
            tx.query_count(),
            views.len(),
        );
        Ok(views)
    }
}

fn record_read(strategy: &'static str, started: Instant, queries: u64, orders: usize) {
    metrics::counter!("order_reads_total", "strategy" => strategy).increment(1);
    metrics::histogram!("order_read_duration_seconds", "strategy" => strategy)
        .record(started.elapsed().as_secs_f64());
    tracing::debug!(strategy, queries, orders, "orders read");
}
