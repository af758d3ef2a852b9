//! Persistence for the shop backend.
//!
//! Every operation runs inside a [`Transaction`] obtained from a [`Store`]:
//! writes become visible on [`Transaction::commit`] and are discarded when the
//! transaction is dropped. Each read or write counts as one issued query, so
//! callers can compare the cost of different read paths.

pub mod error;
pub mod memory;
pub mod postgres;
pub mod query;
pub mod rows;
pub mod store;

pub use error::{Result, StoreError};
pub use memory::{InMemoryStore, InMemoryTransaction};
pub use postgres::{PostgresStore, PostgresTransaction};
pub use query::{OrderSearch, Page};
pub use rows::{
    OrderFlatRow, OrderItemJoinRow, OrderItemQueryRow, OrderMemberDeliveryRow, OrderQueryRow,
    OrderRow,
};
pub use store::{Store, Transaction, TransactionExt};
