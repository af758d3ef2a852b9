//! Domain layer for the shop backend.
//!
//! This crate provides the storage-independent model:
//! - Members with their embedded [`Address`]
//! - Catalog items as a tagged union over book, album and movie
//! - Categories forming a parent/child tree
//! - The order aggregate, which owns its delivery and order items

pub mod category;
pub mod delivery;
pub mod error;
pub mod item;
pub mod member;
pub mod order;
pub mod value_objects;

pub use category::{Category, NewCategory};
pub use delivery::{Delivery, DeliveryStatus, NewDelivery};
pub use error::DomainError;
pub use item::{Item, ItemError, ItemKind, NewItem, StockError};
pub use member::{Member, NewMember};
pub use order::{NewOrder, NewOrderItem, Order, OrderError, OrderItem, OrderStatus};
pub use value_objects::{Address, Money};
