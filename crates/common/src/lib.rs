//! Shared types for the shop backend.

pub mod ids;

pub use ids::{CategoryId, DeliveryId, ItemId, MemberId, OrderId, OrderItemId};
