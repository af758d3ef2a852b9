//! Order read strategies for the shop backend.
//!
//! The same listing (orders filtered by status and member name, each with
//! member name, delivery address and lines) can be assembled in several ways
//! that differ in the number of queries issued and in whether a limit/offset
//! window still counts orders:
//! - [`OrderReadStrategy`] names the seven full-listing strategies
//! - [`SimpleOrderStrategy`] names the four listings without lines
//! - [`OrderQueryService`] runs either kind in its own transaction
//! - [`reads`] and [`simple`] hold the strategies themselves, usable inside
//!   any [`store::Transaction`]

mod context;
pub mod dto;
pub mod error;
pub mod reads;
pub mod service;
pub mod simple;
pub mod strategy;
pub mod view;

pub use dto::{
    OrderDto, OrderFlatDto, OrderItemDto, OrderItemQueryDto, OrderQueryDto, OrderSimpleQueryDto,
    SimpleOrderDto,
};
pub use error::{ProjectionError, Result};
pub use service::OrderQueryService;
pub use strategy::{OrderReadStrategy, SimpleOrderStrategy};
pub use view::{OrderEntityView, OrderItemEntityView, SimpleOrderEntityView};
