//! Transactional services for the shop backend.
//!
//! Every public operation opens one [`store::Transaction`], commits it on
//! success and drops it (rolling back) on the first error.

pub mod category;
pub mod error;
pub mod item;
pub mod member;
pub mod order;

pub use category::CategoryService;
pub use error::{Result, ServiceError};
pub use item::ItemService;
pub use member::MemberService;
pub use order::OrderService;
