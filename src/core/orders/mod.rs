//! Orders module
//!
//! Public checkout plus admin order management.

pub mod api;
pub mod service;

pub use api::{OrderApiState, order_api_router};
pub use service::{CreateOrderRequest, OrderError, OrderService};
