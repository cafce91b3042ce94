//! User accounts module
//!
//! - Current identity lookup
//! - Account status administration
//! - Super admin seeding at startup

pub mod api;
pub mod service;

pub use api::{UserApiState, user_api_router};
pub use service::{ChangeStatusRequest, UserService, seed_super_admin};
