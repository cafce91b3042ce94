//! Database module for the storefront
//!
//! This module provides database connectivity, models, the persistence gateway
//! traits and their PostgreSQL and in-memory implementations.

pub mod memory;
pub mod models;
pub mod pool;
pub mod repositories;
pub mod store;

// Re-export commonly used items
pub use memory::{MemoryBannerStore, MemoryIdentityStore, MemoryOrderStore};
pub use models::*;
pub use pool::{DbConfig, DbError, create_pool, create_pool_with_migrations, health_check};
pub use repositories::{IdentityTable, PgBannerStore, PgIdentityStore, PgOrderStore};
pub use store::{BannerStore, IdentityKey, IdentityStore, OrderStore, StoreError};

// Re-export sqlx types that might be needed
pub use sqlx::PgPool;
