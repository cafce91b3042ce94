//! PostgreSQL repositories for the storefront
//!
//! Each repository implements one of the persistence gateway traits from
//! `db::store` on top of a shared `PgPool`.

pub mod banner;
pub mod identity;
pub mod order;

pub use banner::PgBannerStore;
pub use identity::{IdentityTable, PgIdentityStore};
pub use order::PgOrderStore;
