//! Persistence gateway traits
//!
//! Business logic depends only on these traits; each storage backend
//! (PostgreSQL, in-memory) implements them once.

use async_trait::async_trait;
use uuid::Uuid;

use crate::core::db::models::{
    AccountStatus, Banner, BannerPatch, Identity, IdentityPatch, NewBanner, NewIdentity, NewOrder,
    Order, OrderPatch,
};

/// Store error types shared by all backends
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Record already exists: {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
}

/// Lookup key for identity records
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentityKey {
    Id(Uuid),
    Email(String),
    /// Email match restricted to identities with `active` status
    ActiveEmail(String),
    IdAndEmail(Uuid, String),
}

impl IdentityKey {
    /// Whether `identity` is selected by this key
    pub fn matches(&self, identity: &Identity) -> bool {
        match self {
            IdentityKey::Id(id) => identity.id == *id,
            IdentityKey::Email(email) => identity.email == *email,
            IdentityKey::ActiveEmail(email) => {
                identity.email == *email && identity.status == AccountStatus::Active
            }
            IdentityKey::IdAndEmail(id, email) => identity.id == *id && identity.email == *email,
        }
    }
}

/// Identity persistence gateway
#[async_trait]
pub trait IdentityStore: Send + Sync {
    /// Find the identity selected by `key`
    async fn find_by_key(&self, key: &IdentityKey) -> Result<Option<Identity>, StoreError>;

    /// Apply `patch` to the identity selected by `key` and return the updated record
    async fn update_by_key(
        &self,
        key: &IdentityKey,
        patch: &IdentityPatch,
    ) -> Result<Option<Identity>, StoreError>;

    /// Check whether an identity with this id exists
    async fn exists(&self, id: Uuid) -> Result<bool, StoreError>;

    /// Insert a new identity (email must be unique)
    async fn insert(&self, identity: &NewIdentity) -> Result<Identity, StoreError>;
}

/// Banner persistence gateway
#[async_trait]
pub trait BannerStore: Send + Sync {
    async fn create(&self, banner: &NewBanner) -> Result<Banner, StoreError>;

    /// All banners, newest first
    async fn list(&self) -> Result<Vec<Banner>, StoreError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Banner>, StoreError>;

    async fn update(&self, id: Uuid, patch: &BannerPatch) -> Result<Option<Banner>, StoreError>;

    /// Delete and return the removed banner
    async fn delete(&self, id: Uuid) -> Result<Option<Banner>, StoreError>;
}

/// Order persistence gateway
#[async_trait]
pub trait OrderStore: Send + Sync {
    async fn create(&self, order: &NewOrder) -> Result<Order, StoreError>;

    /// All orders, newest first
    async fn list(&self) -> Result<Vec<Order>, StoreError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Order>, StoreError>;

    async fn update(&self, id: Uuid, patch: &OrderPatch) -> Result<Option<Order>, StoreError>;

    /// Delete and return the removed order
    async fn delete(&self, id: Uuid) -> Result<Option<Order>, StoreError>;
}
