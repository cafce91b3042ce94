//! In-memory store implementations (for development and tests)
//!
//! Records live in `DashMap`s keyed by id. Every successful mutation bumps a
//! write counter so callers can assert that a flow did not touch the store.

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use uuid::Uuid;

use crate::core::db::models::{
    AccountStatus, Banner, BannerPatch, Identity, IdentityPatch, NewBanner, NewIdentity, NewOrder,
    Order, OrderPatch,
};
use crate::core::db::store::{BannerStore, IdentityKey, IdentityStore, OrderStore, StoreError};

// ============================================================================
// Identity Store
// ============================================================================

/// In-memory identity store
#[derive(Default)]
pub struct MemoryIdentityStore {
    identities: DashMap<Uuid, Identity>,
    writes: AtomicUsize,
}

impl MemoryIdentityStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of successful inserts and updates so far
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn len(&self) -> usize {
        self.identities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.identities.is_empty()
    }

    /// Snapshot of one identity
    pub fn get(&self, id: Uuid) -> Option<Identity> {
        self.identities.get(&id).map(|entry| entry.value().clone())
    }

    fn find_id(&self, key: &IdentityKey) -> Option<Uuid> {
        self.identities
            .iter()
            .find(|entry| key.matches(entry.value()))
            .map(|entry| *entry.key())
    }
}

#[async_trait]
impl IdentityStore for MemoryIdentityStore {
    async fn find_by_key(&self, key: &IdentityKey) -> Result<Option<Identity>, StoreError> {
        let identity = self
            .identities
            .iter()
            .find(|entry| key.matches(entry.value()))
            .map(|entry| entry.value().clone());

        Ok(identity)
    }

    async fn update_by_key(
        &self,
        key: &IdentityKey,
        patch: &IdentityPatch,
    ) -> Result<Option<Identity>, StoreError> {
        let Some(id) = self.find_id(key) else {
            return Ok(None);
        };

        let Some(mut identity) = self.identities.get_mut(&id) else {
            return Ok(None);
        };

        if let Some(ref hash) = patch.password_hash {
            identity.password_hash = hash.clone();
        }
        if let Some(status) = patch.status {
            identity.status = status;
        }
        if let Some(is_deleted) = patch.is_deleted {
            identity.is_deleted = is_deleted;
        }
        if let Some(confirmed) = patch.is_email_confirmed {
            identity.is_email_confirmed = confirmed;
        }
        if let Some(needs_change) = patch.needs_password_change {
            identity.needs_password_change = needs_change;
        }
        if let Some(changed_at) = patch.password_changed_at {
            identity.password_changed_at = Some(changed_at);
        }
        identity.updated_at = Utc::now();

        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(Some(identity.value().clone()))
    }

    async fn exists(&self, id: Uuid) -> Result<bool, StoreError> {
        Ok(self.identities.contains_key(&id))
    }

    async fn insert(&self, new: &NewIdentity) -> Result<Identity, StoreError> {
        if self
            .identities
            .iter()
            .any(|entry| entry.value().email == new.email)
        {
            return Err(StoreError::Conflict(format!("email {}", new.email)));
        }

        let now = Utc::now();
        let identity = Identity {
            id: Uuid::new_v4(),
            name: new.name.clone(),
            email: new.email.clone(),
            password_hash: new.password_hash.clone(),
            role: new.role,
            status: AccountStatus::Active,
            is_deleted: false,
            is_email_confirmed: new.is_email_confirmed,
            needs_password_change: new.needs_password_change,
            password_changed_at: None,
            created_at: now,
            updated_at: now,
        };

        self.identities.insert(identity.id, identity.clone());
        self.writes.fetch_add(1, Ordering::SeqCst);

        Ok(identity)
    }
}

// ============================================================================
// Banner Store
// ============================================================================

/// In-memory banner store
#[derive(Default)]
pub struct MemoryBannerStore {
    banners: DashMap<Uuid, Banner>,
}

impl MemoryBannerStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BannerStore for MemoryBannerStore {
    async fn create(&self, new: &NewBanner) -> Result<Banner, StoreError> {
        let now = Utc::now();
        let banner = Banner {
            id: Uuid::new_v4(),
            url: new.url.clone(),
            public_id: Some(new.public_id.clone()),
            is_paused: new.is_paused,
            created_at: now,
            updated_at: now,
        };

        self.banners.insert(banner.id, banner.clone());
        Ok(banner)
    }

    async fn list(&self) -> Result<Vec<Banner>, StoreError> {
        let mut banners: Vec<Banner> = self.banners.iter().map(|e| e.value().clone()).collect();
        banners.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(banners)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Banner>, StoreError> {
        Ok(self.banners.get(&id).map(|b| b.value().clone()))
    }

    async fn update(&self, id: Uuid, patch: &BannerPatch) -> Result<Option<Banner>, StoreError> {
        let Some(mut banner) = self.banners.get_mut(&id) else {
            return Ok(None);
        };

        if let Some(ref url) = patch.url {
            banner.url = url.clone();
        }
        if let Some(is_paused) = patch.is_paused {
            banner.is_paused = is_paused;
        }
        banner.updated_at = Utc::now();

        Ok(Some(banner.value().clone()))
    }

    async fn delete(&self, id: Uuid) -> Result<Option<Banner>, StoreError> {
        Ok(self.banners.remove(&id).map(|(_, banner)| banner))
    }
}

// ============================================================================
// Order Store
// ============================================================================

/// In-memory order store
#[derive(Default)]
pub struct MemoryOrderStore {
    orders: DashMap<Uuid, Order>,
}

impl MemoryOrderStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl OrderStore for MemoryOrderStore {
    async fn create(&self, new: &NewOrder) -> Result<Order, StoreError> {
        let now = Utc::now();
        let order = Order {
            id: Uuid::new_v4(),
            phone: new.phone.clone(),
            products: sqlx::types::Json(new.products.clone()),
            address: new.address.clone(),
            district: new.district.clone(),
            city: new.city.clone(),
            order_note: new.order_note.clone(),
            payment_method: new.payment_method.clone(),
            shipping_method: new.shipping_method.clone(),
            courier_address: new.courier_address.clone(),
            status: Default::default(),
            created_at: now,
            updated_at: now,
        };

        self.orders.insert(order.id, order.clone());
        Ok(order)
    }

    async fn list(&self) -> Result<Vec<Order>, StoreError> {
        let mut orders: Vec<Order> = self.orders.iter().map(|e| e.value().clone()).collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(orders)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Order>, StoreError> {
        Ok(self.orders.get(&id).map(|o| o.value().clone()))
    }

    async fn update(&self, id: Uuid, patch: &OrderPatch) -> Result<Option<Order>, StoreError> {
        let Some(mut order) = self.orders.get_mut(&id) else {
            return Ok(None);
        };

        if let Some(ref phone) = patch.phone {
            order.phone = phone.clone();
        }
        if let Some(ref address) = patch.address {
            order.address = Some(address.clone());
        }
        if let Some(ref district) = patch.district {
            order.district = district.clone();
        }
        if let Some(ref city) = patch.city {
            order.city = city.clone();
        }
        if let Some(ref note) = patch.order_note {
            order.order_note = Some(note.clone());
        }
        if let Some(ref method) = patch.payment_method {
            order.payment_method = Some(method.clone());
        }
        if let Some(ref method) = patch.shipping_method {
            order.shipping_method = Some(method.clone());
        }
        if let Some(ref courier) = patch.courier_address {
            order.courier_address = Some(courier.clone());
        }
        if let Some(status) = patch.status {
            order.status = status;
        }
        order.updated_at = Utc::now();

        Ok(Some(order.value().clone()))
    }

    async fn delete(&self, id: Uuid) -> Result<Option<Order>, StoreError> {
        Ok(self.orders.remove(&id).map(|(_, order)| order))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::db::models::{OrderItem, OrderStatus, Role};

    fn new_identity(email: &str) -> NewIdentity {
        NewIdentity {
            name: "Test".to_string(),
            email: email.to_string(),
            password_hash: "hash".to_string(),
            role: Role::User,
            is_email_confirmed: false,
            needs_password_change: false,
        }
    }

    // ========================================================================
    // Identity Store Tests
    // ========================================================================

    #[tokio::test]
    async fn test_insert_and_find_identity() {
        let store = MemoryIdentityStore::new();
        let created = store.insert(&new_identity("a@example.com")).await.unwrap();

        let by_id = store.find_by_key(&IdentityKey::Id(created.id)).await.unwrap();
        let by_email = store
            .find_by_key(&IdentityKey::Email("a@example.com".to_string()))
            .await
            .unwrap();

        assert_eq!(by_id.unwrap().id, created.id);
        assert_eq!(by_email.unwrap().id, created.id);
        assert!(store.exists(created.id).await.unwrap());
        assert!(!store.exists(Uuid::new_v4()).await.unwrap());
    }

    #[tokio::test]
    async fn test_insert_duplicate_email_conflicts() {
        let store = MemoryIdentityStore::new();
        store.insert(&new_identity("a@example.com")).await.unwrap();

        let result = store.insert(&new_identity("a@example.com")).await;
        assert!(matches!(result, Err(StoreError::Conflict(_))));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_update_by_key_applies_patch() {
        let store = MemoryIdentityStore::new();
        let created = store.insert(&new_identity("a@example.com")).await.unwrap();

        let updated = store
            .update_by_key(
                &IdentityKey::Id(created.id),
                &IdentityPatch::status(AccountStatus::Blocked),
            )
            .await
            .unwrap()
            .unwrap();

        assert_eq!(updated.status, AccountStatus::Blocked);
        assert_eq!(updated.email, "a@example.com");
        assert_eq!(store.write_count(), 2);
    }

    #[tokio::test]
    async fn test_update_by_missing_key_returns_none() {
        let store = MemoryIdentityStore::new();
        store.insert(&new_identity("a@example.com")).await.unwrap();
        let writes = store.write_count();

        let result = store
            .update_by_key(
                &IdentityKey::Email("missing@example.com".to_string()),
                &IdentityPatch::email_confirmed(),
            )
            .await
            .unwrap();

        assert!(result.is_none());
        assert_eq!(store.write_count(), writes);
    }

    #[tokio::test]
    async fn test_active_email_lookup_ignores_blocked() {
        let store = MemoryIdentityStore::new();
        let created = store.insert(&new_identity("a@example.com")).await.unwrap();
        store
            .update_by_key(
                &IdentityKey::Id(created.id),
                &IdentityPatch::status(AccountStatus::Blocked),
            )
            .await
            .unwrap();

        let found = store
            .find_by_key(&IdentityKey::ActiveEmail("a@example.com".to_string()))
            .await
            .unwrap();
        assert!(found.is_none());
    }

    // ========================================================================
    // Banner Store Tests
    // ========================================================================

    #[tokio::test]
    async fn test_banner_crud() {
        let store = MemoryBannerStore::new();
        let banner = store
            .create(&NewBanner {
                url: "https://cdn.example.com/a.png".to_string(),
                public_id: "banners/a".to_string(),
                is_paused: false,
            })
            .await
            .unwrap();

        let updated = store
            .update(
                banner.id,
                &BannerPatch {
                    is_paused: Some(true),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert!(updated.is_paused);
        assert_eq!(updated.url, banner.url);

        assert_eq!(store.list().await.unwrap().len(), 1);
        assert!(store.delete(banner.id).await.unwrap().is_some());
        assert!(store.find_by_id(banner.id).await.unwrap().is_none());
        assert!(store.delete(banner.id).await.unwrap().is_none());
    }

    // ========================================================================
    // Order Store Tests
    // ========================================================================

    #[tokio::test]
    async fn test_order_create_defaults_to_pending() {
        let store = MemoryOrderStore::new();
        let order = store
            .create(&NewOrder {
                phone: "01700000000".to_string(),
                products: vec![OrderItem {
                    product: "p-1".to_string(),
                    quantity: 2,
                    total_price: 40.0,
                }],
                address: None,
                district: "Dhaka".to_string(),
                city: "Dhaka".to_string(),
                order_note: None,
                payment_method: None,
                shipping_method: None,
                courier_address: None,
            })
            .await
            .unwrap();

        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.products.0.len(), 1);

        let updated = store
            .update(
                order.id,
                &OrderPatch {
                    status: Some(OrderStatus::Shipped),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.status, OrderStatus::Shipped);
        assert_eq!(updated.phone, "01700000000");
    }
}
