//! Account administration

use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::core::auth::password::PasswordHasher;
use crate::core::auth::service::AuthError;
use crate::core::config::SuperAdminConfig;
use crate::core::db::models::{
    AccountStatus, Identity, IdentityPatch, IdentityResponse, NewIdentity, Role,
};
use crate::core::db::store::{IdentityKey, IdentityStore};

const SUPER_ADMIN_NAME: &str = "Super Admin";

#[derive(Debug, Clone, Deserialize)]
pub struct ChangeStatusRequest {
    pub status: AccountStatus,
}

/// Administrative operations on user accounts
#[derive(Clone)]
pub struct UserService {
    users: Arc<dyn IdentityStore>,
}

impl UserService {
    pub fn new(users: Arc<dyn IdentityStore>) -> Self {
        Self { users }
    }

    /// Set a user's account status
    pub async fn change_status(
        &self,
        id: Uuid,
        status: AccountStatus,
    ) -> Result<IdentityResponse, AuthError> {
        let identity = self
            .users
            .update_by_key(&IdentityKey::Id(id), &IdentityPatch::status(status))
            .await?
            .ok_or(AuthError::IdentityNotFound)?;

        tracing::info!(user_id = %identity.id, %status, "User status changed");

        Ok(identity.into())
    }
}

/// Create the configured super admin unless an admin with that email exists.
///
/// Returns the new identity, or `None` when nothing was written.
pub async fn seed_super_admin(
    admins: &dyn IdentityStore,
    hasher: &PasswordHasher,
    config: &SuperAdminConfig,
) -> Result<Option<Identity>, AuthError> {
    let key = IdentityKey::Email(config.email.clone());
    if admins.find_by_key(&key).await?.is_some() {
        tracing::debug!(email = %config.email, "Super admin already present");
        return Ok(None);
    }

    let identity = admins
        .insert(&NewIdentity {
            name: SUPER_ADMIN_NAME.to_string(),
            email: config.email.clone(),
            password_hash: hasher.hash(&config.password)?,
            role: Role::SuperAdmin,
            is_email_confirmed: true,
            needs_password_change: false,
        })
        .await?;

    tracing::info!(admin_id = %identity.id, "Super admin created");

    Ok(Some(identity))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::db::memory::MemoryIdentityStore;
    use crate::core::test_support::{test_auth, test_hasher};

    fn super_admin() -> SuperAdminConfig {
        SuperAdminConfig {
            email: "root@shop.test".to_string(),
            password: "root-password-1".to_string(),
        }
    }

    // ========================================================================
    // Status Tests
    // ========================================================================

    #[tokio::test]
    async fn test_change_status_blocks_user() {
        let t = test_auth();
        let user = t.seed_user("buyer@example.com", "correct-horse-1").await;
        let service = UserService::new(t.users.clone());

        let response = service
            .change_status(user.id, AccountStatus::Blocked)
            .await
            .unwrap();

        assert_eq!(response.status, AccountStatus::Blocked);
        assert!(t.users.get(user.id).unwrap().is_blocked());
    }

    #[tokio::test]
    async fn test_change_status_unknown_user() {
        let t = test_auth();
        let service = UserService::new(t.users.clone());

        let result = service
            .change_status(Uuid::new_v4(), AccountStatus::Active)
            .await;

        assert!(matches!(result, Err(AuthError::IdentityNotFound)));
        assert_eq!(t.users.write_count(), 0);
    }

    #[test]
    fn test_change_status_request_rejects_unknown_status() {
        assert!(serde_json::from_str::<ChangeStatusRequest>(r#"{"status":"blocked"}"#).is_ok());
        assert!(serde_json::from_str::<ChangeStatusRequest>(r#"{"status":"banned"}"#).is_err());
    }

    // ========================================================================
    // Seeding Tests
    // ========================================================================

    #[tokio::test]
    async fn test_seed_super_admin_once() {
        let admins = MemoryIdentityStore::new();
        let hasher = test_hasher();

        let created = seed_super_admin(&admins, &hasher, &super_admin())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(created.role, Role::SuperAdmin);
        assert!(created.is_email_confirmed);
        assert!(hasher.verify("root-password-1", &created.password_hash));

        let again = seed_super_admin(&admins, &hasher, &super_admin()).await.unwrap();
        assert!(again.is_none());
        assert_eq!(admins.len(), 1);
    }
}
