//! Shared fixtures for service and router tests

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use crate::core::auth::jwt::{JwtConfig, JwtService};
use crate::core::auth::password::PasswordHasher;
use crate::core::auth::service::{AuthLinks, AuthService};
use crate::core::db::memory::MemoryIdentityStore;
use crate::core::db::models::{AccountStatus, Identity, IdentityPatch, NewIdentity, Role};
use crate::core::db::store::{IdentityKey, IdentityStore};
use crate::core::mail::{EmailMessage, MailError, Mailer};
use crate::core::media::{ImageHost, ImageHostError};

/// Mailer that records every message
#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<EmailMessage>>,
    fail: AtomicBool,
}

impl RecordingMailer {
    pub fn sent(&self) -> Vec<EmailMessage> {
        self.sent.lock().unwrap().clone()
    }

    pub fn count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }

    /// Make subsequent sends fail
    pub fn fail_next(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, message: &EmailMessage) -> Result<(), MailError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(MailError::Transport("connection refused".to_string()));
        }
        self.sent.lock().unwrap().push(message.clone());
        Ok(())
    }
}

/// Image host that records destroyed ids
#[derive(Default)]
pub struct RecordingImageHost {
    destroyed: Mutex<Vec<String>>,
    fail: AtomicBool,
}

impl RecordingImageHost {
    pub fn failing() -> Self {
        let host = Self::default();
        host.fail.store(true, Ordering::SeqCst);
        host
    }

    pub fn destroyed(&self) -> Vec<String> {
        self.destroyed.lock().unwrap().clone()
    }
}

#[async_trait]
impl ImageHost for RecordingImageHost {
    async fn destroy(&self, public_id: &str) -> Result<(), ImageHostError> {
        self.destroyed.lock().unwrap().push(public_id.to_string());
        if self.fail.load(Ordering::SeqCst) {
            return Err(ImageHostError::Rejected {
                public_id: public_id.to_string(),
                result: "not found".to_string(),
            });
        }
        Ok(())
    }
}

/// Lowest bcrypt cost, keeps tests fast
pub fn test_hasher() -> PasswordHasher {
    PasswordHasher::new(4).unwrap()
}

pub fn test_jwt() -> JwtService {
    JwtService::new(JwtConfig::new("storefront-test-secret"))
}

pub fn test_links() -> AuthLinks {
    AuthLinks {
        client_url: "https://shop.test".to_string(),
        app_url: "https://api.shop.test".to_string(),
        support_email: Some("help@shop.test".to_string()),
    }
}

/// Auth service over in-memory stores with handles to every collaborator
pub struct TestAuth {
    pub service: AuthService,
    pub users: Arc<MemoryIdentityStore>,
    pub admins: Arc<MemoryIdentityStore>,
    pub mailer: Arc<RecordingMailer>,
    pub links: AuthLinks,
}

pub fn test_auth() -> TestAuth {
    let users = Arc::new(MemoryIdentityStore::new());
    let admins = Arc::new(MemoryIdentityStore::new());
    let mailer = Arc::new(RecordingMailer::default());
    let links = test_links();

    let service = AuthService::new(
        users.clone(),
        admins.clone(),
        test_jwt(),
        test_hasher(),
        mailer.clone(),
        links.clone(),
    );

    TestAuth {
        service,
        users,
        admins,
        mailer,
        links,
    }
}

impl TestAuth {
    async fn seed(
        &self,
        store: &MemoryIdentityStore,
        email: &str,
        password: &str,
        role: Role,
        confirmed: bool,
    ) -> Identity {
        store
            .insert(&NewIdentity {
                name: email.split('@').next().unwrap_or("test").to_string(),
                email: email.to_string(),
                password_hash: test_hasher().hash(password).unwrap(),
                role,
                is_email_confirmed: confirmed,
                needs_password_change: role.is_admin(),
            })
            .await
            .unwrap()
    }

    /// Active, confirmed user
    pub async fn seed_user(&self, email: &str, password: &str) -> Identity {
        self.seed(&self.users, email, password, Role::User, true).await
    }

    pub async fn seed_unconfirmed_user(&self, email: &str, password: &str) -> Identity {
        self.seed(&self.users, email, password, Role::User, false).await
    }

    pub async fn seed_admin(&self, email: &str, password: &str, role: Role) -> Identity {
        self.seed(&self.admins, email, password, role, true).await
    }

    fn store_of(&self, identity: &Identity) -> &MemoryIdentityStore {
        if identity.role.is_admin() {
            &self.admins
        } else {
            &self.users
        }
    }

    pub async fn block(&self, identity: &Identity) {
        self.store_of(identity)
            .update_by_key(
                &IdentityKey::Id(identity.id),
                &IdentityPatch::status(AccountStatus::Blocked),
            )
            .await
            .unwrap();
    }

    pub async fn soft_delete(&self, identity: &Identity) {
        self.store_of(identity)
            .update_by_key(
                &IdentityKey::Id(identity.id),
                &IdentityPatch {
                    is_deleted: Some(true),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
    }
}
