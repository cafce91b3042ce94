//! Database models for the storefront
//!
//! This module defines the entity structs that map to PostgreSQL tables, the
//! DTOs used to create and patch them, and the API-facing views.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

// ============================================================================
// Identity Model
// ============================================================================

/// Role carried by an identity and embedded in every token it receives
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    sqlx::Type,
    Default,
    derive_more::Display,
)]
#[sqlx(type_name = "VARCHAR", rename_all = "camelCase")]
#[serde(rename_all = "camelCase")]
pub enum Role {
    #[default]
    #[display("user")]
    User,
    #[display("admin")]
    Admin,
    #[display("superAdmin")]
    SuperAdmin,
    #[display("student")]
    Student,
}

impl Role {
    /// Every role, in declaration order
    pub const ALL: [Role; 4] = [Role::User, Role::Admin, Role::SuperAdmin, Role::Student];

    /// Roles allowed to administer the shop
    pub const ADMINS: [Role; 2] = [Role::Admin, Role::SuperAdmin];

    /// Admin roles live in the admin store, everything else in the user store
    pub fn is_admin(self) -> bool {
        matches!(self, Role::Admin | Role::SuperAdmin)
    }
}

/// Account status of an identity
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    sqlx::Type,
    Default,
    derive_more::Display,
)]
#[sqlx(type_name = "VARCHAR", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum AccountStatus {
    #[default]
    #[display("active")]
    Active,
    #[display("blocked")]
    Blocked,
}

/// Identity entity (user or admin account)
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Identity {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: Role,
    pub status: AccountStatus,
    pub is_deleted: bool,
    pub is_email_confirmed: bool,
    pub needs_password_change: bool,
    pub password_changed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Identity {
    pub fn is_blocked(&self) -> bool {
        self.status == AccountStatus::Blocked
    }

    /// Whether the password was changed after a token with the given `iat` was issued.
    ///
    /// Compared at whole-second resolution, the resolution of `iat`.
    pub fn password_changed_after(&self, issued_at: i64) -> bool {
        self.password_changed_at
            .map(|changed| changed.timestamp() > issued_at)
            .unwrap_or(false)
    }
}

/// Identity data for creation (password must already be hashed)
#[derive(Debug, Clone)]
pub struct NewIdentity {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub is_email_confirmed: bool,
    pub needs_password_change: bool,
}

/// Partial identity update; `None` leaves the column untouched
#[derive(Debug, Clone, Default)]
pub struct IdentityPatch {
    pub password_hash: Option<String>,
    pub status: Option<AccountStatus>,
    pub is_deleted: Option<bool>,
    pub is_email_confirmed: Option<bool>,
    pub needs_password_change: Option<bool>,
    pub password_changed_at: Option<DateTime<Utc>>,
}

impl IdentityPatch {
    /// Patch written by every password change or reset
    pub fn password(password_hash: String) -> Self {
        Self {
            password_hash: Some(password_hash),
            needs_password_change: Some(false),
            password_changed_at: Some(Utc::now()),
            ..Default::default()
        }
    }

    pub fn status(status: AccountStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }

    pub fn email_confirmed() -> Self {
        Self {
            is_email_confirmed: Some(true),
            ..Default::default()
        }
    }
}

/// Identity without sensitive data (for API responses)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityResponse {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub status: AccountStatus,
    pub is_email_confirmed: bool,
    pub needs_password_change: bool,
    pub password_changed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<Identity> for IdentityResponse {
    fn from(identity: Identity) -> Self {
        Self {
            id: identity.id,
            name: identity.name,
            email: identity.email,
            role: identity.role,
            status: identity.status,
            is_email_confirmed: identity.is_email_confirmed,
            needs_password_change: identity.needs_password_change,
            password_changed_at: identity.password_changed_at,
            created_at: identity.created_at,
        }
    }
}

// ============================================================================
// Banner Model
// ============================================================================

/// Banner entity; the image itself lives on the external image host
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Banner {
    pub id: Uuid,
    pub url: String,
    pub public_id: Option<String>,
    #[serde(rename = "isPaused")]
    pub is_paused: bool,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

/// Banner data for creation
#[derive(Debug, Clone)]
pub struct NewBanner {
    pub url: String,
    pub public_id: String,
    pub is_paused: bool,
}

/// Banner data for updates
#[derive(Debug, Clone, Default)]
pub struct BannerPatch {
    pub url: Option<String>,
    pub is_paused: Option<bool>,
}

// ============================================================================
// Order Model
// ============================================================================

/// Fulfilment state of an order
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    sqlx::Type,
    Default,
    derive_more::Display,
)]
#[sqlx(type_name = "VARCHAR", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    #[default]
    #[display("pending")]
    Pending,
    #[display("processing")]
    Processing,
    #[display("shipped")]
    Shipped,
    #[display("delivered")]
    Delivered,
}

/// One product line of an order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    pub product: String,
    pub quantity: u32,
    pub total_price: f64,
}

/// Order entity
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Order {
    pub id: Uuid,
    pub phone: String,
    pub products: sqlx::types::Json<Vec<OrderItem>>,
    pub address: Option<String>,
    pub district: String,
    pub city: String,
    pub order_note: Option<String>,
    pub payment_method: Option<String>,
    pub shipping_method: Option<String>,
    pub courier_address: Option<String>,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Order data for creation
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub phone: String,
    pub products: Vec<OrderItem>,
    pub address: Option<String>,
    pub district: String,
    pub city: String,
    pub order_note: Option<String>,
    pub payment_method: Option<String>,
    pub shipping_method: Option<String>,
    pub courier_address: Option<String>,
}

/// Order data for updates
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OrderPatch {
    pub phone: Option<String>,
    pub address: Option<String>,
    pub district: Option<String>,
    pub city: Option<String>,
    pub order_note: Option<String>,
    pub payment_method: Option<String>,
    pub shipping_method: Option<String>,
    pub courier_address: Option<String>,
    pub status: Option<OrderStatus>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn sample_identity() -> Identity {
        Identity {
            id: Uuid::new_v4(),
            name: "Test User".to_string(),
            email: "test@example.com".to_string(),
            password_hash: "$2b$04$hash".to_string(),
            role: Role::User,
            status: AccountStatus::Active,
            is_deleted: false,
            is_email_confirmed: true,
            needs_password_change: false,
            password_changed_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_role_serialization() {
        assert_eq!(serde_json::to_string(&Role::SuperAdmin).unwrap(), r#""superAdmin""#);
        assert_eq!(serde_json::to_string(&Role::User).unwrap(), r#""user""#);
        assert_eq!(Role::SuperAdmin.to_string(), "superAdmin");
    }

    #[test]
    fn test_role_is_admin() {
        assert!(Role::Admin.is_admin());
        assert!(Role::SuperAdmin.is_admin());
        assert!(!Role::User.is_admin());
        assert!(!Role::Student.is_admin());
    }

    #[test]
    fn test_identity_serialization_hides_password_hash() {
        let json = serde_json::to_string(&sample_identity()).unwrap();
        assert!(!json.contains("password_hash"));
        assert!(!json.contains("$2b$"));
    }

    #[test]
    fn test_identity_response_has_no_password_field() {
        let response: IdentityResponse = sample_identity().into();
        let json = serde_json::to_string(&response).unwrap();

        assert!(!json.to_lowercase().contains("password\""));
        assert!(json.contains("isEmailConfirmed"));
        assert!(json.contains("needsPasswordChange"));
    }

    #[test]
    fn test_password_changed_after() {
        let mut identity = sample_identity();
        let now = Utc::now();
        assert!(!identity.password_changed_after(now.timestamp()));

        identity.password_changed_at = Some(now);
        assert!(identity.password_changed_after((now - Duration::seconds(5)).timestamp()));
        assert!(!identity.password_changed_after(now.timestamp()));
        assert!(!identity.password_changed_after((now + Duration::seconds(5)).timestamp()));
    }

    #[test]
    fn test_password_patch_clears_needs_password_change() {
        let patch = IdentityPatch::password("hash".to_string());
        assert_eq!(patch.password_hash.as_deref(), Some("hash"));
        assert_eq!(patch.needs_password_change, Some(false));
        assert!(patch.password_changed_at.is_some());
        assert!(patch.status.is_none());
    }

    #[test]
    fn test_order_status_deserialization() {
        let status: OrderStatus = serde_json::from_str(r#""shipped""#).unwrap();
        assert_eq!(status, OrderStatus::Shipped);
        assert!(serde_json::from_str::<OrderStatus>(r#""lost""#).is_err());
        assert_eq!(OrderStatus::default(), OrderStatus::Pending);
    }

    #[test]
    fn test_banner_serialization_field_names() {
        let banner = Banner {
            id: Uuid::new_v4(),
            url: "https://cdn.example.com/a.png".to_string(),
            public_id: Some("banners/a".to_string()),
            is_paused: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let json = serde_json::to_string(&banner).unwrap();
        assert!(json.contains("\"isPaused\":true"));
        assert!(json.contains("\"public_id\":\"banners/a\""));
    }
}
