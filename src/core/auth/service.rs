//! Authentication service
//!
//! Each flow is a short linear chain: load the identity, run the account
//! guard, verify credentials or a token, then at most one write and at most
//! one email, always in that order.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::core::auth::guard::{AccountGuard, GuardError};
use crate::core::auth::jwt::{ClaimSet, Claims, JwtError, JwtService, TokenPair, TokenPurpose};
use crate::core::auth::password::{PasswordError, PasswordHasher};
use crate::core::auth::templates;
use crate::core::db::models::{Identity, IdentityPatch, IdentityResponse, Role};
use crate::core::db::store::{IdentityKey, IdentityStore, StoreError};
use crate::core::mail::{EmailMessage, MailError, Mailer};

const MIN_PASSWORD_LENGTH: usize = 8;

/// bcrypt ignores input past 72 bytes
const MAX_PASSWORD_BYTES: usize = 72;

/// Coarse error classes, one per HTTP status family
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Forbidden,
    BadRequest,
    Internal,
}

/// Authentication service error types
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("The user is not found!")]
    IdentityNotFound,

    #[error("This account is deleted! Please contact the authority.")]
    Deleted,

    #[error("You are blocked by the authority! Please contact them to know the issue!")]
    Blocked,

    #[error("Your email is not confirmed! Please confirm your email first to login!")]
    EmailNotConfirmed,

    #[error("Invalid credentials!")]
    InvalidCredentials,

    #[error("Password does not match!")]
    PasswordMismatch,

    #[error("You are not authorized!")]
    Unauthorized,

    #[error("Invalid or expired token!")]
    InvalidToken,

    #[error("You are not authorized!")]
    MissingToken,

    #[error("Your email is already confirmed!")]
    EmailAlreadyConfirmed,

    #[error("{0}")]
    Validation(String),

    #[error("Email delivery failed: {0}")]
    Mail(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AuthError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AuthError::IdentityNotFound => ErrorKind::NotFound,
            AuthError::Deleted
            | AuthError::Blocked
            | AuthError::EmailNotConfirmed
            | AuthError::InvalidCredentials
            | AuthError::PasswordMismatch
            | AuthError::Unauthorized
            | AuthError::InvalidToken => ErrorKind::Forbidden,
            AuthError::MissingToken
            | AuthError::EmailAlreadyConfirmed
            | AuthError::Validation(_) => ErrorKind::BadRequest,
            AuthError::Mail(_) | AuthError::Internal(_) => ErrorKind::Internal,
        }
    }
}

impl From<GuardError> for AuthError {
    fn from(err: GuardError) -> Self {
        match err {
            GuardError::NotFound => AuthError::IdentityNotFound,
            GuardError::Deleted => AuthError::Deleted,
            GuardError::Blocked => AuthError::Blocked,
            GuardError::EmailNotConfirmed => AuthError::EmailNotConfirmed,
        }
    }
}

impl From<JwtError> for AuthError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::InvalidToken => AuthError::InvalidToken,
            _ => AuthError::Internal(err.to_string()),
        }
    }
}

impl From<StoreError> for AuthError {
    fn from(err: StoreError) -> Self {
        AuthError::Internal(err.to_string())
    }
}

impl From<PasswordError> for AuthError {
    fn from(err: PasswordError) -> Self {
        AuthError::Internal(err.to_string())
    }
}

impl From<MailError> for AuthError {
    fn from(err: MailError) -> Self {
        AuthError::Mail(err.to_string())
    }
}

/// Login request data
#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub old_password: String,
    pub new_password: String,
}

/// Email-only request (forgot password, resend confirmation)
#[derive(Debug, Clone, Deserialize)]
pub struct EmailRequest {
    pub email: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    /// Falls back to the Authorization header when absent
    #[serde(default)]
    pub token: Option<String>,
    pub new_password: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    #[serde(default)]
    pub refresh_token: Option<String>,
}

/// Tokens returned from a successful login
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    #[serde(flatten)]
    pub tokens: TokenPair,
    pub needs_password_change: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshResponse {
    pub access_token: String,
    pub access_expires_at: i64,
}

/// A verified access token and the identity behind it
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub claims: Claims,
    pub identity: Identity,
}

/// Base URLs and contact details embedded in emails
#[derive(Debug, Clone)]
pub struct AuthLinks {
    /// Storefront client, hosts the reset-password page
    pub client_url: String,
    /// This API, serves the confirm-email endpoint
    pub app_url: String,
    pub support_email: Option<String>,
}

impl AuthLinks {
    pub fn reset_link(&self, token: &str) -> String {
        format!("{}/reset-pass?token={}", self.client_url.trim_end_matches('/'), token)
    }

    pub fn confirmation_link(&self, token: &str) -> String {
        format!(
            "{}/api/auth/confirm-email?token={}",
            self.app_url.trim_end_matches('/'),
            token
        )
    }
}

/// Authentication service
#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn IdentityStore>,
    admins: Arc<dyn IdentityStore>,
    jwt: JwtService,
    hasher: PasswordHasher,
    mailer: Arc<dyn Mailer>,
    links: AuthLinks,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn IdentityStore>,
        admins: Arc<dyn IdentityStore>,
        jwt: JwtService,
        hasher: PasswordHasher,
        mailer: Arc<dyn Mailer>,
        links: AuthLinks,
    ) -> Self {
        Self {
            users,
            admins,
            jwt,
            hasher,
            mailer,
            links,
        }
    }

    pub fn jwt(&self) -> &JwtService {
        &self.jwt
    }

    pub fn hasher(&self) -> &PasswordHasher {
        &self.hasher
    }

    /// Store holding identities with `role`
    fn store_for(&self, role: Role) -> &dyn IdentityStore {
        if role.is_admin() {
            self.admins.as_ref()
        } else {
            self.users.as_ref()
        }
    }

    /// Validate email format
    pub(crate) fn validate_email(email: &str) -> Result<(), AuthError> {
        let invalid = || AuthError::Validation("Invalid email address".to_string());

        let (local, domain) = email.split_once('@').ok_or_else(invalid)?;
        if local.is_empty() || domain.is_empty() || domain.contains('@') {
            return Err(invalid());
        }

        // Domain must have something on both sides of every dot
        if !domain.contains('.') || domain.split('.').any(|p| p.is_empty()) {
            return Err(invalid());
        }

        if email.chars().any(char::is_whitespace) {
            return Err(invalid());
        }

        Ok(())
    }

    /// Validate a password that is about to be stored
    pub(crate) fn validate_new_password(password: &str) -> Result<(), AuthError> {
        if password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(AuthError::Validation(format!(
                "Password must be at least {MIN_PASSWORD_LENGTH} characters"
            )));
        }

        if password.len() > MAX_PASSWORD_BYTES {
            return Err(AuthError::Validation(format!(
                "Password must be at most {MAX_PASSWORD_BYTES} bytes"
            )));
        }

        Ok(())
    }

    fn require_token(token: Option<&str>) -> Result<&str, AuthError> {
        token
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(AuthError::MissingToken)
    }

    /// Login a user by email and password
    pub async fn login_user(&self, request: LoginRequest) -> Result<LoginResponse, AuthError> {
        Self::validate_email(&request.email)?;

        let found = self
            .users
            .find_by_key(&IdentityKey::Email(request.email.clone()))
            .await?;
        let identity = Self::conceal_unknown(AccountGuard::USER_LOGIN.check(found), &request.email)?;

        self.verify_credentials(&identity, &request.password)?;

        let tokens = self.jwt.issue_session(&ClaimSet::from(&identity))?;

        tracing::info!(identity_id = %identity.id, "User logged in");

        Ok(LoginResponse {
            tokens,
            needs_password_change: identity.needs_password_change,
        })
    }

    /// Login an admin; email confirmation is not required
    pub async fn login_admin(&self, request: LoginRequest) -> Result<LoginResponse, AuthError> {
        Self::validate_email(&request.email)?;

        let found = self
            .admins
            .find_by_key(&IdentityKey::Email(request.email.clone()))
            .await?;
        let identity = Self::conceal_unknown(AccountGuard::ACTIVE.check(found), &request.email)?;

        self.verify_credentials(&identity, &request.password)?;

        let tokens = self.jwt.issue_session(&ClaimSet::from(&identity))?;

        tracing::info!(identity_id = %identity.id, role = %identity.role, "Admin logged in");

        Ok(LoginResponse {
            tokens,
            needs_password_change: identity.needs_password_change,
        })
    }

    /// Unknown emails surface as invalid credentials at login
    fn conceal_unknown(
        checked: Result<Identity, GuardError>,
        email: &str,
    ) -> Result<Identity, AuthError> {
        checked.map_err(|err| match err {
            GuardError::NotFound => {
                tracing::debug!(email, "Login for unknown email");
                AuthError::InvalidCredentials
            }
            other => other.into(),
        })
    }

    fn verify_credentials(&self, identity: &Identity, password: &str) -> Result<(), AuthError> {
        if !self.hasher.verify(password, &identity.password_hash) {
            tracing::debug!(identity_id = %identity.id, "Password mismatch at login");
            return Err(AuthError::InvalidCredentials);
        }
        Ok(())
    }

    /// Change the password of the identity behind `claims`
    pub async fn change_password(
        &self,
        claims: &Claims,
        request: ChangePasswordRequest,
    ) -> Result<IdentityResponse, AuthError> {
        Self::validate_new_password(&request.new_password)?;

        let key = IdentityKey::IdAndEmail(claims.identity_id()?, claims.email.clone());
        let store = self.store_for(claims.role);

        let identity = AccountGuard::NOT_BLOCKED.check(store.find_by_key(&key).await?)?;

        if !self
            .hasher
            .verify(&request.old_password, &identity.password_hash)
        {
            return Err(AuthError::PasswordMismatch);
        }

        let password_hash = self.hasher.hash(&request.new_password)?;
        let updated = store
            .update_by_key(&key, &IdentityPatch::password(password_hash))
            .await?
            .ok_or(AuthError::IdentityNotFound)?;

        self.mailer
            .send(&EmailMessage::new(
                &updated.email,
                templates::PASSWORD_CHANGED_SUBJECT,
                templates::password_changed(
                    &updated.name,
                    &updated.email,
                    self.links.support_email.as_deref(),
                ),
            ))
            .await?;

        tracing::info!(identity_id = %updated.id, "Password changed");

        Ok(updated.into())
    }

    /// Email a password reset link to an active user
    pub async fn forgot_password(&self, request: EmailRequest) -> Result<(), AuthError> {
        Self::validate_email(&request.email)?;

        let identity = AccountGuard::EXISTS.check(
            self.users
                .find_by_key(&IdentityKey::ActiveEmail(request.email))
                .await?,
        )?;

        let (token, _) = self
            .jwt
            .issue(&ClaimSet::from(&identity), TokenPurpose::PasswordReset)?;

        self.mailer
            .send(&EmailMessage::new(
                &identity.email,
                templates::RESET_PASSWORD_SUBJECT,
                templates::reset_password(
                    &identity.name,
                    &identity.email,
                    &self.links.reset_link(&token),
                ),
            ))
            .await?;

        tracing::info!(identity_id = %identity.id, "Password reset link sent");
        Ok(())
    }

    /// Set a new password using a reset token
    pub async fn reset_password(
        &self,
        token: Option<&str>,
        new_password: &str,
    ) -> Result<IdentityResponse, AuthError> {
        let token = Self::require_token(token)?;
        Self::validate_new_password(new_password)?;

        let claims = self.jwt.verify(token, TokenPurpose::PasswordReset)?;
        let claimed_id = claims.identity_id()?;

        let identity = AccountGuard::NOT_BLOCKED.check(
            self.users
                .find_by_key(&IdentityKey::Id(claimed_id))
                .await?,
        )?;

        if identity.id != claimed_id {
            tracing::warn!(
                claimed = %claimed_id,
                loaded = %identity.id,
                "Reset token subject does not match loaded identity"
            );
            return Err(AuthError::Unauthorized);
        }

        // A token issued before the last password change has been used already
        if identity.password_changed_after(claims.iat) {
            return Err(AuthError::InvalidToken);
        }

        let password_hash = self.hasher.hash(new_password)?;
        let updated = self
            .users
            .update_by_key(
                &IdentityKey::Id(identity.id),
                &IdentityPatch::password(password_hash),
            )
            .await?
            .ok_or(AuthError::IdentityNotFound)?;

        tracing::info!(identity_id = %updated.id, "Password reset");

        Ok(updated.into())
    }

    /// Exchange a refresh token for a new access token
    pub async fn refresh_token(&self, token: Option<&str>) -> Result<RefreshResponse, AuthError> {
        let token = Self::require_token(token)?;

        let claims = self.jwt.verify(token, TokenPurpose::Refresh)?;
        let id = claims.identity_id()?;

        let identity = AccountGuard::EXISTS.check(
            self.store_for(claims.role)
                .find_by_key(&IdentityKey::Id(id))
                .await?,
        )?;

        let (access_token, access_expires_at) = self
            .jwt
            .issue(&ClaimSet::from(&identity), TokenPurpose::Access)?;

        tracing::debug!(identity_id = %identity.id, "Access token refreshed");

        Ok(RefreshResponse {
            access_token,
            access_expires_at,
        })
    }

    /// Mark a user's email as confirmed
    pub async fn confirm_email(&self, token: Option<&str>) -> Result<IdentityResponse, AuthError> {
        let token = Self::require_token(token)?;

        let claims = self.jwt.verify(token, TokenPurpose::EmailConfirmation)?;
        let id = claims.identity_id()?;

        let identity = AccountGuard::NOT_BLOCKED
            .check(self.users.find_by_key(&IdentityKey::Id(id)).await?)?;

        if identity.is_email_confirmed {
            return Err(AuthError::EmailAlreadyConfirmed);
        }

        let updated = self
            .users
            .update_by_key(
                &IdentityKey::IdAndEmail(id, claims.email),
                &IdentityPatch::email_confirmed(),
            )
            .await?
            .ok_or(AuthError::IdentityNotFound)?;

        tracing::info!(identity_id = %updated.id, "Email confirmed");

        Ok(updated.into())
    }

    /// Send a fresh confirmation link to an unconfirmed user
    pub async fn resend_confirmation(&self, request: EmailRequest) -> Result<(), AuthError> {
        Self::validate_email(&request.email)?;

        let identity = AccountGuard::ACTIVE.check(
            self.users
                .find_by_key(&IdentityKey::Email(request.email))
                .await?,
        )?;

        if identity.is_email_confirmed {
            return Err(AuthError::EmailAlreadyConfirmed);
        }

        self.send_confirmation(&identity).await
    }

    /// Issue a confirmation token for `identity` and email the link
    pub async fn send_confirmation(&self, identity: &Identity) -> Result<(), AuthError> {
        let (token, _) = self
            .jwt
            .issue(&ClaimSet::from(identity), TokenPurpose::EmailConfirmation)?;

        self.mailer
            .send(&EmailMessage::new(
                &identity.email,
                templates::CONFIRM_EMAIL_SUBJECT,
                templates::confirm_email(&identity.name, &self.links.confirmation_link(&token)),
            ))
            .await?;

        tracing::info!(identity_id = %identity.id, "Confirmation email sent");
        Ok(())
    }

    /// Load the identity behind an access token's claims
    pub async fn get_me(&self, claims: &Claims) -> Result<IdentityResponse, AuthError> {
        let key = IdentityKey::IdAndEmail(claims.identity_id()?, claims.email.clone());

        self.store_for(claims.role)
            .find_by_key(&key)
            .await?
            .map(IdentityResponse::from)
            .ok_or(AuthError::IdentityNotFound)
    }

    /// Verify a bearer access token and check the caller's role.
    ///
    /// An empty `roles` slice admits any role.
    pub async fn authorize(
        &self,
        token: Option<&str>,
        roles: &[Role],
    ) -> Result<AuthSession, AuthError> {
        let token = Self::require_token(token)?;
        let claims = self.jwt.verify(token, TokenPurpose::Access)?;

        if !roles.is_empty() && !roles.contains(&claims.role) {
            tracing::debug!(role = %claims.role, "Role not permitted");
            return Err(AuthError::Unauthorized);
        }

        let identity = AccountGuard::ACTIVE.check(
            self.store_for(claims.role)
                .find_by_key(&IdentityKey::Id(claims.identity_id()?))
                .await?,
        )?;

        if identity.password_changed_after(claims.iat) {
            return Err(AuthError::Unauthorized);
        }

        Ok(AuthSession { claims, identity })
    }
}
