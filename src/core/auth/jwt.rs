//! JWT utilities for token generation and validation
//!
//! Tokens are HS256-signed. Each purpose (access, refresh, password reset,
//! email confirmation) has its own secret and lifetime, and the purpose is
//! embedded as a claim so a token minted for one flow never passes another.

use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::core::config::parse_duration;
use crate::core::db::models::{Identity, Role};

/// Default token issuer
pub const DEFAULT_ISSUER: &str = "storefront";

/// Default access token lifetime (15 minutes)
const ACCESS_TOKEN_TTL_SECS: i64 = 15 * 60;

/// Default refresh token lifetime (7 days)
const REFRESH_TOKEN_TTL_SECS: i64 = 7 * 24 * 60 * 60;

/// Default password reset token lifetime (10 minutes)
const PASSWORD_RESET_TTL_SECS: i64 = 10 * 60;

/// Default email confirmation token lifetime (1 day)
const EMAIL_CONFIRMATION_TTL_SECS: i64 = 24 * 60 * 60;

/// What a token may be used for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, derive_more::Display)]
#[serde(rename_all = "snake_case")]
pub enum TokenPurpose {
    #[display("access")]
    Access,
    #[display("refresh")]
    Refresh,
    #[display("password_reset")]
    PasswordReset,
    #[display("email_confirmation")]
    EmailConfirmation,
}

/// Signing secret and lifetime for one purpose
#[derive(Clone)]
pub struct TokenKey {
    pub secret: String,
    pub ttl: Duration,
}

impl TokenKey {
    pub fn new(secret: impl Into<String>, ttl: Duration) -> Self {
        Self {
            secret: secret.into(),
            ttl,
        }
    }
}

impl fmt::Debug for TokenKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenKey")
            .field("secret", &"<redacted>")
            .field("ttl_secs", &self.ttl.num_seconds())
            .finish()
    }
}

/// JWT configuration
#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub access: TokenKey,
    pub refresh: TokenKey,
    pub password_reset: TokenKey,
    pub email_confirmation: TokenKey,
    pub issuer: String,
}

impl JwtConfig {
    /// Derive one secret per purpose from a single base secret.
    pub fn new(secret: impl Into<String>) -> Self {
        let secret = secret.into();
        Self {
            access: TokenKey::new(
                format!("{secret}.access"),
                Duration::seconds(ACCESS_TOKEN_TTL_SECS),
            ),
            refresh: TokenKey::new(
                format!("{secret}.refresh"),
                Duration::seconds(REFRESH_TOKEN_TTL_SECS),
            ),
            password_reset: TokenKey::new(
                format!("{secret}.password_reset"),
                Duration::seconds(PASSWORD_RESET_TTL_SECS),
            ),
            email_confirmation: TokenKey::new(
                format!("{secret}.email_confirmation"),
                Duration::seconds(EMAIL_CONFIRMATION_TTL_SECS),
            ),
            issuer: DEFAULT_ISSUER.to_string(),
        }
    }

    /// Build from a variable lookup (environment, map in tests).
    ///
    /// Every secret is required; lifetimes fall back to the defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, JwtError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let key = |secret_var: &'static str,
                   ttl_var: &'static str,
                   default_secs: i64|
         -> Result<TokenKey, JwtError> {
            let secret = lookup(secret_var)
                .filter(|s| !s.trim().is_empty())
                .ok_or(JwtError::MissingSecret(secret_var))?;
            let ttl = match lookup(ttl_var) {
                Some(raw) => parse_duration(&raw).ok_or(JwtError::InvalidDuration(ttl_var))?,
                None => Duration::seconds(default_secs),
            };
            Ok(TokenKey::new(secret, ttl))
        };

        Ok(Self {
            access: key(
                "JWT_ACCESS_SECRET",
                "JWT_ACCESS_EXPIRES_IN",
                ACCESS_TOKEN_TTL_SECS,
            )?,
            refresh: key(
                "JWT_REFRESH_SECRET",
                "JWT_REFRESH_EXPIRES_IN",
                REFRESH_TOKEN_TTL_SECS,
            )?,
            password_reset: key(
                "PASSWORD_RESET_SECRET",
                "PASSWORD_RESET_EXPIRES_IN",
                PASSWORD_RESET_TTL_SECS,
            )?,
            email_confirmation: key(
                "EMAIL_CONFIRMATION_SECRET",
                "EMAIL_CONFIRMATION_EXPIRES_IN",
                EMAIL_CONFIRMATION_TTL_SECS,
            )?,
            issuer: lookup("JWT_ISSUER").unwrap_or_else(|| DEFAULT_ISSUER.to_string()),
        })
    }

    pub fn from_env() -> Result<Self, JwtError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn key(&self, purpose: TokenPurpose) -> &TokenKey {
        match purpose {
            TokenPurpose::Access => &self.access,
            TokenPurpose::Refresh => &self.refresh,
            TokenPurpose::PasswordReset => &self.password_reset,
            TokenPurpose::EmailConfirmation => &self.email_confirmation,
        }
    }

    fn key_mut(&mut self, purpose: TokenPurpose) -> &mut TokenKey {
        match purpose {
            TokenPurpose::Access => &mut self.access,
            TokenPurpose::Refresh => &mut self.refresh,
            TokenPurpose::PasswordReset => &mut self.password_reset,
            TokenPurpose::EmailConfirmation => &mut self.email_confirmation,
        }
    }

    /// Override the lifetime for one purpose
    pub fn ttl(mut self, purpose: TokenPurpose, ttl: Duration) -> Self {
        self.key_mut(purpose).ttl = ttl;
        self
    }

    /// Override the secret for one purpose
    pub fn secret(mut self, purpose: TokenPurpose, secret: impl Into<String>) -> Self {
        self.key_mut(purpose).secret = secret.into();
        self
    }

    pub fn issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = issuer.into();
        self
    }
}

/// JWT errors
#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    #[error("{0} environment variable not set")]
    MissingSecret(&'static str),

    #[error("{0} is not a valid duration")]
    InvalidDuration(&'static str),

    #[error("Token encoding failed: {0}")]
    EncodingError(String),

    #[error("Invalid token")]
    InvalidToken,
}

/// Identity data embedded in a token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimSet {
    pub id: Uuid,
    pub email: String,
    pub role: Role,
}

impl From<&Identity> for ClaimSet {
    fn from(identity: &Identity) -> Self {
        Self {
            id: identity.id,
            email: identity.email.clone(),
            role: identity.role,
        }
    }
}

/// JWT claims structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (identity ID)
    pub sub: String,
    pub email: String,
    pub role: Role,
    pub purpose: TokenPurpose,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    pub iss: String,
    /// Unique token ID
    pub jti: String,
}

impl Claims {
    pub fn identity_id(&self) -> Result<Uuid, JwtError> {
        Uuid::parse_str(&self.sub).map_err(|_| JwtError::InvalidToken)
    }
}

/// Access + refresh token pair
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    /// Access token expiration (Unix timestamp)
    pub access_expires_at: i64,
    /// Refresh token expiration (Unix timestamp)
    pub refresh_expires_at: i64,
    /// Always "Bearer"
    pub token_type: String,
}

/// Sign a token carrying `claims` for `purpose`.
///
/// Returns the token and its expiration timestamp.
pub fn create_token(
    claims: &ClaimSet,
    purpose: TokenPurpose,
    key: &TokenKey,
    issuer: &str,
) -> Result<(String, i64), JwtError> {
    let now = Utc::now();
    let exp = now + key.ttl;

    let claims = Claims {
        sub: claims.id.to_string(),
        email: claims.email.clone(),
        role: claims.role,
        purpose,
        iat: now.timestamp(),
        exp: exp.timestamp(),
        iss: issuer.to_string(),
        jti: Uuid::new_v4().to_string(),
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(key.secret.as_bytes()),
    )
    .map_err(|e| JwtError::EncodingError(e.to_string()))?;

    Ok((token, exp.timestamp()))
}

/// Validate `token` for `purpose` under `secret`.
///
/// Every failure (signature, issuer, expiry, purpose, malformed input)
/// collapses to [`JwtError::InvalidToken`].
pub fn verify_token(
    token: &str,
    purpose: TokenPurpose,
    secret: &str,
    issuer: &str,
) -> Result<Claims, JwtError> {
    let mut validation = Validation::default();
    validation.set_issuer(&[issuer]);
    validation.leeway = 0;

    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map_err(|e| {
        tracing::debug!(%purpose, "Token rejected: {}", e);
        JwtError::InvalidToken
    })?;

    if data.claims.purpose != purpose {
        tracing::debug!(
            expected = %purpose,
            actual = %data.claims.purpose,
            "Token rejected: purpose mismatch"
        );
        return Err(JwtError::InvalidToken);
    }

    Ok(data.claims)
}

/// JWT service for token operations
#[derive(Debug, Clone)]
pub struct JwtService {
    config: JwtConfig,
}

impl JwtService {
    pub fn new(config: JwtConfig) -> Self {
        Self { config }
    }

    pub fn from_env() -> Result<Self, JwtError> {
        Ok(Self::new(JwtConfig::from_env()?))
    }

    pub fn config(&self) -> &JwtConfig {
        &self.config
    }

    /// Issue a token for `purpose`, returning it with its expiration
    pub fn issue(&self, claims: &ClaimSet, purpose: TokenPurpose) -> Result<(String, i64), JwtError> {
        create_token(
            claims,
            purpose,
            self.config.key(purpose),
            &self.config.issuer,
        )
    }

    pub fn verify(&self, token: &str, purpose: TokenPurpose) -> Result<Claims, JwtError> {
        verify_token(
            token,
            purpose,
            &self.config.key(purpose).secret,
            &self.config.issuer,
        )
    }

    /// Issue an access + refresh pair
    pub fn issue_session(&self, claims: &ClaimSet) -> Result<TokenPair, JwtError> {
        let (access_token, access_expires_at) = self.issue(claims, TokenPurpose::Access)?;
        let (refresh_token, refresh_expires_at) = self.issue(claims, TokenPurpose::Refresh)?;

        Ok(TokenPair {
            access_token,
            refresh_token,
            access_expires_at,
            refresh_expires_at,
            token_type: "Bearer".to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn create_test_service() -> JwtService {
        JwtService::new(JwtConfig::new("test_secret_key_for_testing_only_32bytes!"))
    }

    fn claim_set() -> ClaimSet {
        ClaimSet {
            id: Uuid::new_v4(),
            email: "buyer@example.com".to_string(),
            role: Role::User,
        }
    }

    fn full_env() -> HashMap<&'static str, &'static str> {
        HashMap::from([
            ("JWT_ACCESS_SECRET", "access-secret"),
            ("JWT_REFRESH_SECRET", "refresh-secret"),
            ("PASSWORD_RESET_SECRET", "reset-secret"),
            ("EMAIL_CONFIRMATION_SECRET", "confirm-secret"),
        ])
    }

    // ========================================================================
    // JwtConfig Tests
    // ========================================================================

    #[test]
    fn test_jwt_config_new_derives_distinct_secrets() {
        let config = JwtConfig::new("base");

        let secrets = [
            &config.access.secret,
            &config.refresh.secret,
            &config.password_reset.secret,
            &config.email_confirmation.secret,
        ];
        for (i, a) in secrets.iter().enumerate() {
            for b in secrets.iter().skip(i + 1) {
                assert_ne!(a, b);
            }
        }
        assert_eq!(config.access.ttl, Duration::minutes(15));
        assert_eq!(config.refresh.ttl, Duration::days(7));
        assert_eq!(config.issuer, DEFAULT_ISSUER);
    }

    #[test]
    fn test_jwt_config_builder() {
        let config = JwtConfig::new("secret")
            .ttl(TokenPurpose::Access, Duration::minutes(30))
            .secret(TokenPurpose::Refresh, "other")
            .issuer("shop");

        assert_eq!(config.access.ttl, Duration::minutes(30));
        assert_eq!(config.refresh.secret, "other");
        assert_eq!(config.issuer, "shop");
    }

    #[test]
    fn test_jwt_config_from_lookup() {
        let mut env = full_env();
        env.insert("JWT_ACCESS_EXPIRES_IN", "1h");
        env.insert("JWT_ISSUER", "shop");

        let config = JwtConfig::from_lookup(|k| env.get(k).map(|v| v.to_string())).unwrap();

        assert_eq!(config.access.secret, "access-secret");
        assert_eq!(config.access.ttl, Duration::hours(1));
        assert_eq!(config.refresh.ttl, Duration::days(7));
        assert_eq!(config.email_confirmation.secret, "confirm-secret");
        assert_eq!(config.issuer, "shop");
    }

    #[test]
    fn test_jwt_config_from_lookup_missing_secret() {
        let mut env = full_env();
        env.remove("PASSWORD_RESET_SECRET");

        let result = JwtConfig::from_lookup(|k| env.get(k).map(|v| v.to_string()));
        assert!(matches!(
            result,
            Err(JwtError::MissingSecret("PASSWORD_RESET_SECRET"))
        ));
    }

    #[test]
    fn test_jwt_config_from_lookup_bad_duration() {
        let mut env = full_env();
        env.insert("JWT_REFRESH_EXPIRES_IN", "soon");

        let result = JwtConfig::from_lookup(|k| env.get(k).map(|v| v.to_string()));
        assert!(matches!(
            result,
            Err(JwtError::InvalidDuration("JWT_REFRESH_EXPIRES_IN"))
        ));
    }

    #[test]
    fn test_token_key_debug_redacts_secret() {
        let key = TokenKey::new("super-secret", Duration::minutes(1));
        let debug = format!("{:?}", key);
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("redacted"));
    }

    // ========================================================================
    // Token Purpose Tests
    // ========================================================================

    #[test]
    fn test_token_purpose_display_and_serde() {
        assert_eq!(TokenPurpose::PasswordReset.to_string(), "password_reset");
        assert_eq!(
            serde_json::to_string(&TokenPurpose::EmailConfirmation).unwrap(),
            r#""email_confirmation""#
        );
        let access: TokenPurpose = serde_json::from_str(r#""access""#).unwrap();
        assert_eq!(access, TokenPurpose::Access);
    }

    // ========================================================================
    // Issue / Verify Tests
    // ========================================================================

    #[test]
    fn test_issue_and_verify_round_trip_claims() {
        let service = create_test_service();
        let claims = claim_set();

        let (token, exp) = service.issue(&claims, TokenPurpose::Access).unwrap();
        assert!(exp > Utc::now().timestamp());

        let decoded = service.verify(&token, TokenPurpose::Access).unwrap();
        assert_eq!(decoded.identity_id().unwrap(), claims.id);
        assert_eq!(decoded.email, claims.email);
        assert_eq!(decoded.role, Role::User);
        assert_eq!(decoded.purpose, TokenPurpose::Access);
        assert_eq!(decoded.iss, DEFAULT_ISSUER);
    }

    #[test]
    fn test_token_fails_under_other_purpose() {
        let service = create_test_service();
        let (token, _) = service.issue(&claim_set(), TokenPurpose::Refresh).unwrap();

        for purpose in [
            TokenPurpose::Access,
            TokenPurpose::PasswordReset,
            TokenPurpose::EmailConfirmation,
        ] {
            assert!(matches!(
                service.verify(&token, purpose),
                Err(JwtError::InvalidToken)
            ));
        }
        assert!(service.verify(&token, TokenPurpose::Refresh).is_ok());
    }

    #[test]
    fn test_token_fails_under_other_secret() {
        let key = TokenKey::new("secret-a", Duration::minutes(5));
        let (token, _) = create_token(&claim_set(), TokenPurpose::Access, &key, "shop").unwrap();

        let result = verify_token(&token, TokenPurpose::Access, "secret-b", "shop");
        assert!(matches!(result, Err(JwtError::InvalidToken)));
        assert!(verify_token(&token, TokenPurpose::Access, "secret-a", "shop").is_ok());
    }

    #[test]
    fn test_same_purpose_secret_mismatch_even_with_matching_claim() {
        // purpose claim matches but secret differs
        let key = TokenKey::new("reset-a", Duration::minutes(5));
        let (token, _) =
            create_token(&claim_set(), TokenPurpose::PasswordReset, &key, "shop").unwrap();

        let result = verify_token(&token, TokenPurpose::PasswordReset, "reset-b", "shop");
        assert!(matches!(result, Err(JwtError::InvalidToken)));
    }

    #[test]
    fn test_expired_token_rejected() {
        let key = TokenKey::new("secret", Duration::seconds(-60));
        let (token, exp) = create_token(&claim_set(), TokenPurpose::Access, &key, "shop").unwrap();
        assert!(exp < Utc::now().timestamp());

        let result = verify_token(&token, TokenPurpose::Access, "secret", "shop");
        assert!(matches!(result, Err(JwtError::InvalidToken)));
    }

    #[test]
    fn test_wrong_issuer_rejected() {
        let key = TokenKey::new("secret", Duration::minutes(5));
        let (token, _) = create_token(&claim_set(), TokenPurpose::Access, &key, "shop").unwrap();

        let result = verify_token(&token, TokenPurpose::Access, "secret", "other-shop");
        assert!(matches!(result, Err(JwtError::InvalidToken)));
    }

    #[test]
    fn test_malformed_tokens_rejected() {
        let service = create_test_service();
        for token in ["", "not.a.jwt", "abc", "a.b"] {
            assert!(matches!(
                service.verify(token, TokenPurpose::Access),
                Err(JwtError::InvalidToken)
            ));
        }
    }

    #[test]
    fn test_each_token_has_unique_jti() {
        let service = create_test_service();
        let claims = claim_set();

        let (a, _) = service.issue(&claims, TokenPurpose::Access).unwrap();
        let (b, _) = service.issue(&claims, TokenPurpose::Access).unwrap();
        assert_ne!(a, b);

        let a = service.verify(&a, TokenPurpose::Access).unwrap();
        let b = service.verify(&b, TokenPurpose::Access).unwrap();
        assert_ne!(a.jti, b.jti);
    }

    #[test]
    fn test_issue_session() {
        let service = create_test_service();
        let pair = service.issue_session(&claim_set()).unwrap();

        assert_eq!(pair.token_type, "Bearer");
        assert!(pair.refresh_expires_at > pair.access_expires_at);
        assert!(service.verify(&pair.access_token, TokenPurpose::Access).is_ok());
        assert!(service.verify(&pair.refresh_token, TokenPurpose::Refresh).is_ok());

        let json = serde_json::to_value(&pair).unwrap();
        assert!(json.get("accessToken").is_some());
        assert!(json.get("refreshToken").is_some());
    }

    #[test]
    fn test_claims_invalid_subject() {
        let claims = Claims {
            sub: "not-a-uuid".to_string(),
            email: "a@b.co".to_string(),
            role: Role::Admin,
            purpose: TokenPurpose::Access,
            iat: 0,
            exp: 0,
            iss: DEFAULT_ISSUER.to_string(),
            jti: Uuid::new_v4().to_string(),
        };
        assert!(matches!(claims.identity_id(), Err(JwtError::InvalidToken)));
    }
}
