//! Authentication module for the storefront
//!
//! This module provides authentication functionality including:
//! - JWT issuance and verification, one secret and TTL per token purpose
//! - Login, password change, password reset and email confirmation flows
//! - Account state checks shared by every flow
//! - REST API endpoints for auth operations

pub mod api;
pub mod guard;
pub mod jwt;
pub mod password;
pub mod service;
pub mod templates;

pub use api::{AuthApiState, auth_api_router, authorize_request, extract_bearer_token};
pub use guard::{AccountCheck, AccountGuard, GuardError};
pub use jwt::{ClaimSet, Claims, JwtConfig, JwtError, JwtService, TokenPair, TokenPurpose};
pub use password::{PasswordError, PasswordHasher};
pub use service::{
    AuthError, AuthLinks, AuthService, AuthSession, ErrorKind, LoginRequest, LoginResponse,
    RefreshRequest, RefreshResponse,
};
