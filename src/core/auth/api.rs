//! Auth API endpoints
//!
//! - POST /api/auth/login - Login a user and get tokens
//! - POST /api/auth/admin/login - Login an admin and get tokens
//! - PATCH /api/auth/change-password - Change password (requires access token)
//! - POST /api/auth/forgot-password - Email a reset link
//! - POST /api/auth/reset-password - Set a new password with a reset token
//! - GET /api/auth/confirm-email?token= - Confirm an email address
//! - POST /api/auth/resend-confirmation - Email a new confirmation link
//! - POST /api/auth/refresh-token - Exchange a refresh token for an access token

use axum::{
    Router,
    body::Bytes,
    extract::{Query, State},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, patch, post},
};
use serde::Deserialize;
use std::sync::Arc;

use crate::core::auth::service::{
    AuthError, AuthService, AuthSession, ChangePasswordRequest, EmailRequest, ErrorKind,
    LoginRequest, LoginResponse, RefreshRequest, RefreshResponse, ResetPasswordRequest,
};
use crate::core::db::models::{IdentityResponse, Role};
use crate::core::response::{ApiError, ApiResponse, Payload};

/// Auth API state containing the auth service
#[derive(Clone)]
pub struct AuthApiState {
    pub auth_service: AuthService,
}

impl ErrorKind {
    pub fn status(self) -> StatusCode {
        match self {
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Forbidden => StatusCode::FORBIDDEN,
            ErrorKind::BadRequest => StatusCode::BAD_REQUEST,
            ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl AuthError {
    pub fn code(&self) -> &'static str {
        match self {
            AuthError::IdentityNotFound => "USER_NOT_FOUND",
            AuthError::Deleted => "USER_DELETED",
            AuthError::Blocked => "USER_BLOCKED",
            AuthError::EmailNotConfirmed => "EMAIL_NOT_CONFIRMED",
            AuthError::InvalidCredentials => "INVALID_CREDENTIALS",
            AuthError::PasswordMismatch => "PASSWORD_MISMATCH",
            AuthError::Unauthorized => "UNAUTHORIZED",
            AuthError::InvalidToken => "INVALID_TOKEN",
            AuthError::MissingToken => "MISSING_TOKEN",
            AuthError::EmailAlreadyConfirmed => "EMAIL_ALREADY_CONFIRMED",
            AuthError::Validation(_) => "VALIDATION_ERROR",
            AuthError::Mail(_) => "MAIL_ERROR",
            AuthError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

/// Convert AuthError to API response
impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.kind().status();

        let message = match &self {
            AuthError::Mail(detail) => {
                tracing::error!("Email delivery failed: {}", detail);
                "Failed to send email, please try again later".to_string()
            }
            AuthError::Internal(detail) => {
                tracing::error!("Auth flow failed: {}", detail);
                return ApiError::internal().into_response();
            }
            other => other.to_string(),
        };

        ApiError::new(status, self.code(), message).into_response()
    }
}

#[derive(Debug, Deserialize)]
struct TokenQuery {
    token: Option<String>,
}

/// Create the auth API router
pub fn auth_api_router(state: AuthApiState) -> Router {
    let state = Arc::new(state);

    Router::new()
        .route("/api/auth/login", post(login_handler))
        .route("/api/auth/admin/login", post(admin_login_handler))
        .route("/api/auth/change-password", patch(change_password_handler))
        .route("/api/auth/forgot-password", post(forgot_password_handler))
        .route("/api/auth/reset-password", post(reset_password_handler))
        .route("/api/auth/confirm-email", get(confirm_email_handler))
        .route(
            "/api/auth/resend-confirmation",
            post(resend_confirmation_handler),
        )
        .route("/api/auth/refresh-token", post(refresh_token_handler))
        .with_state(state)
}

/// POST /api/auth/login
async fn login_handler(
    State(state): State<Arc<AuthApiState>>,
    Payload(request): Payload<LoginRequest>,
) -> Result<ApiResponse<LoginResponse>, AuthError> {
    let response = state.auth_service.login_user(request).await?;

    Ok(ApiResponse::ok("User logged in successfully", response))
}

/// POST /api/auth/admin/login
async fn admin_login_handler(
    State(state): State<Arc<AuthApiState>>,
    Payload(request): Payload<LoginRequest>,
) -> Result<ApiResponse<LoginResponse>, AuthError> {
    let response = state.auth_service.login_admin(request).await?;

    Ok(ApiResponse::ok("Admin logged in successfully", response))
}

/// PATCH /api/auth/change-password
async fn change_password_handler(
    State(state): State<Arc<AuthApiState>>,
    headers: HeaderMap,
    Payload(request): Payload<ChangePasswordRequest>,
) -> Result<ApiResponse<IdentityResponse>, AuthError> {
    let session = authorize_request(&state.auth_service, &headers, &Role::ALL).await?;

    let identity = state
        .auth_service
        .change_password(&session.claims, request)
        .await?;

    Ok(ApiResponse::ok("Password changed successfully", identity))
}

/// POST /api/auth/forgot-password
async fn forgot_password_handler(
    State(state): State<Arc<AuthApiState>>,
    Payload(request): Payload<EmailRequest>,
) -> Result<ApiResponse<()>, AuthError> {
    state.auth_service.forgot_password(request).await?;

    Ok(ApiResponse::message("Password reset link sent successfully"))
}

/// POST /api/auth/reset-password
/// The token comes from the body, or the Authorization header when absent
async fn reset_password_handler(
    State(state): State<Arc<AuthApiState>>,
    headers: HeaderMap,
    Payload(request): Payload<ResetPasswordRequest>,
) -> Result<ApiResponse<IdentityResponse>, AuthError> {
    let token = request.token.or_else(|| extract_bearer_token(&headers));

    let identity = state
        .auth_service
        .reset_password(token.as_deref(), &request.new_password)
        .await?;

    Ok(ApiResponse::ok("Password reset successfully", identity))
}

/// GET /api/auth/confirm-email?token=
async fn confirm_email_handler(
    State(state): State<Arc<AuthApiState>>,
    Query(query): Query<TokenQuery>,
) -> Result<ApiResponse<IdentityResponse>, AuthError> {
    let identity = state
        .auth_service
        .confirm_email(query.token.as_deref())
        .await?;

    Ok(ApiResponse::ok("Email confirmed successfully", identity))
}

/// POST /api/auth/resend-confirmation
async fn resend_confirmation_handler(
    State(state): State<Arc<AuthApiState>>,
    Payload(request): Payload<EmailRequest>,
) -> Result<ApiResponse<()>, AuthError> {
    state.auth_service.resend_confirmation(request).await?;

    Ok(ApiResponse::message("Confirmation email sent successfully"))
}

/// POST /api/auth/refresh-token
/// The body is optional; the Authorization header is used when it has no token
async fn refresh_token_handler(
    State(state): State<Arc<AuthApiState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<ApiResponse<RefreshResponse>, AuthError> {
    let request: RefreshRequest = if body.iter().all(u8::is_ascii_whitespace) {
        RefreshRequest::default()
    } else {
        serde_json::from_slice(&body).map_err(|e| AuthError::Validation(e.to_string()))?
    };
    let token = request
        .refresh_token
        .or_else(|| extract_bearer_token(&headers));

    let response = state.auth_service.refresh_token(token.as_deref()).await?;

    Ok(ApiResponse::ok("Access token retrieved successfully", response))
}

/// Extract the token from the Authorization header.
///
/// Accepts `Bearer <token>` as well as a bare token.
pub fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())?
        .trim();

    let token = value.strip_prefix("Bearer ").unwrap_or(value).trim();

    if token.is_empty() || token == "Bearer" {
        return None;
    }

    Some(token.to_string())
}

/// Authorize a request from its headers against the allowed roles
pub async fn authorize_request(
    auth: &AuthService,
    headers: &HeaderMap,
    roles: &[Role],
) -> Result<AuthSession, AuthError> {
    let token = extract_bearer_token(headers);
    auth.authorize(token.as_deref(), roles).await
}
