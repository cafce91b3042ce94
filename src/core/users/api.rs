//! User API endpoints
//!
//! - GET /api/users/me - Current identity (any role)
//! - PATCH /api/users/change-status/{id} - Block or unblock a user (admin)

use axum::{
    Router,
    extract::State,
    http::HeaderMap,
    routing::{get, patch},
};
use std::sync::Arc;

use crate::core::auth::api::authorize_request;
use crate::core::auth::service::{AuthError, AuthService};
use crate::core::db::models::{IdentityResponse, Role};
use crate::core::response::{ApiResponse, Payload, RecordId};
use crate::core::users::service::{ChangeStatusRequest, UserService};

#[derive(Clone)]
pub struct UserApiState {
    pub auth_service: AuthService,
    pub user_service: UserService,
}

/// Create the user API router
pub fn user_api_router(state: UserApiState) -> Router {
    let state = Arc::new(state);

    Router::new()
        .route("/api/users/me", get(me_handler))
        .route("/api/users/change-status/{id}", patch(change_status_handler))
        .with_state(state)
}

/// GET /api/users/me
async fn me_handler(
    State(state): State<Arc<UserApiState>>,
    headers: HeaderMap,
) -> Result<ApiResponse<IdentityResponse>, AuthError> {
    let session = authorize_request(&state.auth_service, &headers, &Role::ALL).await?;
    let identity = state.auth_service.get_me(&session.claims).await?;

    Ok(ApiResponse::ok("User retrieved successfully", identity))
}

/// PATCH /api/users/change-status/{id}
async fn change_status_handler(
    State(state): State<Arc<UserApiState>>,
    headers: HeaderMap,
    RecordId(id): RecordId,
    Payload(request): Payload<ChangeStatusRequest>,
) -> Result<ApiResponse<IdentityResponse>, AuthError> {
    authorize_request(&state.auth_service, &headers, &Role::ADMINS).await?;

    let identity = state.user_service.change_status(id, request.status).await?;

    Ok(ApiResponse::ok("Status changed successfully", identity))
}
