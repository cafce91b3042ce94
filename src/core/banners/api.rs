//! Banner API endpoints
//!
//! - POST /api/banners/create - Create a banner (admin)
//! - GET /api/banners - List banners
//! - PUT /api/banners/{id} - Update url or paused flag (admin)
//! - PATCH /api/banners/{id} - Toggle the paused flag (admin)
//! - DELETE /api/banners/{id} - Delete a banner and its image (admin)

use axum::{
    Router,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post, put},
};
use std::sync::Arc;

use crate::core::auth::api::authorize_request;
use crate::core::auth::service::AuthService;
use crate::core::banners::service::{
    BannerError, BannerService, CreateBannerRequest, UpdateBannerRequest,
};
use crate::core::db::models::{Banner, Role};
use crate::core::response::{ApiError, ApiResponse, Payload, RecordId};

#[derive(Clone)]
pub struct BannerApiState {
    pub auth_service: AuthService,
    pub banner_service: BannerService,
}

impl IntoResponse for BannerError {
    fn into_response(self) -> Response {
        let message = self.to_string();

        let (status, code) = match self {
            BannerError::NotFound => (StatusCode::NOT_FOUND, "BANNER_NOT_FOUND"),
            BannerError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            BannerError::Auth(err) => return err.into_response(),
            BannerError::Internal(detail) => {
                tracing::error!("Banner operation failed: {}", detail);
                return ApiError::internal().into_response();
            }
        };

        ApiError::new(status, code, message).into_response()
    }
}

/// Create the banner API router
pub fn banner_api_router(state: BannerApiState) -> Router {
    let state = Arc::new(state);

    Router::new()
        .route("/api/banners/create", post(create_banner_handler))
        .route("/api/banners", get(list_banners_handler))
        .route(
            "/api/banners/{id}",
            put(update_banner_handler)
                .patch(toggle_banner_handler)
                .delete(delete_banner_handler),
        )
        .with_state(state)
}

async fn require_admin(state: &BannerApiState, headers: &HeaderMap) -> Result<(), BannerError> {
    authorize_request(&state.auth_service, headers, &Role::ADMINS).await?;
    Ok(())
}

/// POST /api/banners/create
async fn create_banner_handler(
    State(state): State<Arc<BannerApiState>>,
    headers: HeaderMap,
    Payload(request): Payload<CreateBannerRequest>,
) -> Result<ApiResponse<Banner>, BannerError> {
    require_admin(&state, &headers).await?;

    let banner = state.banner_service.create(request).await?;

    Ok(ApiResponse::created("Banner created successfully!", banner))
}

/// GET /api/banners
async fn list_banners_handler(
    State(state): State<Arc<BannerApiState>>,
) -> Result<ApiResponse<Vec<Banner>>, BannerError> {
    let banners = state.banner_service.list().await?;

    Ok(ApiResponse::ok("Banners retrieved successfully", banners))
}

/// PUT /api/banners/{id}
async fn update_banner_handler(
    State(state): State<Arc<BannerApiState>>,
    headers: HeaderMap,
    RecordId(id): RecordId,
    Payload(request): Payload<UpdateBannerRequest>,
) -> Result<ApiResponse<Banner>, BannerError> {
    require_admin(&state, &headers).await?;

    let banner = state.banner_service.update(id, request).await?;

    Ok(ApiResponse::ok("Banner updated successfully!", banner))
}

/// PATCH /api/banners/{id}
async fn toggle_banner_handler(
    State(state): State<Arc<BannerApiState>>,
    headers: HeaderMap,
    RecordId(id): RecordId,
) -> Result<ApiResponse<Banner>, BannerError> {
    require_admin(&state, &headers).await?;

    let banner = state.banner_service.toggle_paused(id).await?;
    let message = if banner.is_paused {
        "Banner paused successfully!"
    } else {
        "Banner unpaused successfully!"
    };

    Ok(ApiResponse::ok(message, banner))
}

/// DELETE /api/banners/{id}
async fn delete_banner_handler(
    State(state): State<Arc<BannerApiState>>,
    headers: HeaderMap,
    RecordId(id): RecordId,
) -> Result<ApiResponse<Banner>, BannerError> {
    require_admin(&state, &headers).await?;

    let banner = state.banner_service.delete(id).await?;

    Ok(ApiResponse::ok("Banner deleted successfully!", banner))
}
