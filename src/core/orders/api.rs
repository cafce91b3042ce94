//! Order API endpoints
//!
//! - POST /api/orders - Place an order (public checkout)
//! - GET /api/orders - List orders (admin)
//! - GET /api/orders/{id} - Get an order (admin)
//! - PATCH /api/orders/{id} - Update an order (admin)
//! - DELETE /api/orders/{id} - Delete an order (admin)

use axum::{
    Router,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
};
use std::sync::Arc;

use crate::core::auth::api::authorize_request;
use crate::core::auth::service::AuthService;
use crate::core::db::models::{Order, OrderPatch, Role};
use crate::core::orders::service::{CreateOrderRequest, OrderError, OrderService};
use crate::core::response::{ApiError, ApiResponse, Payload, RecordId};

#[derive(Clone)]
pub struct OrderApiState {
    pub auth_service: AuthService,
    pub order_service: OrderService,
}

impl IntoResponse for OrderError {
    fn into_response(self) -> Response {
        let message = self.to_string();

        let (status, code) = match self {
            OrderError::NotFound => (StatusCode::NOT_FOUND, "ORDER_NOT_FOUND"),
            OrderError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            OrderError::Auth(err) => return err.into_response(),
            OrderError::Internal(detail) => {
                tracing::error!("Order operation failed: {}", detail);
                return ApiError::internal().into_response();
            }
        };

        ApiError::new(status, code, message).into_response()
    }
}

/// Create the order API router
pub fn order_api_router(state: OrderApiState) -> Router {
    let state = Arc::new(state);

    Router::new()
        .route(
            "/api/orders",
            get(list_orders_handler).post(create_order_handler),
        )
        .route(
            "/api/orders/{id}",
            get(get_order_handler)
                .patch(update_order_handler)
                .delete(delete_order_handler),
        )
        .with_state(state)
}

async fn require_admin(state: &OrderApiState, headers: &HeaderMap) -> Result<(), OrderError> {
    authorize_request(&state.auth_service, headers, &Role::ADMINS).await?;
    Ok(())
}

/// POST /api/orders
async fn create_order_handler(
    State(state): State<Arc<OrderApiState>>,
    Payload(request): Payload<CreateOrderRequest>,
) -> Result<ApiResponse<Order>, OrderError> {
    let order = state.order_service.create(request).await?;

    Ok(ApiResponse::created("Order created successfully!", order))
}

/// GET /api/orders
async fn list_orders_handler(
    State(state): State<Arc<OrderApiState>>,
    headers: HeaderMap,
) -> Result<ApiResponse<Vec<Order>>, OrderError> {
    require_admin(&state, &headers).await?;

    let orders = state.order_service.list().await?;

    Ok(ApiResponse::ok("Orders retrieved successfully", orders))
}

/// GET /api/orders/{id}
async fn get_order_handler(
    State(state): State<Arc<OrderApiState>>,
    headers: HeaderMap,
    RecordId(id): RecordId,
) -> Result<ApiResponse<Order>, OrderError> {
    require_admin(&state, &headers).await?;

    let order = state.order_service.get(id).await?;

    Ok(ApiResponse::ok("Order retrieved successfully", order))
}

/// PATCH /api/orders/{id}
async fn update_order_handler(
    State(state): State<Arc<OrderApiState>>,
    headers: HeaderMap,
    RecordId(id): RecordId,
    Payload(patch): Payload<OrderPatch>,
) -> Result<ApiResponse<Order>, OrderError> {
    require_admin(&state, &headers).await?;

    let order = state.order_service.update(id, patch).await?;

    Ok(ApiResponse::ok("Order updated successfully!", order))
}

/// DELETE /api/orders/{id}
async fn delete_order_handler(
    State(state): State<Arc<OrderApiState>>,
    headers: HeaderMap,
    RecordId(id): RecordId,
) -> Result<ApiResponse<Order>, OrderError> {
    require_admin(&state, &headers).await?;

    let order = state.order_service.delete(id).await?;

    Ok(ApiResponse::ok("Order deleted successfully!", order))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::auth::jwt::{ClaimSet, TokenPurpose};
    use crate::core::db::memory::MemoryOrderStore;
    use crate::core::test_support::{TestAuth, test_auth};
    use axum::body::Body;
    use axum::http::{Request, header};
    use tower::ServiceExt;

    const CHECKOUT: &str = r#"{
        "phone": "+8801700000000",
        "products": [{"product": "p-1", "quantity": 1, "total_price": 10.0}],
        "district": "Dhaka",
        "city": "Mirpur"
    }"#;

    fn router(t: &TestAuth) -> Router {
        order_api_router(OrderApiState {
            auth_service: t.service.clone(),
            order_service: OrderService::new(Arc::new(MemoryOrderStore::new())),
        })
    }

    async fn admin_bearer(t: &TestAuth) -> String {
        let admin = t
            .seed_admin("admin@shop.test", "admin-password", Role::SuperAdmin)
            .await;
        let (token, _) = t
            .service
            .jwt()
            .issue(&ClaimSet::from(&admin), TokenPurpose::Access)
            .unwrap();
        format!("Bearer {token}")
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn checkout_request() -> Request<Body> {
        Request::post("/api/orders")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(CHECKOUT))
            .unwrap()
    }

    #[tokio::test]
    async fn test_checkout_is_public() {
        let t = test_auth();

        let response = router(&t).oneshot(checkout_request()).await.unwrap();

        assert_eq!(response.status(), StatusCode::CREATED);
        let json = body_json(response).await;
        assert_eq!(json["data"]["status"], "pending");
        assert_eq!(json["data"]["products"][0]["product"], "p-1");
    }

    #[tokio::test]
    async fn test_listing_requires_admin() {
        let t = test_auth();

        let response = router(&t)
            .oneshot(Request::get("/api/orders").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["code"], "MISSING_TOKEN");
    }

    #[tokio::test]
    async fn test_admin_updates_status() {
        let t = test_auth();
        let app = router(&t);
        let auth = admin_bearer(&t).await;

        let created = body_json(app.clone().oneshot(checkout_request()).await.unwrap()).await;
        let id = created["data"]["id"].as_str().unwrap().to_string();

        let response = app
            .clone()
            .oneshot(
                Request::patch(format!("/api/orders/{id}"))
                    .header(header::AUTHORIZATION, auth.as_str())
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"status":"delivered"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["data"]["status"], "delivered");

        let response = app
            .oneshot(
                Request::patch(format!("/api/orders/{id}"))
                    .header(header::AUTHORIZATION, auth.as_str())
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"status":"lost"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_unknown_order_is_not_found() {
        let t = test_auth();
        let auth = admin_bearer(&t).await;

        let response = router(&t)
            .oneshot(
                Request::get(format!("/api/orders/{}", uuid::Uuid::new_v4()))
                    .header(header::AUTHORIZATION, auth.as_str())
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(response).await["code"], "ORDER_NOT_FOUND");
    }
}
