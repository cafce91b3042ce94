//! Application assembly
//!
//! Builds every service from its collaborators and merges the per-module
//! routers into one axum application.

use axum::{Router, routing::get};
use std::sync::Arc;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::core::auth::{
    AuthApiState, AuthLinks, AuthService, JwtService, PasswordHasher, auth_api_router,
};
use crate::core::banners::{BannerApiState, BannerService, banner_api_router};
use crate::core::config::Config;
use crate::core::db::store::{BannerStore, IdentityStore, OrderStore};
use crate::core::mail::Mailer;
use crate::core::media::ImageHost;
use crate::core::orders::{OrderApiState, OrderService, order_api_router};
use crate::core::response::health_handler;
use crate::core::users::{UserApiState, UserService, user_api_router};

/// Storage backends for every record kind
#[derive(Clone)]
pub struct Stores {
    pub users: Arc<dyn IdentityStore>,
    pub admins: Arc<dyn IdentityStore>,
    pub banners: Arc<dyn BannerStore>,
    pub orders: Arc<dyn OrderStore>,
}

/// Fully wired services, one per module
#[derive(Clone)]
pub struct Services {
    pub auth: AuthService,
    pub users: UserService,
    pub banners: BannerService,
    pub orders: OrderService,
}

impl Services {
    pub fn new(
        config: &Config,
        stores: Stores,
        hasher: PasswordHasher,
        mailer: Arc<dyn Mailer>,
        images: Arc<dyn ImageHost>,
    ) -> Self {
        let links = AuthLinks {
            client_url: config.client_url.clone(),
            app_url: config.app_url.clone(),
            support_email: config.support_email.clone(),
        };

        let auth = AuthService::new(
            stores.users.clone(),
            stores.admins,
            JwtService::new(config.jwt.clone()),
            hasher,
            mailer,
            links,
        );

        Self {
            auth,
            users: UserService::new(stores.users),
            banners: BannerService::new(stores.banners, images),
            orders: OrderService::new(stores.orders),
        }
    }
}

/// Merge every module router and apply the shared layers
pub fn build_router(services: Services) -> Router {
    Router::new()
        .route("/api/health", get(health_handler))
        .merge(auth_api_router(AuthApiState {
            auth_service: services.auth.clone(),
        }))
        .merge(user_api_router(UserApiState {
            auth_service: services.auth.clone(),
            user_service: services.users,
        }))
        .merge(banner_api_router(BannerApiState {
            auth_service: services.auth.clone(),
            banner_service: services.banners,
        }))
        .merge(order_api_router(OrderApiState {
            auth_service: services.auth,
            order_service: services.orders,
        }))
        .layer(CorsLayer::permissive())
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
}
