//! Banners module
//!
//! Storefront banners whose images live on the external image host.

pub mod api;
pub mod service;

pub use api::{BannerApiState, banner_api_router};
pub use service::{BannerError, BannerService, CreateBannerRequest, UpdateBannerRequest};
