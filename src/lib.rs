//! Storefront - E-commerce backend
//!
//! JSON API for a small shop: customer and admin authentication, banner
//! media management and order records, built with axum and PostgreSQL.

pub mod app;
pub mod core;
