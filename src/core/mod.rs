//! Core domain modules and shared infrastructure

pub mod auth;
pub mod banners;
pub mod config;
pub mod db;
pub mod mail;
pub mod media;
pub mod orders;
pub mod response;
pub mod users;

#[cfg(test)]
pub(crate) mod test_support;
