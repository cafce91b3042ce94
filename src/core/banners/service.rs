//! Banner management service
//!
//! Banner records point at images on the external image host. Deleting a
//! banner destroys the hosted image first; host failures never block the
//! record deletion.

use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::core::auth::service::AuthError;
use crate::core::db::models::{Banner, BannerPatch, NewBanner};
use crate::core::db::store::{BannerStore, StoreError};
use crate::core::media::{ImageHost, delete_image};

const MIN_URL_LENGTH: usize = 5;

/// Banner service error types
#[derive(Debug, thiserror::Error)]
pub enum BannerError {
    #[error("Banner not found!")]
    NotFound,

    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<StoreError> for BannerError {
    fn from(err: StoreError) -> Self {
        BannerError::Internal(err.to_string())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateBannerRequest {
    pub url: String,
    pub public_id: String,
    #[serde(rename = "isPaused", default)]
    pub is_paused: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateBannerRequest {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(rename = "isPaused", default)]
    pub is_paused: Option<bool>,
}

/// Banner service
#[derive(Clone)]
pub struct BannerService {
    store: Arc<dyn BannerStore>,
    images: Arc<dyn ImageHost>,
}

impl BannerService {
    pub fn new(store: Arc<dyn BannerStore>, images: Arc<dyn ImageHost>) -> Self {
        Self { store, images }
    }

    fn validate_url(url: &str) -> Result<(), BannerError> {
        if url.trim().chars().count() < MIN_URL_LENGTH {
            return Err(BannerError::Validation(format!(
                "Banner URL must be at least {MIN_URL_LENGTH} characters long!"
            )));
        }
        Ok(())
    }

    pub async fn create(&self, request: CreateBannerRequest) -> Result<Banner, BannerError> {
        Self::validate_url(&request.url)?;
        if request.public_id.trim().is_empty() {
            return Err(BannerError::Validation("Public ID is required!".to_string()));
        }

        let banner = self
            .store
            .create(&NewBanner {
                url: request.url,
                public_id: request.public_id,
                is_paused: request.is_paused,
            })
            .await?;

        tracing::info!(banner_id = %banner.id, "Banner created");

        Ok(banner)
    }

    /// All banners, newest first
    pub async fn list(&self) -> Result<Vec<Banner>, BannerError> {
        Ok(self.store.list().await?)
    }

    pub async fn update(
        &self,
        id: Uuid,
        request: UpdateBannerRequest,
    ) -> Result<Banner, BannerError> {
        if let Some(ref url) = request.url {
            Self::validate_url(url)?;
        }

        let patch = BannerPatch {
            url: request.url,
            is_paused: request.is_paused,
        };

        self.store
            .update(id, &patch)
            .await?
            .ok_or(BannerError::NotFound)
    }

    /// Flip the paused flag
    pub async fn toggle_paused(&self, id: Uuid) -> Result<Banner, BannerError> {
        let banner = self
            .store
            .find_by_id(id)
            .await?
            .ok_or(BannerError::NotFound)?;

        let patch = BannerPatch {
            is_paused: Some(!banner.is_paused),
            ..Default::default()
        };

        self.store
            .update(id, &patch)
            .await?
            .ok_or(BannerError::NotFound)
    }

    /// Delete a banner and its hosted image
    pub async fn delete(&self, id: Uuid) -> Result<Banner, BannerError> {
        let banner = self
            .store
            .find_by_id(id)
            .await?
            .ok_or(BannerError::NotFound)?;

        delete_image(self.images.as_ref(), banner.public_id.as_deref()).await;

        let deleted = self.store.delete(id).await?.ok_or(BannerError::NotFound)?;

        tracing::info!(banner_id = %deleted.id, "Banner deleted");

        Ok(deleted)
    }
}
