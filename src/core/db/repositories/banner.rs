//! Banner repository for PostgreSQL

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::core::db::models::{Banner, BannerPatch, NewBanner};
use crate::core::db::store::{BannerStore, StoreError};

/// PostgreSQL banner store
#[derive(Clone)]
pub struct PgBannerStore {
    pool: PgPool,
}

impl PgBannerStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BannerStore for PgBannerStore {
    async fn create(&self, banner: &NewBanner) -> Result<Banner, StoreError> {
        let banner = sqlx::query_as::<_, Banner>(
            r#"
            INSERT INTO banners (url, public_id, is_paused)
            VALUES ($1, $2, $3)
            RETURNING id, url, public_id, is_paused, created_at, updated_at
            "#,
        )
        .bind(&banner.url)
        .bind(&banner.public_id)
        .bind(banner.is_paused)
        .fetch_one(&self.pool)
        .await?;

        Ok(banner)
    }

    async fn list(&self) -> Result<Vec<Banner>, StoreError> {
        let banners = sqlx::query_as::<_, Banner>(
            r#"
            SELECT id, url, public_id, is_paused, created_at, updated_at
            FROM banners
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(banners)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Banner>, StoreError> {
        let banner = sqlx::query_as::<_, Banner>(
            r#"
            SELECT id, url, public_id, is_paused, created_at, updated_at
            FROM banners
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(banner)
    }

    async fn update(&self, id: Uuid, patch: &BannerPatch) -> Result<Option<Banner>, StoreError> {
        let banner = sqlx::query_as::<_, Banner>(
            r#"
            UPDATE banners
            SET
                url = COALESCE($2, url),
                is_paused = COALESCE($3, is_paused),
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, url, public_id, is_paused, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(&patch.url)
        .bind(patch.is_paused)
        .fetch_optional(&self.pool)
        .await?;

        Ok(banner)
    }

    async fn delete(&self, id: Uuid) -> Result<Option<Banner>, StoreError> {
        let banner = sqlx::query_as::<_, Banner>(
            r#"
            DELETE FROM banners
            WHERE id = $1
            RETURNING id, url, public_id, is_paused, created_at, updated_at
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(banner)
    }
}
