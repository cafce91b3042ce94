//! Order repository for PostgreSQL
//!
//! Product lines are stored as a JSONB array on the order row.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::core::db::models::{NewOrder, Order, OrderPatch};
use crate::core::db::store::{OrderStore, StoreError};

const ORDER_COLUMNS: &str = "id, phone, products, address, district, city, order_note, \
     payment_method, shipping_method, courier_address, status, created_at, updated_at";

/// PostgreSQL order store
#[derive(Clone)]
pub struct PgOrderStore {
    pool: PgPool,
}

impl PgOrderStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OrderStore for PgOrderStore {
    async fn create(&self, order: &NewOrder) -> Result<Order, StoreError> {
        let sql = format!(
            r#"
            INSERT INTO orders (phone, products, address, district, city, order_note,
                                payment_method, shipping_method, courier_address)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {ORDER_COLUMNS}
            "#
        );

        let created = sqlx::query_as::<_, Order>(&sql)
            .bind(&order.phone)
            .bind(sqlx::types::Json(&order.products))
            .bind(&order.address)
            .bind(&order.district)
            .bind(&order.city)
            .bind(&order.order_note)
            .bind(&order.payment_method)
            .bind(&order.shipping_method)
            .bind(&order.courier_address)
            .fetch_one(&self.pool)
            .await?;

        Ok(created)
    }

    async fn list(&self) -> Result<Vec<Order>, StoreError> {
        let sql = format!("SELECT {ORDER_COLUMNS} FROM orders ORDER BY created_at DESC");

        let orders = sqlx::query_as::<_, Order>(&sql)
            .fetch_all(&self.pool)
            .await?;

        Ok(orders)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Order>, StoreError> {
        let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1");

        let order = sqlx::query_as::<_, Order>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(order)
    }

    async fn update(&self, id: Uuid, patch: &OrderPatch) -> Result<Option<Order>, StoreError> {
        let sql = format!(
            r#"
            UPDATE orders
            SET
                phone = COALESCE($2, phone),
                address = COALESCE($3, address),
                district = COALESCE($4, district),
                city = COALESCE($5, city),
                order_note = COALESCE($6, order_note),
                payment_method = COALESCE($7, payment_method),
                shipping_method = COALESCE($8, shipping_method),
                courier_address = COALESCE($9, courier_address),
                status = COALESCE($10, status),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {ORDER_COLUMNS}
            "#
        );

        let order = sqlx::query_as::<_, Order>(&sql)
            .bind(id)
            .bind(&patch.phone)
            .bind(&patch.address)
            .bind(&patch.district)
            .bind(&patch.city)
            .bind(&patch.order_note)
            .bind(&patch.payment_method)
            .bind(&patch.shipping_method)
            .bind(&patch.courier_address)
            .bind(patch.status)
            .fetch_optional(&self.pool)
            .await?;

        Ok(order)
    }

    async fn delete(&self, id: Uuid) -> Result<Option<Order>, StoreError> {
        let sql = format!("DELETE FROM orders WHERE id = $1 RETURNING {ORDER_COLUMNS}");

        let order = sqlx::query_as::<_, Order>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(order)
    }
}
