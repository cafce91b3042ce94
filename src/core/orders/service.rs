//! Order management service

use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::core::auth::service::AuthError;
use crate::core::db::models::{NewOrder, Order, OrderItem, OrderPatch};
use crate::core::db::store::{OrderStore, StoreError};

/// Order service error types
#[derive(Debug, thiserror::Error)]
pub enum OrderError {
    #[error("Order not found!")]
    NotFound,

    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<StoreError> for OrderError {
    fn from(err: StoreError) -> Self {
        OrderError::Internal(err.to_string())
    }
}

/// Checkout payload
#[derive(Debug, Clone, Deserialize)]
pub struct CreateOrderRequest {
    pub phone: String,
    pub products: Vec<OrderItem>,
    #[serde(default)]
    pub address: Option<String>,
    pub district: String,
    pub city: String,
    #[serde(default)]
    pub order_note: Option<String>,
    #[serde(default)]
    pub payment_method: Option<String>,
    #[serde(default)]
    pub shipping_method: Option<String>,
    #[serde(default)]
    pub courier_address: Option<String>,
}

impl From<CreateOrderRequest> for NewOrder {
    fn from(request: CreateOrderRequest) -> Self {
        Self {
            phone: request.phone,
            products: request.products,
            address: request.address,
            district: request.district,
            city: request.city,
            order_note: request.order_note,
            payment_method: request.payment_method,
            shipping_method: request.shipping_method,
            courier_address: request.courier_address,
        }
    }
}

fn require(field: &str, value: &str) -> Result<(), OrderError> {
    if value.trim().is_empty() {
        return Err(OrderError::Validation(format!("{field} is required")));
    }
    Ok(())
}

fn validate_item(index: usize, item: &OrderItem) -> Result<(), OrderError> {
    if item.product.trim().is_empty() {
        return Err(OrderError::Validation(format!(
            "Product id is required (item {index})"
        )));
    }
    if item.quantity == 0 {
        return Err(OrderError::Validation(format!(
            "Product quantity must be at least 1 (item {index})"
        )));
    }
    if !item.total_price.is_finite() || item.total_price < 0.0 {
        return Err(OrderError::Validation(format!(
            "Product total price must be a non-negative number (item {index})"
        )));
    }
    Ok(())
}

/// Order service
#[derive(Clone)]
pub struct OrderService {
    store: Arc<dyn OrderStore>,
}

impl OrderService {
    pub fn new(store: Arc<dyn OrderStore>) -> Self {
        Self { store }
    }

    pub async fn create(&self, request: CreateOrderRequest) -> Result<Order, OrderError> {
        require("Phone number", &request.phone)?;
        require("District", &request.district)?;
        require("City", &request.city)?;

        if request.products.is_empty() {
            return Err(OrderError::Validation(
                "An order needs at least one product".to_string(),
            ));
        }
        for (index, item) in request.products.iter().enumerate() {
            validate_item(index, item)?;
        }

        let order = self.store.create(&request.into()).await?;

        tracing::info!(order_id = %order.id, items = order.products.len(), "Order placed");

        Ok(order)
    }

    /// All orders, newest first
    pub async fn list(&self) -> Result<Vec<Order>, OrderError> {
        Ok(self.store.list().await?)
    }

    pub async fn get(&self, id: Uuid) -> Result<Order, OrderError> {
        self.store
            .find_by_id(id)
            .await?
            .ok_or(OrderError::NotFound)
    }

    pub async fn update(&self, id: Uuid, patch: OrderPatch) -> Result<Order, OrderError> {
        for (field, value) in [
            ("Phone number", &patch.phone),
            ("District", &patch.district),
            ("City", &patch.city),
        ] {
            if let Some(value) = value {
                require(field, value)?;
            }
        }

        let order = self
            .store
            .update(id, &patch)
            .await?
            .ok_or(OrderError::NotFound)?;

        tracing::info!(order_id = %order.id, status = %order.status, "Order updated");

        Ok(order)
    }

    pub async fn delete(&self, id: Uuid) -> Result<Order, OrderError> {
        let order = self.store.delete(id).await?.ok_or(OrderError::NotFound)?;

        tracing::info!(order_id = %order.id, "Order deleted");

        Ok(order)
    }
}
