//! Persistence traits.
//!
//! Services depend on these traits only. [`crate::memory::MemoryRepository`]
//! implements all of them in process; the `postgres` feature adds
//! `PgRepository`.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::catalog::{Category, Product};
use crate::error::RepositoryError;
use crate::order::Order;
use crate::types::{CategoryKey, Email, OrderId, OrderStatus, OrderStatusFilter, ProductKey, UserId};
use crate::user::{ProfileUpdate, User};

/// Named monotonically increasing counters.
#[async_trait]
pub trait CounterRepository: Send + Sync {
    /// One atomic read-modify-write of `sequence`: create it at 1 when
    /// absent, otherwise increment it, and return the new value.
    ///
    /// # Errors
    ///
    /// [`RepositoryError::WriteConflict`] when a concurrent writer touched
    /// the counter between the read and the write. Nothing was written and
    /// the caller may retry.
    async fn try_advance(&self, sequence: &str) -> Result<i64, RepositoryError>;

    /// Last value handed out, or `None` if the sequence was never used.
    async fn last_value(&self, sequence: &str) -> Result<Option<i64>, RepositoryError>;
}

/// Categories and products.
#[async_trait]
pub trait CatalogRepository: Send + Sync {
    async fn list_categories(&self) -> Result<Vec<Category>, RepositoryError>;
    async fn get_category(&self, key: CategoryKey) -> Result<Category, RepositoryError>;
    async fn insert_category(&self, category: &Category) -> Result<(), RepositoryError>;
    async fn update_category(&self, category: &Category) -> Result<(), RepositoryError>;
    /// Remove the row outright.
    async fn delete_category(&self, key: CategoryKey) -> Result<(), RepositoryError>;

    async fn list_products(&self) -> Result<Vec<Product>, RepositoryError>;
    async fn get_product(&self, key: ProductKey) -> Result<Product, RepositoryError>;
    async fn insert_product(&self, product: &Product) -> Result<(), RepositoryError>;
    async fn update_product(&self, product: &Product) -> Result<(), RepositoryError>;
    /// Remove the row outright.
    async fn delete_product(&self, key: ProductKey) -> Result<(), RepositoryError>;
}

/// Placed orders.
#[async_trait]
pub trait OrderRepository: Send + Sync {
    async fn insert_order(&self, order: &Order) -> Result<(), RepositoryError>;
    async fn get_order(&self, id: OrderId) -> Result<Order, RepositoryError>;

    /// Orders matching `filter`, newest first.
    async fn list_orders(&self, filter: OrderStatusFilter) -> Result<Vec<Order>, RepositoryError>;

    /// Orders placed by `user_id`, newest first.
    async fn orders_for_user(&self, user_id: UserId) -> Result<Vec<Order>, RepositoryError>;

    /// Overwrite status and `updated_at`, returning the updated order.
    async fn update_order_status(
        &self,
        id: OrderId,
        status: OrderStatus,
        at: DateTime<Utc>,
    ) -> Result<Order, RepositoryError>;

    async fn count_orders(&self, filter: OrderStatusFilter) -> Result<u64, RepositoryError> {
        let orders = self.list_orders(filter).await?;
        Ok(orders.len() as u64)
    }
}

/// User accounts keyed by their allocated id.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// # Errors
    ///
    /// [`RepositoryError::Conflict`] if the id or email is already taken.
    async fn insert_user(&self, user: &User) -> Result<(), RepositoryError>;
    async fn get_user(&self, id: UserId) -> Result<User, RepositoryError>;
    async fn find_user_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError>;
    async fn update_user_profile(
        &self,
        id: UserId,
        update: &ProfileUpdate,
        at: DateTime<Utc>,
    ) -> Result<User, RepositoryError>;
}

/// Every repository a service might need, behind trait objects.
#[derive(Clone)]
pub struct Repositories {
    pub counters: Arc<dyn CounterRepository>,
    pub catalog: Arc<dyn CatalogRepository>,
    pub orders: Arc<dyn OrderRepository>,
    pub users: Arc<dyn UserRepository>,
}

impl Repositories {
    /// Use one backend for every concern.
    pub fn from_backend<B>(backend: Arc<B>) -> Self
    where
        B: CounterRepository + CatalogRepository + OrderRepository + UserRepository + 'static,
    {
        Self {
            counters: backend.clone(),
            catalog: backend.clone(),
            orders: backend.clone(),
            users: backend,
        }
    }
}

impl std::fmt::Debug for Repositories {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Repositories").finish_non_exhaustive()
    }
}
