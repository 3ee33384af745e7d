//! In-process repository.
//!
//! Backs the services in tests and local runs without a database. Counters
//! use optimistic compare-and-swap on a per-counter version so that the
//! allocator sees real write conflicts under concurrent callers.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, PoisonError, RwLock};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::catalog::{Category, Product};
use crate::error::RepositoryError;
use crate::order::Order;
use crate::repository::{CatalogRepository, CounterRepository, OrderRepository, UserRepository};
use crate::types::{CategoryKey, Email, OrderId, OrderStatus, OrderStatusFilter, ProductKey, UserId};
use crate::user::{ProfileUpdate, User};

#[derive(Debug, Clone, Copy)]
struct VersionedCounter {
    value: i64,
    version: u64,
}

/// Thread-safe in-memory storage for every repository trait.
#[derive(Debug, Default)]
pub struct MemoryRepository {
    counters: Mutex<HashMap<String, VersionedCounter>>,
    categories: RwLock<Vec<Category>>,
    products: RwLock<Vec<Product>>,
    orders: RwLock<Vec<Order>>,
    users: RwLock<BTreeMap<i64, User>>,
}

impl MemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned<T>(_: PoisonError<T>) -> RepositoryError {
    RepositoryError::Unavailable("in-memory store lock poisoned".to_owned())
}

fn newest_first(mut orders: Vec<Order>) -> Vec<Order> {
    orders.sort_by_key(|order| std::cmp::Reverse(order.created_at()));
    orders
}

#[async_trait]
impl CounterRepository for MemoryRepository {
    async fn try_advance(&self, sequence: &str) -> Result<i64, RepositoryError> {
        let observed = self
            .counters
            .lock()
            .map_err(poisoned)?
            .get(sequence)
            .copied();

        // Other writers may run between the read and the write.
        tokio::task::yield_now().await;

        let mut counters = self.counters.lock().map_err(poisoned)?;
        let current = counters.get(sequence).copied();
        let next = match (observed, current) {
            (None, None) => VersionedCounter {
                value: 1,
                version: 1,
            },
            (Some(seen), Some(now)) if seen.version == now.version => VersionedCounter {
                value: now.value + 1,
                version: now.version + 1,
            },
            _ => return Err(RepositoryError::WriteConflict(sequence.to_owned())),
        };
        counters.insert(sequence.to_owned(), next);
        Ok(next.value)
    }

    async fn last_value(&self, sequence: &str) -> Result<Option<i64>, RepositoryError> {
        let counters = self.counters.lock().map_err(poisoned)?;
        Ok(counters.get(sequence).map(|counter| counter.value))
    }
}

#[async_trait]
impl CatalogRepository for MemoryRepository {
    async fn list_categories(&self) -> Result<Vec<Category>, RepositoryError> {
        Ok(self.categories.read().map_err(poisoned)?.clone())
    }

    async fn get_category(&self, key: CategoryKey) -> Result<Category, RepositoryError> {
        self.categories
            .read()
            .map_err(poisoned)?
            .iter()
            .find(|category| category.key == key)
            .cloned()
            .ok_or(RepositoryError::NotFound)
    }

    async fn insert_category(&self, category: &Category) -> Result<(), RepositoryError> {
        let mut categories = self.categories.write().map_err(poisoned)?;
        if categories.iter().any(|existing| existing.key == category.key) {
            return Err(RepositoryError::Conflict(format!("category {}", category.key)));
        }
        categories.push(category.clone());
        Ok(())
    }

    async fn update_category(&self, category: &Category) -> Result<(), RepositoryError> {
        let mut categories = self.categories.write().map_err(poisoned)?;
        let slot = categories
            .iter_mut()
            .find(|existing| existing.key == category.key)
            .ok_or(RepositoryError::NotFound)?;
        *slot = category.clone();
        Ok(())
    }

    async fn delete_category(&self, key: CategoryKey) -> Result<(), RepositoryError> {
        let mut categories = self.categories.write().map_err(poisoned)?;
        let before = categories.len();
        categories.retain(|category| category.key != key);
        if categories.len() == before {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn list_products(&self) -> Result<Vec<Product>, RepositoryError> {
        Ok(self.products.read().map_err(poisoned)?.clone())
    }

    async fn get_product(&self, key: ProductKey) -> Result<Product, RepositoryError> {
        self.products
            .read()
            .map_err(poisoned)?
            .iter()
            .find(|product| product.key == key)
            .cloned()
            .ok_or(RepositoryError::NotFound)
    }

    async fn insert_product(&self, product: &Product) -> Result<(), RepositoryError> {
        let mut products = self.products.write().map_err(poisoned)?;
        if products.iter().any(|existing| existing.key == product.key) {
            return Err(RepositoryError::Conflict(format!("product {}", product.key)));
        }
        products.push(product.clone());
        Ok(())
    }

    async fn update_product(&self, product: &Product) -> Result<(), RepositoryError> {
        let mut products = self.products.write().map_err(poisoned)?;
        let slot = products
            .iter_mut()
            .find(|existing| existing.key == product.key)
            .ok_or(RepositoryError::NotFound)?;
        *slot = product.clone();
        Ok(())
    }

    async fn delete_product(&self, key: ProductKey) -> Result<(), RepositoryError> {
        let mut products = self.products.write().map_err(poisoned)?;
        let before = products.len();
        products.retain(|product| product.key != key);
        if products.len() == before {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}

#[async_trait]
impl OrderRepository for MemoryRepository {
    async fn insert_order(&self, order: &Order) -> Result<(), RepositoryError> {
        let mut orders = self.orders.write().map_err(poisoned)?;
        if orders.iter().any(|existing| existing.id() == order.id()) {
            return Err(RepositoryError::Conflict(format!("order {}", order.id())));
        }
        orders.push(order.clone());
        Ok(())
    }

    async fn get_order(&self, id: OrderId) -> Result<Order, RepositoryError> {
        self.orders
            .read()
            .map_err(poisoned)?
            .iter()
            .find(|order| order.id() == id)
            .cloned()
            .ok_or(RepositoryError::NotFound)
    }

    async fn list_orders(&self, filter: OrderStatusFilter) -> Result<Vec<Order>, RepositoryError> {
        let matching = self
            .orders
            .read()
            .map_err(poisoned)?
            .iter()
            .filter(|order| filter.matches(order.status()))
            .cloned()
            .collect();
        Ok(newest_first(matching))
    }

    async fn orders_for_user(&self, user_id: UserId) -> Result<Vec<Order>, RepositoryError> {
        let matching = self
            .orders
            .read()
            .map_err(poisoned)?
            .iter()
            .filter(|order| order.user_id() == Some(user_id))
            .cloned()
            .collect();
        Ok(newest_first(matching))
    }

    async fn update_order_status(
        &self,
        id: OrderId,
        status: OrderStatus,
        at: DateTime<Utc>,
    ) -> Result<Order, RepositoryError> {
        let mut orders = self.orders.write().map_err(poisoned)?;
        let order = orders
            .iter_mut()
            .find(|order| order.id() == id)
            .ok_or(RepositoryError::NotFound)?;
        order.set_status(status, at);
        Ok(order.clone())
    }
}

#[async_trait]
impl UserRepository for MemoryRepository {
    async fn insert_user(&self, user: &User) -> Result<(), RepositoryError> {
        let mut users = self.users.write().map_err(poisoned)?;
        if users.contains_key(&user.id.as_i64()) {
            return Err(RepositoryError::Conflict(format!("user {}", user.id)));
        }
        if users.values().any(|existing| existing.email == user.email) {
            return Err(RepositoryError::Conflict("email already registered".to_owned()));
        }
        users.insert(user.id.as_i64(), user.clone());
        Ok(())
    }

    async fn get_user(&self, id: UserId) -> Result<User, RepositoryError> {
        self.users
            .read()
            .map_err(poisoned)?
            .get(&id.as_i64())
            .cloned()
            .ok_or(RepositoryError::NotFound)
    }

    async fn find_user_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError> {
        Ok(self
            .users
            .read()
            .map_err(poisoned)?
            .values()
            .find(|user| &user.email == email)
            .cloned())
    }

    async fn update_user_profile(
        &self,
        id: UserId,
        update: &ProfileUpdate,
        at: DateTime<Utc>,
    ) -> Result<User, RepositoryError> {
        let mut users = self.users.write().map_err(poisoned)?;
        let user = users.get_mut(&id.as_i64()).ok_or(RepositoryError::NotFound)?;
        user.name.clone_from(&update.name);
        user.phone.clone_from(&update.phone);
        user.address.clone_from(&update.address);
        if update.image_url.is_some() {
            user.image_url.clone_from(&update.image_url);
        }
        user.updated_at = at;
        Ok(user.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_counter_starts_at_one_and_increments() {
        let repo = MemoryRepository::new();
        assert_eq!(repo.last_value("users").await.ok(), Some(None));
        assert_eq!(repo.try_advance("users").await.ok(), Some(1));
        assert_eq!(repo.try_advance("users").await.ok(), Some(2));
        assert_eq!(repo.try_advance("other").await.ok(), Some(1));
        assert_eq!(repo.last_value("users").await.ok(), Some(Some(2)));
    }

    #[tokio::test]
    async fn test_interleaved_advance_conflicts() {
        let repo = MemoryRepository::new();
        let (first, second) = tokio::join!(repo.try_advance("users"), repo.try_advance("users"));

        let results = [first, second];
        let won = results.iter().filter(|r| r.is_ok()).count();
        let lost = results
            .iter()
            .filter(|r| matches!(r, Err(RepositoryError::WriteConflict(_))))
            .count();
        assert_eq!((won, lost), (1, 1));
        assert_eq!(repo.last_value("users").await.ok(), Some(Some(1)));
    }

    #[tokio::test]
    async fn test_missing_rows() {
        let repo = MemoryRepository::new();
        assert!(matches!(
            repo.get_order(OrderId::generate()).await,
            Err(RepositoryError::NotFound)
        ));
        assert!(matches!(
            repo.delete_product(ProductKey::generate()).await,
            Err(RepositoryError::NotFound)
        ));
    }
}
