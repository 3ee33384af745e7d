//! Catalog reads for customers and catalog management for administrators.

use std::sync::Arc;

use chrono::Utc;
use tracing::instrument;

use crate::catalog::{
    Audience, CatalogFilter, CatalogIndex, Category, CategoryInput, CategoryQuery, Product,
    ProductInput, ProductListing,
};
use crate::error::WorkflowError;
use crate::repository::{CatalogRepository, Repositories};
use crate::types::{CategoryKey, ProductKey};
use crate::user::Principal;

#[derive(Clone)]
pub struct CatalogService {
    catalog: Arc<dyn CatalogRepository>,
}

impl CatalogService {
    #[must_use]
    pub fn new(repos: &Repositories) -> Self {
        Self {
            catalog: Arc::clone(&repos.catalog),
        }
    }

    /// Snapshot the whole catalog into a queryable index.
    ///
    /// # Errors
    ///
    /// Propagates repository failures.
    pub async fn index(&self) -> Result<CatalogIndex, WorkflowError> {
        let categories = self.catalog.list_categories().await?;
        let products = self.catalog.list_products().await?;
        Ok(CatalogIndex::new(categories, products))
    }

    /// # Errors
    ///
    /// Propagates repository failures.
    pub async fn list_products(
        &self,
        filter: &CatalogFilter,
        audience: Audience,
    ) -> Result<Vec<ProductListing>, WorkflowError> {
        Ok(self.index().await?.list(filter, audience))
    }

    /// # Errors
    ///
    /// Propagates repository failures.
    pub async fn list_categories(
        &self,
        query: &CategoryQuery,
        audience: Audience,
    ) -> Result<Vec<Category>, WorkflowError> {
        Ok(self.index().await?.categories(query, audience))
    }

    /// A product page as customers see it.
    ///
    /// # Errors
    ///
    /// `NotFound` for unknown products and for ones hidden from customers.
    pub async fn customer_product(&self, key: ProductKey) -> Result<ProductListing, WorkflowError> {
        self.index()
            .await?
            .customer_product(key)
            .ok_or_else(|| WorkflowError::not_found(format_args!("product {key}")))
    }

    /// A product that can go into a cart right now.
    ///
    /// # Errors
    ///
    /// `NotFound` for unknown products, `Validation` for ones off sale.
    pub async fn purchasable_product(&self, key: ProductKey) -> Result<Product, WorkflowError> {
        let product = self.product(key).await?;
        if !product.is_purchasable() {
            return Err(WorkflowError::invalid(format!(
                "{} is not available",
                product.name
            )));
        }
        Ok(product)
    }

    /// Any stored product, soft-deleted included.
    ///
    /// # Errors
    ///
    /// `NotFound` for unknown products.
    pub async fn product(&self, key: ProductKey) -> Result<Product, WorkflowError> {
        self.catalog
            .get_product(key)
            .await
            .map_err(|e| WorkflowError::from_lookup(e, format_args!("product {key}")))
    }

    /// # Errors
    ///
    /// `NotFound` for unknown categories.
    pub async fn category(&self, key: CategoryKey) -> Result<Category, WorkflowError> {
        self.catalog
            .get_category(key)
            .await
            .map_err(|e| WorkflowError::from_lookup(e, format_args!("category {key}")))
    }

    /// # Errors
    ///
    /// `Forbidden`, `Validation`, or `Duplicate` when another live category
    /// already uses the business key.
    #[instrument(skip(self, principal, input), fields(category_id = %input.category_id))]
    pub async fn create_category(
        &self,
        principal: &Principal,
        input: CategoryInput,
    ) -> Result<Category, WorkflowError> {
        principal.require_admin("managing categories")?;
        let input = input.normalized()?;
        self.ensure_unique_category_id(&input.category_id, None).await?;

        let now = Utc::now();
        let category = Category {
            key: CategoryKey::generate(),
            category_id: input.category_id,
            name: input.name,
            active: input.active,
            deleted: false,
            created_at: now,
            updated_at: now,
        };
        self.catalog.insert_category(&category).await?;
        tracing::info!(key = %category.key, "Category created");
        Ok(category)
    }

    /// # Errors
    ///
    /// Same as [`Self::create_category`], plus `NotFound`.
    #[instrument(skip(self, principal, input))]
    pub async fn update_category(
        &self,
        principal: &Principal,
        key: CategoryKey,
        input: CategoryInput,
    ) -> Result<Category, WorkflowError> {
        principal.require_admin("managing categories")?;
        let input = input.normalized()?;
        let mut category = self.category(key).await?;
        self.ensure_unique_category_id(&input.category_id, Some(key))
            .await?;

        category.category_id = input.category_id;
        category.name = input.name;
        category.active = input.active;
        category.updated_at = Utc::now();
        self.catalog.update_category(&category).await?;
        Ok(category)
    }

    /// Mark a category deleted; the row stays.
    ///
    /// # Errors
    ///
    /// `Forbidden` or `NotFound`.
    #[instrument(skip(self, principal))]
    pub async fn soft_delete_category(
        &self,
        principal: &Principal,
        key: CategoryKey,
    ) -> Result<Category, WorkflowError> {
        principal.require_admin("managing categories")?;
        let mut category = self.category(key).await?;
        category.deleted = true;
        category.updated_at = Utc::now();
        self.catalog.update_category(&category).await?;
        Ok(category)
    }

    /// Remove a category row. Products keep their business key and show an
    /// empty category label afterwards.
    ///
    /// # Errors
    ///
    /// `Forbidden` or `NotFound`.
    #[instrument(skip(self, principal))]
    pub async fn purge_category(
        &self,
        principal: &Principal,
        key: CategoryKey,
    ) -> Result<(), WorkflowError> {
        principal.require_admin("managing categories")?;
        self.catalog
            .delete_category(key)
            .await
            .map_err(|e| WorkflowError::from_lookup(e, format_args!("category {key}")))?;
        tracing::info!(%key, "Category purged");
        Ok(())
    }

    /// # Errors
    ///
    /// `Forbidden`, or `Validation` for bad input or an unknown category.
    #[instrument(skip(self, principal, input), fields(name = %input.name))]
    pub async fn create_product(
        &self,
        principal: &Principal,
        input: ProductInput,
    ) -> Result<Product, WorkflowError> {
        principal.require_admin("managing products")?;
        let input = input.normalized()?;
        self.ensure_category_exists(&input.category_id).await?;

        let now = Utc::now();
        let product = Product {
            key: ProductKey::generate(),
            category_id: input.category_id,
            name: input.name,
            description: input.description,
            cost_price: input.cost_price,
            sell_price: input.sell_price,
            stock_qty: input.stock_qty,
            image_url: input.image_url,
            active: input.active,
            deleted: false,
            created_at: now,
            updated_at: now,
        };
        self.catalog.insert_product(&product).await?;
        tracing::info!(key = %product.key, "Product created");
        Ok(product)
    }

    /// # Errors
    ///
    /// Same as [`Self::create_product`], plus `NotFound`.
    #[instrument(skip(self, principal, input))]
    pub async fn update_product(
        &self,
        principal: &Principal,
        key: ProductKey,
        input: ProductInput,
    ) -> Result<Product, WorkflowError> {
        principal.require_admin("managing products")?;
        let input = input.normalized()?;
        let mut product = self.product(key).await?;
        self.ensure_category_exists(&input.category_id).await?;

        product.category_id = input.category_id;
        product.name = input.name;
        product.description = input.description;
        product.cost_price = input.cost_price;
        product.sell_price = input.sell_price;
        product.stock_qty = input.stock_qty;
        product.image_url = input.image_url;
        product.active = input.active;
        product.updated_at = Utc::now();
        self.catalog.update_product(&product).await?;
        Ok(product)
    }

    /// Mark a product deleted; existing orders keep their snapshot.
    ///
    /// # Errors
    ///
    /// `Forbidden` or `NotFound`.
    #[instrument(skip(self, principal))]
    pub async fn soft_delete_product(
        &self,
        principal: &Principal,
        key: ProductKey,
    ) -> Result<Product, WorkflowError> {
        principal.require_admin("managing products")?;
        let mut product = self.product(key).await?;
        product.deleted = true;
        product.updated_at = Utc::now();
        self.catalog.update_product(&product).await?;
        Ok(product)
    }

    /// Remove a product row. Profit reports then count its cost as zero.
    ///
    /// # Errors
    ///
    /// `Forbidden` or `NotFound`.
    #[instrument(skip(self, principal))]
    pub async fn purge_product(
        &self,
        principal: &Principal,
        key: ProductKey,
    ) -> Result<(), WorkflowError> {
        principal.require_admin("managing products")?;
        self.catalog
            .delete_product(key)
            .await
            .map_err(|e| WorkflowError::from_lookup(e, format_args!("product {key}")))?;
        tracing::info!(%key, "Product purged");
        Ok(())
    }

    async fn ensure_unique_category_id(
        &self,
        category_id: &str,
        except: Option<CategoryKey>,
    ) -> Result<(), WorkflowError> {
        let taken = self
            .catalog
            .list_categories()
            .await?
            .iter()
            .any(|c| !c.deleted && c.category_id == category_id && Some(c.key) != except);
        if taken {
            return Err(WorkflowError::Duplicate(format!(
                "category id {category_id}"
            )));
        }
        Ok(())
    }

    async fn ensure_category_exists(&self, category_id: &str) -> Result<(), WorkflowError> {
        let exists = self
            .catalog
            .list_categories()
            .await?
            .iter()
            .any(|c| !c.deleted && c.category_id == category_id);
        if exists {
            Ok(())
        } else {
            Err(WorkflowError::invalid(format!(
                "unknown category {category_id}"
            )))
        }
    }
}

impl std::fmt::Debug for CatalogService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogService").finish_non_exhaustive()
    }
}
