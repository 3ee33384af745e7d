use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::{PgRepository, conflict_on_unique, corrupt};
use crate::catalog::{Category, Product};
use crate::error::RepositoryError;
use crate::repository::CatalogRepository;
use crate::types::{CategoryKey, Price, ProductKey};

const CATEGORY_COLUMNS: &str =
    "key, category_id, name, active, deleted, created_at, updated_at";

const PRODUCT_COLUMNS: &str = "key, category_id, name, description, cost_price, sell_price, \
     stock_qty, image_url, active, deleted, created_at, updated_at";

#[derive(sqlx::FromRow)]
struct CategoryRow {
    key: CategoryKey,
    category_id: String,
    name: String,
    active: bool,
    deleted: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<CategoryRow> for Category {
    fn from(r: CategoryRow) -> Self {
        Self {
            key: r.key,
            category_id: r.category_id,
            name: r.name,
            active: r.active,
            deleted: r.deleted,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct ProductRow {
    key: ProductKey,
    category_id: String,
    name: String,
    description: String,
    cost_price: Price,
    sell_price: Price,
    stock_qty: i64,
    image_url: String,
    active: bool,
    deleted: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ProductRow> for Product {
    type Error = RepositoryError;

    fn try_from(r: ProductRow) -> Result<Self, Self::Error> {
        let stock_qty = u32::try_from(r.stock_qty).map_err(|e| corrupt("stock_qty", e))?;
        Ok(Self {
            key: r.key,
            category_id: r.category_id,
            name: r.name,
            description: r.description,
            cost_price: r.cost_price,
            sell_price: r.sell_price,
            stock_qty,
            image_url: r.image_url,
            active: r.active,
            deleted: r.deleted,
            created_at: r.created_at,
            updated_at: r.updated_at,
        })
    }
}

fn expect_one_row(rows_affected: u64) -> Result<(), RepositoryError> {
    if rows_affected == 0 {
        Err(RepositoryError::NotFound)
    } else {
        Ok(())
    }
}

#[async_trait]
impl CatalogRepository for PgRepository {
    async fn list_categories(&self) -> Result<Vec<Category>, RepositoryError> {
        let rows: Vec<CategoryRow> = sqlx::query_as(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM categories ORDER BY created_at"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Category::from).collect())
    }

    async fn get_category(&self, key: CategoryKey) -> Result<Category, RepositoryError> {
        let row: Option<CategoryRow> = sqlx::query_as(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM categories WHERE key = $1"
        ))
        .bind(key)
        .fetch_optional(&self.pool)
        .await?;
        row.map(Category::from).ok_or(RepositoryError::NotFound)
    }

    async fn insert_category(&self, category: &Category) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO categories (key, category_id, name, active, deleted, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ",
        )
        .bind(category.key)
        .bind(&category.category_id)
        .bind(&category.name)
        .bind(category.active)
        .bind(category.deleted)
        .bind(category.created_at)
        .bind(category.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, "category"))?;
        Ok(())
    }

    async fn update_category(&self, category: &Category) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE categories
            SET category_id = $2, name = $3, active = $4, deleted = $5, updated_at = $6
            WHERE key = $1
            ",
        )
        .bind(category.key)
        .bind(&category.category_id)
        .bind(&category.name)
        .bind(category.active)
        .bind(category.deleted)
        .bind(category.updated_at)
        .execute(&self.pool)
        .await?;
        expect_one_row(result.rows_affected())
    }

    async fn delete_category(&self, key: CategoryKey) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM categories WHERE key = $1")
            .bind(key)
            .execute(&self.pool)
            .await?;
        expect_one_row(result.rows_affected())
    }

    async fn list_products(&self) -> Result<Vec<Product>, RepositoryError> {
        let rows: Vec<ProductRow> = sqlx::query_as(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products ORDER BY created_at"
        ))
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(Product::try_from).collect()
    }

    async fn get_product(&self, key: ProductKey) -> Result<Product, RepositoryError> {
        let row: Option<ProductRow> = sqlx::query_as(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE key = $1"
        ))
        .bind(key)
        .fetch_optional(&self.pool)
        .await?;
        row.ok_or(RepositoryError::NotFound).and_then(Product::try_from)
    }

    async fn insert_product(&self, product: &Product) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO products (key, category_id, name, description, cost_price, sell_price,
                                  stock_qty, image_url, active, deleted, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            ",
        )
        .bind(product.key)
        .bind(&product.category_id)
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.cost_price)
        .bind(product.sell_price)
        .bind(i64::from(product.stock_qty))
        .bind(&product.image_url)
        .bind(product.active)
        .bind(product.deleted)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, "product"))?;
        Ok(())
    }

    async fn update_product(&self, product: &Product) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE products
            SET category_id = $2, name = $3, description = $4, cost_price = $5,
                sell_price = $6, stock_qty = $7, image_url = $8, active = $9,
                deleted = $10, updated_at = $11
            WHERE key = $1
            ",
        )
        .bind(product.key)
        .bind(&product.category_id)
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.cost_price)
        .bind(product.sell_price)
        .bind(i64::from(product.stock_qty))
        .bind(&product.image_url)
        .bind(product.active)
        .bind(product.deleted)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await?;
        expect_one_row(result.rows_affected())
    }

    async fn delete_product(&self, key: ProductKey) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM products WHERE key = $1")
            .bind(key)
            .execute(&self.pool)
            .await?;
        expect_one_row(result.rows_affected())
    }
}
