//! Product management.
//!
//! Admin listings include cost prices, inactive products, and soft-deleted
//! rows.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;
use shophub_core::ProductKey;
use shophub_core::catalog::{
    Audience, CatalogFilter, CategoryFilter, PriceBand, Product, ProductInput, ProductListing,
};
use tracing::instrument;

use crate::error::Result;
use crate::middleware::RequireAdmin;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ProductQuery {
    pub category: Option<String>,
    pub search: Option<String>,
    #[serde(default)]
    pub price: PriceBand,
}

/// `GET /products?category=&search=&price=`
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Query(query): Query<ProductQuery>,
) -> Result<Json<Vec<ProductListing>>> {
    let mut filter = CatalogFilter::newest()
        .with_category(CategoryFilter::parse(query.category.as_deref()))
        .with_price(query.price);
    if let Some(search) = query.search {
        filter = filter.with_search(search);
    }

    let listings = state
        .services()
        .catalog
        .list_products(&filter, Audience::Admin)
        .await?;
    Ok(Json(listings))
}

/// `GET /products/{key}`
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(key): Path<ProductKey>,
) -> Result<Json<Product>> {
    Ok(Json(state.services().catalog.product(key).await?))
}

/// `POST /products`
#[instrument(skip(state, admin, input))]
pub async fn create(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Json(input): Json<ProductInput>,
) -> Result<(StatusCode, Json<Product>)> {
    let product = state.services().catalog.create_product(&admin, input).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

/// `POST /products/{key}`
#[instrument(skip(state, admin, input))]
pub async fn update(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(key): Path<ProductKey>,
    Json(input): Json<ProductInput>,
) -> Result<Json<Product>> {
    let product = state
        .services()
        .catalog
        .update_product(&admin, key, input)
        .await?;
    Ok(Json(product))
}

/// `POST /products/{key}/delete`
#[instrument(skip(state, admin))]
pub async fn soft_delete(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(key): Path<ProductKey>,
) -> Result<Json<Product>> {
    let product = state
        .services()
        .catalog
        .soft_delete_product(&admin, key)
        .await?;
    Ok(Json(product))
}

/// `POST /products/{key}/purge`
///
/// Orders keep their item snapshots; profit reports then count the item at
/// zero cost.
#[instrument(skip(state, admin))]
pub async fn purge(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(key): Path<ProductKey>,
) -> Result<StatusCode> {
    state.services().catalog.purge_product(&admin, key).await?;
    Ok(StatusCode::NO_CONTENT)
}

