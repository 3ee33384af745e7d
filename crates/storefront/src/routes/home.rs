//! Home page: the whole visible catalog, newest first.

use axum::{Json, extract::State};
use shophub_core::catalog::{Audience, CatalogFilter};
use tracing::instrument;

use crate::error::Result;
use crate::routes::products::ProductPage;
use crate::state::AppState;

/// `GET /`
#[instrument(skip(state))]
pub async fn home(State(state): State<AppState>) -> Result<Json<ProductPage>> {
    let listings = state
        .services()
        .catalog
        .list_products(&CatalogFilter::newest(), Audience::Customer)
        .await?;
    Ok(Json(ProductPage::from(listings.as_slice())))
}
