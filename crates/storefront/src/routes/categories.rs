//! Category route handlers.

use axum::{
    Json,
    extract::{Query, State},
};
use serde::Serialize;
use shophub_core::catalog::{Audience, Category, CategoryQuery};
use tracing::instrument;

use crate::error::Result;
use crate::state::AppState;

/// Customer view of a category.
#[derive(Debug, Serialize)]
pub struct CategoryView {
    pub category_id: String,
    pub name: String,
}

impl From<Category> for CategoryView {
    fn from(category: Category) -> Self {
        Self {
            category_id: category.category_id,
            name: category.name,
        }
    }
}

/// `GET /categories?search=`
///
/// Only active, non-deleted categories are returned.
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<CategoryQuery>,
) -> Result<Json<Vec<CategoryView>>> {
    let categories = state
        .services()
        .catalog
        .list_categories(&query, Audience::Customer)
        .await?;
    Ok(Json(categories.into_iter().map(CategoryView::from).collect()))
}
