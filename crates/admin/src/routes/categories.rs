//! Category management.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use shophub_core::CategoryKey;
use shophub_core::catalog::{Audience, Category, CategoryInput, CategoryQuery};
use tracing::instrument;

use crate::error::Result;
use crate::middleware::RequireAdmin;
use crate::state::AppState;

/// `GET /categories?search=&status=`
///
/// Soft-deleted categories are included and flagged.
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Query(query): Query<CategoryQuery>,
) -> Result<Json<Vec<Category>>> {
    let categories = state
        .services()
        .catalog
        .list_categories(&query, Audience::Admin)
        .await?;
    Ok(Json(categories))
}

/// `POST /categories`
#[instrument(skip(state, admin, input))]
pub async fn create(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Json(input): Json<CategoryInput>,
) -> Result<(StatusCode, Json<Category>)> {
    let category = state
        .services()
        .catalog
        .create_category(&admin, input)
        .await?;
    Ok((StatusCode::CREATED, Json(category)))
}

/// `POST /categories/{key}`
#[instrument(skip(state, admin, input))]
pub async fn update(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(key): Path<CategoryKey>,
    Json(input): Json<CategoryInput>,
) -> Result<Json<Category>> {
    let category = state
        .services()
        .catalog
        .update_category(&admin, key, input)
        .await?;
    Ok(Json(category))
}

/// `POST /categories/{key}/delete`
///
/// Soft delete: the row stays and is hidden from customers.
#[instrument(skip(state, admin))]
pub async fn soft_delete(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(key): Path<CategoryKey>,
) -> Result<Json<Category>> {
    let category = state
        .services()
        .catalog
        .soft_delete_category(&admin, key)
        .await?;
    Ok(Json(category))
}

/// `POST /categories/{key}/purge`
#[instrument(skip(state, admin))]
pub async fn purge(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(key): Path<CategoryKey>,
) -> Result<StatusCode> {
    state.services().catalog.purge_category(&admin, key).await?;
    Ok(StatusCode::NO_CONTENT)
}
