//! Dashboard counters.

use axum::{Json, extract::State};
use shophub_core::invoice::StoreStats;
use tracing::instrument;

use crate::error::Result;
use crate::middleware::RequireAdmin;
use crate::state::AppState;

/// `GET /`
#[instrument(skip(state, admin), fields(admin = %admin.user_id))]
pub async fn index(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
) -> Result<Json<StoreStats>> {
    Ok(Json(state.services().reports.stats(&admin).await?))
}
