//! Profit analytics over delivered orders.

use axum::{Json, extract::State};
use shophub_core::invoice::ProfitReport;
use tracing::instrument;

use crate::error::Result;
use crate::middleware::RequireAdmin;
use crate::state::AppState;

/// `GET /analytics`
///
/// Costs come from the current product rows, so editing a cost price
/// changes historical profit.
#[instrument(skip(state, admin), fields(admin = %admin.user_id))]
pub async fn profit(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
) -> Result<Json<ProfitReport>> {
    Ok(Json(state.services().reports.profit(&admin).await?))
}
