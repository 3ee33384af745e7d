//! Order fulfillment.

use axum::{
    Json,
    extract::{Path, Query, State},
    response::Redirect,
};
use serde::Deserialize;
use shophub_core::order::Order;
use shophub_core::{OrderId, OrderStatus, OrderStatusFilter};
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::middleware::RequireAdmin;
use crate::models::session::stash_invoice;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct OrderQuery {
    /// `all`, blank, or one status name.
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct StatusUpdate {
    pub status: OrderStatus,
}

/// `GET /orders?status=`
///
/// Newest first.
#[instrument(skip(state, admin))]
pub async fn index(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Query(query): Query<OrderQuery>,
) -> Result<Json<Vec<Order>>> {
    let filter: OrderStatusFilter = query
        .status
        .as_deref()
        .unwrap_or_default()
        .parse()
        .map_err(AppError::BadRequest)?;
    let orders = state
        .services()
        .orders
        .list_by_status(&admin, filter)
        .await?;
    Ok(Json(orders))
}

/// `GET /orders/{id}`
#[instrument(skip(state, admin))]
pub async fn show(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<OrderId>,
) -> Result<Json<Order>> {
    Ok(Json(state.services().orders.get(&admin, id).await?))
}

/// `POST /orders/{id}/status`
#[instrument(skip(state, admin), fields(admin = %admin.user_id))]
pub async fn update_status(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<OrderId>,
    Json(update): Json<StatusUpdate>,
) -> Result<Json<Order>> {
    let order = state
        .services()
        .orders
        .transition(&admin, id, update.status)
        .await?;
    Ok(Json(order))
}

/// `POST /orders/{id}/invoice`
///
/// Generates the invoice into the session and redirects to `GET /invoice`,
/// which hands it out exactly once.
#[instrument(skip(state, session, admin))]
pub async fn generate_invoice(
    State(state): State<AppState>,
    session: Session,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<OrderId>,
) -> Result<Redirect> {
    let invoice = state.services().orders.invoice(&admin, id).await?;
    stash_invoice(&session, &invoice).await?;
    tracing::info!(order_id = %id, reference = %invoice.reference, "Invoice generated");
    Ok(Redirect::to("/invoice"))
}
