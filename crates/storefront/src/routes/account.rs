//! Account route handlers (signed-in customers only).

use axum::{Json, extract::State};
use shophub_core::order::Order;
use shophub_core::user::{Profile, ProfileUpdate};
use tower_sessions::Session;
use tracing::instrument;

use crate::error::Result;
use crate::middleware::{RequireAuth, set_current_user};
use crate::state::AppState;

/// `GET /account`
#[instrument(skip(state, principal), fields(user_id = %principal.user_id))]
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(principal): RequireAuth,
) -> Result<Json<Profile>> {
    Ok(Json(state.services().accounts.profile(&principal).await?))
}

/// `POST /account`
///
/// The session principal picks up the new display name.
#[instrument(skip(state, session, principal, update), fields(user_id = %principal.user_id))]
pub async fn update(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(mut principal): RequireAuth,
    Json(update): Json<ProfileUpdate>,
) -> Result<Json<Profile>> {
    let profile = state
        .services()
        .accounts
        .update_profile(&principal, update)
        .await?;

    principal.name.clone_from(&profile.name);
    set_current_user(&session, &principal).await?;
    Ok(Json(profile))
}

/// `GET /account/orders`
///
/// Newest first.
#[instrument(skip(state, principal), fields(user_id = %principal.user_id))]
pub async fn orders(
    State(state): State<AppState>,
    RequireAuth(principal): RequireAuth,
) -> Result<Json<Vec<Order>>> {
    Ok(Json(state.services().orders.list_visible(&principal).await?))
}
