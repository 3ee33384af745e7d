//! Admin sign-in and sign-out.

use axum::{Json, extract::State, http::StatusCode};
use serde::Deserialize;
use shophub_core::user::Principal;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{AppError, Result, clear_sentry_user, set_sentry_user};
use crate::middleware::{clear_current_admin, set_current_admin};
use crate::state::AppState;

/// Login request body.
#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginRequest")
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

/// `POST /auth/login`
///
/// Valid customer credentials are refused here; nothing is stored for them.
#[instrument(skip(state, session, request), fields(email = %request.email))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Json(request): Json<LoginRequest>,
) -> Result<Json<Principal>> {
    let user = state
        .services()
        .accounts
        .authenticate(&request.email, &request.password)
        .await?;

    let principal = user.principal();
    if !principal.is_admin() {
        tracing::warn!(user_id = %principal.user_id, "Non-admin attempted admin sign-in");
        return Err(AppError::Forbidden(
            "administrator access required".to_string(),
        ));
    }

    set_current_admin(&session, &principal).await?;
    set_sentry_user(principal.user_id, Some(principal.email.as_str()));
    tracing::info!(user_id = %principal.user_id, "Admin signed in");
    Ok(Json(principal))
}

/// `POST /auth/logout`
pub async fn logout(session: Session) -> Result<StatusCode> {
    clear_current_admin(&session).await?;
    clear_sentry_user();
    Ok(StatusCode::NO_CONTENT)
}
