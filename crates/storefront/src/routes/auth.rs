//! Authentication route handlers.
//!
//! Sign-in stores the [`Principal`] in the session; handlers read it back
//! through the extractors in [`crate::middleware::auth`].

use axum::{Json, extract::State, http::StatusCode};
use serde::Deserialize;
use shophub_core::user::{Principal, Registration};
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{Result, clear_sentry_user, set_sentry_user};
use crate::middleware::{clear_current_user, set_current_user};
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

async fn sign_in(session: &Session, principal: &Principal) -> Result<()> {
    set_current_user(session, principal).await?;
    set_sentry_user(&principal.user_id, Some(principal.email.as_str()));
    Ok(())
}

/// `POST /auth/register`
///
/// Creates the account and signs it in.
#[instrument(skip(state, session, registration))]
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    Json(registration): Json<Registration>,
) -> Result<(StatusCode, Json<Principal>)> {
    let user = state.services().accounts.register(registration).await?;
    let principal = user.principal();
    sign_in(&session, &principal).await?;
    Ok((StatusCode::CREATED, Json(principal)))
}

/// `POST /auth/login`
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
    sign_in(&session, &principal).await?;
    tracing::info!(user_id = %principal.user_id, "Signed in");
    Ok(Json(principal))
}

/// `POST /auth/logout`
pub async fn logout(session: Session) -> Result<StatusCode> {
    clear_current_user(&session).await?;
    clear_sentry_user();
    Ok(StatusCode::NO_CONTENT)
}
