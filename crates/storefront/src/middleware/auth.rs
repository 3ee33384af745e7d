//! Authentication extractors.
//!
//! The principal is written into the session at login and read back here.
//! Handlers pass it explicitly into the workflow services.

use axum::{extract::FromRequestParts, http::request::Parts};
use shophub_core::user::Principal;
use tower_sessions::Session;

use crate::error::AppError;
use crate::models::session_keys;

/// Extractor that requires a signed-in customer.
///
/// Rejects with `401 Unauthorized` when nobody is signed in.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(RequireAuth(principal): RequireAuth) -> String {
///     format!("Hello, {}!", principal.name)
/// }
/// ```
pub struct RequireAuth(pub Principal);

impl<S> FromRequestParts<S> for RequireAuth
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let OptionalAuth(principal) = OptionalAuth::from_request_parts(parts, state)
            .await
            .unwrap_or(OptionalAuth(None));
        principal
            .map(Self)
            .ok_or_else(|| AppError::Unauthorized("sign in required".to_string()))
    }
}

/// Extractor that optionally gets the signed-in customer.
///
/// Guests browse, fill carts, and check out without an account.
pub struct OptionalAuth(pub Option<Principal>);

impl<S> FromRequestParts<S> for OptionalAuth
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let principal = match parts.extensions.get::<Session>() {
            Some(session) => session
                .get::<Principal>(session_keys::CURRENT_USER)
                .await
                .ok()
                .flatten(),
            None => None,
        };

        Ok(Self(principal))
    }
}

/// Store the principal in the session after login.
///
/// The session id is cycled first so a pre-login id cannot be fixated.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_user(
    session: &Session,
    principal: &Principal,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session.insert(session_keys::CURRENT_USER, principal).await
}

/// Remove the principal from the session (logout). The cart stays.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_current_user(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session
        .remove::<Principal>(session_keys::CURRENT_USER)
        .await?;
    Ok(())
}
