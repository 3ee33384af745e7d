//! Authentication extractors for admin.
//!
//! Only administrators are ever stored in the admin session, but the role is
//! checked again on every request.

use axum::{extract::FromRequestParts, http::request::Parts};
use shophub_core::user::Principal;
use tower_sessions::Session;

use crate::error::AppError;
use crate::models::session_keys;

/// Extractor that requires a signed-in administrator.
///
/// Rejects with `401` when nobody is signed in and `403` when the session
/// holds a non-admin principal.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(RequireAdmin(admin): RequireAdmin) -> String {
///     format!("Hello, {}!", admin.name)
/// }
/// ```
pub struct RequireAdmin(pub Principal);

impl<S> FromRequestParts<S> for RequireAdmin
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let session = parts
            .extensions
            .get::<Session>()
            .ok_or_else(|| AppError::Unauthorized("no session".to_string()))?;

        let principal: Principal = session
            .get(session_keys::CURRENT_ADMIN)
            .await
            .ok()
            .flatten()
            .ok_or_else(|| AppError::Unauthorized("sign in required".to_string()))?;

        if !principal.is_admin() {
            return Err(AppError::Forbidden("administrator access required".to_string()));
        }
        Ok(Self(principal))
    }
}

/// Store the administrator in the session after login.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_admin(
    session: &Session,
    admin: &Principal,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session.insert(session_keys::CURRENT_ADMIN, admin).await
}

/// Drop the whole admin session (logout), pending invoice included.
///
/// # Errors
///
/// Returns an error if the session cannot be flushed.
pub async fn clear_current_admin(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session.flush().await
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::{
        Router,
        body::Body,
        http::{Request, StatusCode, header},
        response::IntoResponse,
        routing::{get, post},
    };
    use shophub_core::{Email, UserId, UserRole};
    use tower::ServiceExt;
    use tower_sessions::MemoryStore;
    use tower_sessions::cookie::Key;

    use super::*;
    use crate::middleware::session_layer;

    fn principal(role: UserRole) -> Principal {
        Principal {
            user_id: UserId::new(7),
            email: Email::parse("someone@shophub.test").unwrap(),
            name: "Someone".to_string(),
            role,
        }
    }

    async fn protected(RequireAdmin(admin): RequireAdmin) -> String {
        admin.name
    }

    fn router(role: UserRole) -> Router {
        Router::new()
            .route(
                "/sign-in",
                post(move |session: Session| async move {
                    set_current_admin(&session, &principal(role)).await.unwrap();
                    StatusCode::NO_CONTENT.into_response()
                }),
            )
            .route("/protected", get(protected))
            .layer(session_layer(MemoryStore::default(), false, Key::generate()))
    }

    async fn sign_in_cookie(app: &Router) -> String {
        let signed_in = app
            .clone()
            .oneshot(Request::post("/sign-in").body(Body::empty()).unwrap())
            .await
            .unwrap();
        signed_in.headers()[header::SET_COOKIE]
            .to_str()
            .unwrap()
            .split(';')
            .next()
            .unwrap()
            .to_string()
    }

    async fn status_with_cookie(app: Router, cookie: String) -> StatusCode {
        app.oneshot(
            Request::get("/protected")
                .header(header::COOKIE, cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap()
        .status()
    }

    async fn status_after_sign_in(role: UserRole) -> StatusCode {
        let app = router(role);
        let cookie = sign_in_cookie(&app).await;
        status_with_cookie(app, cookie).await
    }

    #[tokio::test]
    async fn test_anonymous_is_unauthorized() {
        let response = router(UserRole::Admin)
            .oneshot(Request::get("/protected").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_admin_passes() {
        assert_eq!(status_after_sign_in(UserRole::Admin).await, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_customer_principal_is_forbidden() {
        assert_eq!(
            status_after_sign_in(UserRole::User).await,
            StatusCode::FORBIDDEN
        );
    }

    #[tokio::test]
    async fn test_tampered_session_cookie_is_ignored() {
        let app = router(UserRole::Admin);
        let mut cookie = sign_in_cookie(&app).await;
        let replacement = if cookie.ends_with('A') { 'B' } else { 'A' };
        cookie.pop();
        cookie.push(replacement);

        assert_eq!(
            status_with_cookie(app, cookie).await,
            StatusCode::UNAUTHORIZED
        );
    }
}
