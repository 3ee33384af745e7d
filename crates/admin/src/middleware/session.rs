//! Session middleware configuration for admin.
//!
//! Stricter than the storefront: `SameSite=Strict` and a 24 hour inactivity
//! expiry. Shares the `tower_sessions.session` table; the cookie name keeps
//! the two apps apart. The cookie is signed with `ADMIN_SESSION_SECRET`.

use sqlx::PgPool;
use tower_sessions::cookie::Key;
use tower_sessions::service::SignedCookie;
use tower_sessions::{Expiry, SessionManagerLayer, SessionStore};
use tower_sessions_sqlx_store::PostgresStore;

use crate::config::{AdminConfig, ConfigError};

/// Session cookie name for admin.
pub const SESSION_COOKIE_NAME: &str = "shophub_admin_session";

/// Session expiry time in seconds (24 hours).
const SESSION_EXPIRY_SECONDS: i64 = 24 * 60 * 60;

/// Create the session layer with `PostgreSQL` store.
///
/// # Errors
///
/// Returns [`ConfigError::InsecureSecret`] if the session secret cannot be
/// turned into a signing key.
pub fn create_session_layer(
    pool: &PgPool,
    config: &AdminConfig,
) -> Result<SessionManagerLayer<PostgresStore, SignedCookie>, ConfigError> {
    let is_secure = config.base_url.starts_with("https://");
    Ok(session_layer(
        PostgresStore::new(pool.clone()),
        is_secure,
        config.session_key()?,
    ))
}

/// Apply the admin cookie settings to any session store.
#[must_use]
pub fn session_layer<S>(store: S, secure: bool, key: Key) -> SessionManagerLayer<S, SignedCookie>
where
    S: SessionStore + Clone,
{
    SessionManagerLayer::new(store)
        .with_name(SESSION_COOKIE_NAME)
        .with_signed(key)
        .with_expiry(Expiry::OnInactivity(
            tower_sessions::cookie::time::Duration::seconds(SESSION_EXPIRY_SECONDS),
        ))
        .with_secure(secure)
        .with_same_site(tower_sessions::cookie::SameSite::Strict)
        .with_http_only(true)
        .with_path("/")
}
