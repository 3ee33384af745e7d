//! Session middleware configuration.
//!
//! Production uses the `PostgreSQL` store from `tower-sessions-sqlx-store`;
//! tests plug in the in-memory store. Both go through [`session_layer`].
//! The session id cookie is signed with a key derived from
//! `STOREFRONT_SESSION_SECRET`.

use sqlx::PgPool;
use tower_sessions::cookie::Key;
use tower_sessions::service::SignedCookie;
use tower_sessions::{Expiry, SessionManagerLayer, SessionStore};
use tower_sessions_sqlx_store::PostgresStore;

use crate::config::{ConfigError, StorefrontConfig};

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "shophub_session";

/// Session expiry time in seconds (7 days).
const SESSION_EXPIRY_SECONDS: i64 = 7 * 24 * 60 * 60;

/// Create the session layer backed by `PostgreSQL`.
///
/// The `tower_sessions.session` table is created by the core migrations.
///
/// # Errors
///
/// Returns [`ConfigError::InsecureSecret`] if the session secret cannot be
/// turned into a signing key.
pub fn create_session_layer(
    pool: &PgPool,
    config: &StorefrontConfig,
) -> Result<SessionManagerLayer<PostgresStore, SignedCookie>, ConfigError> {
    Ok(session_layer(
        PostgresStore::new(pool.clone()),
        config.is_secure(),
        config.session_key()?,
    ))
}

/// Apply the storefront cookie settings to any session store.
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
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_http_only(true)
        .with_path("/")
}
