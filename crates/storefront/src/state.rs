//! Application state shared across handlers.

use std::sync::Arc;

use shophub_core::services::Services;
use sqlx::PgPool;

use crate::config::StorefrontConfig;

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`. The pool is absent when the services run on
/// the in-memory repository (tests, local demos).
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    services: Services,
    pool: Option<PgPool>,
}

impl AppState {
    #[must_use]
    pub fn new(config: StorefrontConfig, services: Services, pool: Option<PgPool>) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                services,
                pool,
            }),
        }
    }

    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn services(&self) -> &Services {
        &self.inner.services
    }

    /// Database pool, if the services are backed by `PostgreSQL`.
    #[must_use]
    pub fn pool(&self) -> Option<&PgPool> {
        self.inner.pool.as_ref()
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("config", &self.inner.config)
            .field("services", &self.inner.services)
            .field("postgres", &self.inner.pool.is_some())
            .finish()
    }
}
