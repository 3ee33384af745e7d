//! `PostgreSQL` repository.
//!
//! # Tables
//!
//! - `counters` - One row per named sequence
//! - `users` - Accounts; the primary key is the allocated id
//! - `categories` / `products` - Catalog rows keyed by UUID
//! - `orders` - Placed orders with JSONB item snapshots
//!
//! # Migrations
//!
//! Migrations live in `crates/core/migrations/` and run via:
//! ```bash
//! cargo run -p shophub-cli -- migrate
//! ```
//!
//! Queries are checked at runtime (`sqlx::query_as` with `FromRow` rows) so
//! the crate builds without a live database.

mod catalog;
mod counters;
mod orders;
mod users;

use sqlx::PgPool;

use crate::error::RepositoryError;

/// SQLSTATE for `serialization_failure`.
const SERIALIZATION_FAILURE: &str = "40001";
/// SQLSTATE for `deadlock_detected`.
const DEADLOCK_DETECTED: &str = "40P01";
/// SQLSTATE for `unique_violation`.
const UNIQUE_VIOLATION: &str = "23505";

/// Repository backed by a `PostgreSQL` pool. Implements every repository trait.
#[derive(Debug, Clone)]
pub struct PgRepository {
    pool: PgPool,
}

impl PgRepository {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn sqlstate(err: &sqlx::Error) -> Option<String> {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().map(|code| code.into_owned()),
        _ => None,
    }
}

/// Map a unique violation to `Conflict`, everything else to `Database`.
fn conflict_on_unique(err: sqlx::Error, what: &str) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = err
        && db_err.is_unique_violation()
    {
        return RepositoryError::Conflict(format!("{what} already exists"));
    }
    RepositoryError::Database(err)
}

fn corrupt(what: &str, detail: impl std::fmt::Display) -> RepositoryError {
    RepositoryError::DataCorruption(format!("invalid {what} in database: {detail}"))
}
