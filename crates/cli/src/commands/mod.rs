//! Subcommand implementations.

pub mod admin;
pub mod migrate;
pub mod seed;

use std::sync::Arc;

use secrecy::{ExposeSecret, SecretString};
use shophub_core::WorkflowError;
use shophub_core::postgres::PgRepository;
use shophub_core::repository::Repositories;
use shophub_core::services::{ServiceSettings, Services};
use sqlx::PgPool;
use thiserror::Error;

/// Errors surfaced by any subcommand.
#[derive(Debug, Error)]
pub enum CliError {
    /// Required environment variable is missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    /// Database connection error.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Migration failed to apply.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A workflow service rejected the request.
    #[error(transparent)]
    Workflow(#[from] WorkflowError),
}

/// Connect using `DATABASE_URL` (a `.env` file is honoured).
pub(crate) async fn connect() -> Result<PgPool, CliError> {
    dotenvy::dotenv().ok();

    let database_url = std::env::var("DATABASE_URL")
        .map(SecretString::from)
        .map_err(|_| CliError::MissingEnvVar("DATABASE_URL"))?;

    tracing::info!("Connecting to database...");
    Ok(PgPool::connect(database_url.expose_secret()).await?)
}

/// Wire the workflow services to a Postgres pool.
pub(crate) fn services(pool: PgPool) -> Services {
    let repos = Repositories::from_backend(Arc::new(PgRepository::new(pool)));
    Services::new(&repos, ServiceSettings::default())
}
