//! Database migration command.
//!
//! Migration files live in `crates/core/migrations/` and are embedded at
//! compile time.

use super::{CliError, connect};

/// Apply all pending migrations.
///
/// # Errors
///
/// Returns an error if `DATABASE_URL` is missing, the connection fails, or a
/// migration does not apply.
pub async fn run() -> Result<(), CliError> {
    let pool = connect().await?;

    tracing::info!("Running migrations...");
    sqlx::migrate!("../core/migrations").run(&pool).await?;

    tracing::info!("Migrations complete!");
    Ok(())
}
