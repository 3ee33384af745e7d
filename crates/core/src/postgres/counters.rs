use async_trait::async_trait;

use super::{DEADLOCK_DETECTED, PgRepository, SERIALIZATION_FAILURE, UNIQUE_VIOLATION, sqlstate};
use crate::error::RepositoryError;
use crate::repository::CounterRepository;

/// Serialization failures and a lost race on the first insert both mean
/// another writer got there first.
fn classify(sequence: &str, err: sqlx::Error) -> RepositoryError {
    match sqlstate(&err).as_deref() {
        Some(SERIALIZATION_FAILURE | DEADLOCK_DETECTED | UNIQUE_VIOLATION) => {
            RepositoryError::WriteConflict(sequence.to_owned())
        }
        _ => RepositoryError::Database(err),
    }
}

#[async_trait]
impl CounterRepository for PgRepository {
    async fn try_advance(&self, sequence: &str) -> Result<i64, RepositoryError> {
        let fail = |e: sqlx::Error| classify(sequence, e);

        let mut tx = self.pool.begin().await?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL SERIALIZABLE")
            .execute(&mut *tx)
            .await
            .map_err(fail)?;

        let current: Option<i64> =
            sqlx::query_scalar("SELECT last_value FROM counters WHERE name = $1")
                .bind(sequence)
                .fetch_optional(&mut *tx)
                .await
                .map_err(fail)?;

        let next = match current {
            None => {
                sqlx::query("INSERT INTO counters (name, last_value) VALUES ($1, 1)")
                    .bind(sequence)
                    .execute(&mut *tx)
                    .await
                    .map_err(fail)?;
                1
            }
            Some(last) => {
                let next = last + 1;
                sqlx::query("UPDATE counters SET last_value = $2 WHERE name = $1")
                    .bind(sequence)
                    .bind(next)
                    .execute(&mut *tx)
                    .await
                    .map_err(fail)?;
                next
            }
        };

        tx.commit().await.map_err(fail)?;
        Ok(next)
    }

    async fn last_value(&self, sequence: &str) -> Result<Option<i64>, RepositoryError> {
        let value = sqlx::query_scalar("SELECT last_value FROM counters WHERE name = $1")
            .bind(sequence)
            .fetch_optional(&self.pool)
            .await?;
        Ok(value)
    }
}
