//! Sequential identifier allocation.
//!
//! Each attempt is one atomic read-modify-write on the counter row. A
//! conflicting concurrent writer aborts the whole attempt, which is then
//! retried from the read. With `N` concurrent callers an attempt only fails
//! when one of the other `N - 1` callers committed in between, so a budget
//! of at least `N` attempts always succeeds.

use std::sync::Arc;

use tracing::instrument;

use crate::error::{RepositoryError, WorkflowError};
use crate::repository::CounterRepository;

/// Sequence backing user account ids.
pub const USER_SEQUENCE: &str = "users";

/// Attempts made before giving up with `AllocationExhausted`.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 10;

/// Hands out unique, strictly increasing integers per named sequence.
#[derive(Clone)]
pub struct SequenceAllocator {
    counters: Arc<dyn CounterRepository>,
    max_attempts: u32,
}

impl SequenceAllocator {
    #[must_use]
    pub fn new(counters: Arc<dyn CounterRepository>) -> Self {
        Self {
            counters,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }

    /// Change the conflict budget. Values below 1 are raised to 1.
    #[must_use]
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    #[must_use]
    pub const fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Allocate the next value of `sequence`.
    ///
    /// # Errors
    ///
    /// - [`WorkflowError::AllocationExhausted`] when every attempt lost to a
    ///   concurrent writer.
    /// - [`WorkflowError::Repository`] for any other backend failure, which
    ///   is not retried.
    #[instrument(skip(self), fields(max_attempts = self.max_attempts))]
    pub async fn next(&self, sequence: &str) -> Result<i64, WorkflowError> {
        for attempt in 1..=self.max_attempts {
            match self.counters.try_advance(sequence).await {
                Ok(value) => {
                    tracing::debug!(sequence, attempt, value, "Allocated sequence value");
                    return Ok(value);
                }
                Err(RepositoryError::WriteConflict(_)) => {
                    tracing::debug!(sequence, attempt, "Allocation conflict, retrying");
                }
                Err(e) => return Err(e.into()),
            }
        }

        tracing::warn!(
            sequence,
            attempts = self.max_attempts,
            "Allocation retry budget exhausted"
        );
        Err(WorkflowError::AllocationExhausted {
            sequence: sequence.to_owned(),
            attempts: self.max_attempts,
        })
    }
}

impl std::fmt::Debug for SequenceAllocator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SequenceAllocator")
            .field("max_attempts", &self.max_attempts)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use async_trait::async_trait;

    use super::*;
    use crate::memory::MemoryRepository;

    /// Loses the first `losses` attempts, then delegates.
    struct Flaky {
        inner: MemoryRepository,
        losses: AtomicU32,
    }

    #[async_trait]
    impl CounterRepository for Flaky {
        async fn try_advance(&self, sequence: &str) -> Result<i64, RepositoryError> {
            if self
                .losses
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok()
            {
                return Err(RepositoryError::WriteConflict(sequence.to_owned()));
            }
            self.inner.try_advance(sequence).await
        }

        async fn last_value(&self, sequence: &str) -> Result<Option<i64>, RepositoryError> {
            self.inner.last_value(sequence).await
        }
    }

    fn flaky(losses: u32) -> Arc<Flaky> {
        Arc::new(Flaky {
            inner: MemoryRepository::new(),
            losses: AtomicU32::new(losses),
        })
    }

    #[tokio::test]
    async fn test_retries_through_conflicts() {
        let allocator = SequenceAllocator::new(flaky(3)).with_max_attempts(4);
        assert_eq!(allocator.next(USER_SEQUENCE).await.ok(), Some(1));
    }

    #[tokio::test]
    async fn test_exhaustion_reports_budget() {
        let allocator = SequenceAllocator::new(flaky(5)).with_max_attempts(5);
        let err = allocator.next(USER_SEQUENCE).await;
        assert!(matches!(
            err,
            Err(WorkflowError::AllocationExhausted { attempts: 5, .. })
        ));
    }

    #[tokio::test]
    async fn test_values_strictly_increase() {
        let allocator = SequenceAllocator::new(Arc::new(MemoryRepository::new()));
        let mut previous = 0;
        for _ in 0..5 {
            let value = allocator
                .next(USER_SEQUENCE)
                .await
                .unwrap_or_else(|e| panic!("allocation failed: {e}"));
            assert!(value > previous);
            previous = value;
        }
    }
}
