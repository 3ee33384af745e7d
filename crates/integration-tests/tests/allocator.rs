//! Sequential id allocation under contention.

use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;
use shophub_core::WorkflowError;
use shophub_core::memory::MemoryRepository;
use shophub_core::repository::{CounterRepository, Repositories, UserRepository};
use shophub_core::services::{SequenceAllocator, ServiceSettings, Services, USER_SEQUENCE};
use shophub_core::user::Registration;
use shophub_core::{Email, RepositoryError};
use shophub_integration_tests::{TEST_PASSWORD, TestContext};
use tokio::task::JoinSet;

fn registration(n: usize) -> Registration {
    Registration {
        name: format!("Customer {n}"),
        email: format!("customer{n}@shophub.test"),
        password: TEST_PASSWORD.to_owned(),
        phone: "555".to_owned(),
        address: "1 Main St".to_owned(),
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_allocations_form_contiguous_run() {
    const CALLERS: u32 = 16;

    let repo = Arc::new(MemoryRepository::new());
    let allocator = SequenceAllocator::new(repo.clone()).with_max_attempts(CALLERS);

    for _ in 0..5 {
        allocator.next(USER_SEQUENCE).await.expect("warm-up allocation");
    }
    let prior = repo
        .last_value(USER_SEQUENCE)
        .await
        .expect("read counter")
        .expect("counter exists");

    let mut tasks = JoinSet::new();
    for _ in 0..CALLERS {
        let allocator = allocator.clone();
        tasks.spawn(async move { allocator.next(USER_SEQUENCE).await });
    }

    let mut values = BTreeSet::new();
    while let Some(joined) = tasks.join_next().await {
        let value = joined.expect("task panicked").expect("allocation failed");
        assert!(values.insert(value), "duplicate value {value}");
    }

    let expected: BTreeSet<i64> = (prior + 1..=prior + i64::from(CALLERS)).collect();
    assert_eq!(values, expected);
}

#[tokio::test]
async fn test_values_never_repeat_after_restart() {
    let repo = Arc::new(MemoryRepository::new());

    let first = SequenceAllocator::new(repo.clone());
    let mut last = 0;
    for _ in 0..3 {
        last = first.next(USER_SEQUENCE).await.expect("allocation failed");
    }

    // A fresh allocator over the same store stands in for a process restart.
    let second = SequenceAllocator::new(repo);
    for _ in 0..3 {
        let value = second.next(USER_SEQUENCE).await.expect("allocation failed");
        assert!(value > last);
        last = value;
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_registrations_get_distinct_ids() {
    let ctx = TestContext::with_settings(ServiceSettings {
        allocator_max_attempts: 32,
        ..ServiceSettings::default()
    })
    .await;

    let mut tasks = JoinSet::new();
    for n in 0..12 {
        let accounts = ctx.services.accounts.clone();
        tasks.spawn(async move { accounts.register(registration(n)).await });
    }

    let mut ids = BTreeSet::new();
    while let Some(joined) = tasks.join_next().await {
        let user = joined.expect("task panicked").expect("registration failed");
        assert!(ids.insert(user.id.as_i64()));
    }
    assert_eq!(ids.len(), 12);
    assert!(!ids.contains(&ctx.admin.user_id.as_i64()));
}

/// Counter store where every write loses to a phantom concurrent writer.
struct AlwaysContended;

#[async_trait]
impl CounterRepository for AlwaysContended {
    async fn try_advance(&self, sequence: &str) -> Result<i64, RepositoryError> {
        Err(RepositoryError::WriteConflict(sequence.to_owned()))
    }

    async fn last_value(&self, _sequence: &str) -> Result<Option<i64>, RepositoryError> {
        Ok(None)
    }
}

#[tokio::test]
async fn test_exhausted_allocation_writes_no_user() {
    let repo = Arc::new(MemoryRepository::new());
    let repos = Repositories {
        counters: Arc::new(AlwaysContended),
        ..Repositories::from_backend(repo.clone())
    };
    let services = Services::new(
        &repos,
        ServiceSettings {
            allocator_max_attempts: 3,
            ..ServiceSettings::default()
        },
    );

    let result = services.accounts.register(registration(1)).await;
    assert!(matches!(
        result,
        Err(WorkflowError::AllocationExhausted { attempts: 3, .. })
    ));

    let email = Email::parse("customer1@shophub.test").expect("valid email");
    let stored = repo.find_user_by_email(&email).await.expect("lookup failed");
    assert!(stored.is_none());
}
