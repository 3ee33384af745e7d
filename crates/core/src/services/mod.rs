//! Async services orchestrating repositories and domain rules.
//!
//! Every admin-only operation takes the caller's [`crate::user::Principal`]
//! and checks it before reading or writing anything.

pub mod accounts;
pub mod allocator;
pub mod catalog;
pub mod orders;
pub mod reports;

pub use accounts::AccountService;
pub use allocator::{DEFAULT_MAX_ATTEMPTS, SequenceAllocator, USER_SEQUENCE};
pub use catalog::CatalogService;
pub use orders::OrderWorkflow;
pub use reports::ReportService;

use crate::order::TransitionPolicy;
use crate::repository::Repositories;

/// Tunables for [`Services::new`].
#[derive(Debug, Clone, Copy)]
pub struct ServiceSettings {
    pub allocator_max_attempts: u32,
    pub transition_policy: TransitionPolicy,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            allocator_max_attempts: DEFAULT_MAX_ATTEMPTS,
            transition_policy: TransitionPolicy::default(),
        }
    }
}

/// Every service wired to one set of repositories.
#[derive(Debug, Clone)]
pub struct Services {
    pub catalog: CatalogService,
    pub orders: OrderWorkflow,
    pub accounts: AccountService,
    pub reports: ReportService,
}

impl Services {
    #[must_use]
    pub fn new(repos: &Repositories, settings: ServiceSettings) -> Self {
        let allocator = SequenceAllocator::new(std::sync::Arc::clone(&repos.counters))
            .with_max_attempts(settings.allocator_max_attempts);
        Self {
            catalog: CatalogService::new(repos),
            orders: OrderWorkflow::new(repos).with_policy(settings.transition_policy),
            accounts: AccountService::new(repos, allocator),
            reports: ReportService::new(repos),
        }
    }
}
