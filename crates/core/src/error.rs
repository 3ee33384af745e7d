//! Error taxonomy shared by repositories and workflow services.

use thiserror::Error;

use crate::types::OrderStatus;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[cfg(feature = "postgres")]
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// The backing store cannot serve requests (poisoned lock, lost connection).
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    /// Data in the store is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique email).
    #[error("constraint violation: {0}")]
    Conflict(String),

    /// A concurrent writer invalidated an optimistic read-modify-write.
    ///
    /// Only the sequence allocator produces and consumes this; it retries.
    #[error("write conflict on {0}")]
    WriteConflict(String),
}

/// Input rejected before anything is written.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field} is required")]
    MissingField { field: &'static str },

    #[error("an order needs at least one item")]
    EmptyOrder,

    #[error("quantity for {product} must be at least 1")]
    InvalidQuantity { product: String },

    #[error("{0}")]
    Invalid(String),
}

impl ValidationError {
    #[must_use]
    pub const fn missing(field: &'static str) -> Self {
        Self::MissingField { field }
    }
}

/// Errors surfaced by the workflow services.
#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// The allocator lost every attempt in its conflict budget.
    #[error("could not allocate from sequence {sequence} after {attempts} attempts")]
    AllocationExhausted { sequence: String, attempts: u32 },

    #[error("{0} not found")]
    NotFound(String),

    /// The configured transition policy does not allow this status change.
    #[error("order cannot move from {from} to {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("already exists: {0}")]
    Duplicate(String),

    #[error("invalid email or password")]
    InvalidCredentials,

    #[error("account is disabled")]
    AccountDisabled,

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl WorkflowError {
    pub(crate) fn not_found(what: impl std::fmt::Display) -> Self {
        Self::NotFound(what.to_string())
    }

    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Self::Validation(ValidationError::Invalid(message.into()))
    }

    /// Translate a repository miss into a named `NotFound`.
    pub(crate) fn from_lookup(err: RepositoryError, what: impl std::fmt::Display) -> Self {
        match err {
            RepositoryError::NotFound => Self::not_found(what),
            other => Self::Repository(other),
        }
    }
}
