//! Account registration, sign-in, and profile edits.

use std::sync::Arc;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::Utc;
use tracing::instrument;

use crate::error::{RepositoryError, ValidationError, WorkflowError};
use crate::repository::{Repositories, UserRepository};
use crate::services::allocator::{SequenceAllocator, USER_SEQUENCE};
use crate::types::{Email, UserId, UserRole};
use crate::user::{Principal, Profile, ProfileUpdate, Registration, User};

/// Minimum password length.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Account lifecycle over the user repository and the id allocator.
#[derive(Clone)]
pub struct AccountService {
    users: Arc<dyn UserRepository>,
    allocator: SequenceAllocator,
}

impl AccountService {
    #[must_use]
    pub fn new(repos: &Repositories, allocator: SequenceAllocator) -> Self {
        Self {
            users: Arc::clone(&repos.users),
            allocator,
        }
    }

    /// Register a customer account.
    ///
    /// The id comes from the `users` sequence and doubles as the storage key.
    /// If allocation fails nothing is written.
    ///
    /// # Errors
    ///
    /// - `Validation` for blank fields, a malformed email, or a short password.
    /// - `Duplicate` if the email is already registered.
    /// - `AllocationExhausted` if the allocator gave up.
    #[instrument(skip(self, registration), fields(email = %registration.email))]
    pub async fn register(&self, registration: Registration) -> Result<User, WorkflowError> {
        let name = required(&registration.name, "name")?;
        let phone = required(&registration.phone, "phone")?;
        let address = required(&registration.address, "address")?;
        self.create(
            NewAccount {
                name,
                email: &registration.email,
                password: &registration.password,
                phone,
                address,
            },
            UserRole::User,
        )
        .await
    }

    /// Create an administrator account (used by the CLI).
    ///
    /// # Errors
    ///
    /// Same as [`Self::register`].
    #[instrument(skip(self, password))]
    pub async fn register_admin(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<User, WorkflowError> {
        let name = required(name, "name")?;
        self.create(
            NewAccount {
                name,
                email,
                password,
                phone: String::new(),
                address: String::new(),
            },
            UserRole::Admin,
        )
        .await
    }

    async fn create(&self, account: NewAccount<'_>, role: UserRole) -> Result<User, WorkflowError> {
        let email = Email::parse(account.email)
            .map_err(|e| WorkflowError::invalid(format!("invalid email: {e}")))?;
        validate_password(account.password)?;

        if self.users.find_user_by_email(&email).await?.is_some() {
            return Err(WorkflowError::Duplicate("email already registered".to_owned()));
        }

        let password_hash = hash_password(account.password)?;
        let id = UserId::new(self.allocator.next(USER_SEQUENCE).await?);

        let now = Utc::now();
        let user = User {
            id,
            name: account.name,
            email,
            password_hash,
            role,
            phone: account.phone,
            address: account.address,
            image_url: None,
            active: true,
            deleted: false,
            created_at: now,
            updated_at: now,
        };

        self.users.insert_user(&user).await.map_err(|e| match e {
            RepositoryError::Conflict(what) => WorkflowError::Duplicate(what),
            other => WorkflowError::Repository(other),
        })?;

        tracing::info!(user_id = %user.id, role = %user.role, "Account created");
        Ok(user)
    }

    /// Check credentials and return the account.
    ///
    /// # Errors
    ///
    /// - `InvalidCredentials` for an unknown email or wrong password.
    /// - `AccountDisabled` for inactive or deleted accounts.
    #[instrument(skip(self, password))]
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<User, WorkflowError> {
        let email = Email::parse(email).map_err(|_| WorkflowError::InvalidCredentials)?;
        let user = self
            .users
            .find_user_by_email(&email)
            .await?
            .ok_or(WorkflowError::InvalidCredentials)?;

        verify_password(password, &user.password_hash)?;

        if !user.can_sign_in() {
            tracing::warn!(user_id = %user.id, "Sign-in attempt on disabled account");
            return Err(WorkflowError::AccountDisabled);
        }
        Ok(user)
    }

    /// Profile of the signed-in account.
    ///
    /// # Errors
    ///
    /// `NotFound` if the account vanished since sign-in.
    pub async fn profile(&self, principal: &Principal) -> Result<Profile, WorkflowError> {
        let user = self
            .users
            .get_user(principal.user_id)
            .await
            .map_err(|e| WorkflowError::from_lookup(e, format_args!("user {}", principal.user_id)))?;
        Ok(user.profile())
    }

    /// Edit name, phone, address, and image of the signed-in account.
    ///
    /// # Errors
    ///
    /// `Validation` for a blank name, `NotFound` for a vanished account.
    #[instrument(skip(self, principal, update), fields(user_id = %principal.user_id))]
    pub async fn update_profile(
        &self,
        principal: &Principal,
        update: ProfileUpdate,
    ) -> Result<Profile, WorkflowError> {
        let update = update.normalized()?;
        let user = self
            .users
            .update_user_profile(principal.user_id, &update, Utc::now())
            .await
            .map_err(|e| WorkflowError::from_lookup(e, format_args!("user {}", principal.user_id)))?;
        Ok(user.profile())
    }
}

impl std::fmt::Debug for AccountService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccountService")
            .field("allocator", &self.allocator)
            .finish_non_exhaustive()
    }
}

struct NewAccount<'a> {
    name: String,
    email: &'a str,
    password: &'a str,
    phone: String,
    address: String,
}

fn required(value: &str, field: &'static str) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(ValidationError::missing(field))
    } else {
        Ok(trimmed.to_owned())
    }
}

fn validate_password(password: &str) -> Result<(), ValidationError> {
    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(ValidationError::Invalid(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    Ok(())
}

/// Hash a password using Argon2id.
fn hash_password(password: &str) -> Result<String, WorkflowError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| {
            WorkflowError::Repository(RepositoryError::Unavailable(format!(
                "password hashing failed: {e}"
            )))
        })
}

/// Verify a password against a stored hash.
fn verify_password(password: &str, hash: &str) -> Result<(), WorkflowError> {
    let parsed = PasswordHash::new(hash).map_err(|_| WorkflowError::InvalidCredentials)?;
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .map_err(|_| WorkflowError::InvalidCredentials)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryRepository;

    fn service() -> AccountService {
        let repos = Repositories::from_backend(Arc::new(MemoryRepository::new()));
        let allocator = SequenceAllocator::new(Arc::clone(&repos.counters));
        AccountService::new(&repos, allocator)
    }

    fn registration(email: &str) -> Registration {
        Registration {
            name: "Dana".to_owned(),
            email: email.to_owned(),
            password: "correct horse".to_owned(),
            phone: "555".to_owned(),
            address: "2 Side St".to_owned(),
        }
    }

    #[tokio::test]
    async fn test_register_assigns_sequential_ids() {
        let accounts = service();
        let first = accounts.register(registration("a@shop.example")).await;
        let second = accounts.register(registration("b@shop.example")).await;
        assert_eq!(first.map(|u| u.id.as_i64()).ok(), Some(1));
        assert_eq!(second.map(|u| u.id.as_i64()).ok(), Some(2));
    }

    #[tokio::test]
    async fn test_register_validation() {
        let accounts = service();

        let mut blank_phone = registration("a@shop.example");
        blank_phone.phone = " ".to_owned();
        assert!(matches!(
            accounts.register(blank_phone).await,
            Err(WorkflowError::Validation(ValidationError::MissingField { field: "phone" }))
        ));

        let mut short = registration("a@shop.example");
        short.password = "short".to_owned();
        assert!(matches!(
            accounts.register(short).await,
            Err(WorkflowError::Validation(_))
        ));

        accounts
            .register(registration("a@shop.example"))
            .await
            .unwrap_or_else(|e| panic!("{e}"));
        assert!(matches!(
            accounts.register(registration("A@Shop.Example")).await,
            Err(WorkflowError::Duplicate(_))
        ));
    }

    #[tokio::test]
    async fn test_authenticate() {
        let accounts = service();
        accounts
            .register(registration("a@shop.example"))
            .await
            .unwrap_or_else(|e| panic!("{e}"));

        let user = accounts.authenticate("a@shop.example", "correct horse").await;
        assert_eq!(user.map(|u| u.role).ok(), Some(UserRole::User));

        assert!(matches!(
            accounts.authenticate("a@shop.example", "wrong horse").await,
            Err(WorkflowError::InvalidCredentials)
        ));
        assert!(matches!(
            accounts.authenticate("nobody@shop.example", "correct horse").await,
            Err(WorkflowError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn test_update_profile() {
        let accounts = service();
        let user = accounts
            .register(registration("a@shop.example"))
            .await
            .unwrap_or_else(|e| panic!("{e}"));

        let profile = accounts
            .update_profile(
                &user.principal(),
                ProfileUpdate {
                    name: "Dana Q".to_owned(),
                    phone: "777".to_owned(),
                    address: "3 Hill Rd".to_owned(),
                    image_url: Some("https://cdn.example/dana.png".to_owned()),
                },
            )
            .await
            .unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(profile.name, "Dana Q");
        assert_eq!(profile.image_url.as_deref(), Some("https://cdn.example/dana.png"));
    }
}
