//! Administrator account management.

use shophub_core::user::User;

use super::{CliError, connect, services};

/// Create an administrator account.
///
/// The id comes from the same allocator the storefront uses for customer
/// registration.
///
/// # Errors
///
/// Returns `Workflow(Duplicate)` when the email is taken, `Workflow(Validation)`
/// for a malformed email or short password, and database errors otherwise.
pub async fn create_user(email: &str, name: &str, password: &str) -> Result<User, CliError> {
    let pool = connect().await?;
    let services = services(pool);

    tracing::info!("Creating admin user: {}", email);
    let user = services
        .accounts
        .register_admin(name, email, password)
        .await?;

    tracing::info!(
        "Admin user created successfully! ID: {}, Email: {}",
        user.id,
        user.email
    );
    Ok(user)
}
