//! Session-related types for admin.
//!
//! The admin session carries the signed-in principal and, between generating
//! and viewing it, one invoice.

use shophub_core::invoice::Invoice;
use tower_sessions::Session;

/// Session keys for admin data.
pub mod keys {
    /// Key for storing the signed-in administrator.
    pub const CURRENT_ADMIN: &str = "current_admin";

    /// Key for the most recently generated invoice.
    pub const INVOICE: &str = "invoice";
}

/// Hand an invoice to the next `GET /invoice`, replacing any earlier one.
///
/// # Errors
///
/// Returns an error if the session cannot be written.
pub async fn stash_invoice(
    session: &Session,
    invoice: &Invoice,
) -> Result<(), tower_sessions::session::Error> {
    session.insert(keys::INVOICE, invoice).await
}

/// Read and remove the pending invoice. A second call returns `None`.
///
/// # Errors
///
/// Returns an error if the session cannot be read or written.
pub async fn take_invoice(
    session: &Session,
) -> Result<Option<Invoice>, tower_sessions::session::Error> {
    session.remove::<Invoice>(keys::INVOICE).await
}
