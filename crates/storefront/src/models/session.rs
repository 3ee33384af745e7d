//! Session-related types.
//!
//! The signed-in [`shophub_core::user::Principal`] and the shopping [`Cart`] both live in the
//! server-side session. The cart is a flat JSON array of lines.

use shophub_core::cart::Cart;
use tower_sessions::Session;

/// Session keys for storefront data.
pub mod keys {
    /// Key for storing the signed-in principal.
    pub const CURRENT_USER: &str = "current_user";

    /// Key for the cart lines.
    pub const CART: &str = "cart";
}

/// Load the cart for this session, empty if none was saved yet.
///
/// # Errors
///
/// Returns an error if the session store cannot be read.
pub async fn load_cart(session: &Session) -> Result<Cart, tower_sessions::session::Error> {
    Ok(session.get::<Cart>(keys::CART).await?.unwrap_or_default())
}

/// Persist the cart back into the session.
///
/// # Errors
///
/// Returns an error if the session store cannot be written.
pub async fn save_cart(session: &Session, cart: &Cart) -> Result<(), tower_sessions::session::Error> {
    session.insert(keys::CART, cart).await
}
