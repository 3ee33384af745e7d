//! HTTP route handlers for the storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                        - Newest products
//! GET  /health                  - Liveness
//! GET  /health/ready            - Readiness (database)
//!
//! # Catalog
//! GET  /products                - Listing (?category=&search=&price=)
//! GET  /products/{key}          - Product detail
//! POST /products/{key}/order    - Buy now (single-line order)
//! GET  /categories              - Visible categories
//!
//! # Cart (session)
//! GET  /cart                    - Cart contents and total
//! POST /cart/add                - Add one unit
//! POST /cart/update             - Set quantity (< 1 removes)
//! POST /cart/remove             - Remove a line
//! POST /cart/clear              - Empty the cart
//! GET  /cart/count              - Total units
//! POST /checkout                - Place an order from the cart
//!
//! # Auth
//! POST /auth/register           - Create an account and sign in
//! POST /auth/login              - Sign in
//! POST /auth/logout             - Sign out
//!
//! # Account (requires auth)
//! GET  /account                 - Profile
//! POST /account                 - Update profile
//! GET  /account/orders          - Order history
//! ```

pub mod account;
pub mod auth;
pub mod cart;
pub mod categories;
pub mod health;
pub mod home;
pub mod products;

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
}

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index))
        .route("/{key}", get(products::show))
        .route("/{key}/order", post(products::buy_now))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/add", post(cart::add))
        .route("/update", post(cart::update))
        .route("/remove", post(cart::remove))
        .route("/clear", post(cart::clear))
        .route("/count", get(cart::count))
}

/// Create the account routes router.
pub fn account_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(account::show).post(account::update))
        .route("/orders", get(account::orders))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home::home))
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .nest("/products", product_routes())
        .route("/categories", get(categories::index))
        .nest("/cart", cart_routes())
        .route("/checkout", post(cart::checkout))
        .nest("/auth", auth_routes())
        .nest("/account", account_routes())
}
