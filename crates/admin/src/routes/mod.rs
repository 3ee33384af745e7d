//! HTTP route handlers for admin.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                      - Liveness
//! GET  /health/ready                - Readiness (database)
//!
//! # Auth
//! POST /auth/login                  - Sign in (administrators only)
//! POST /auth/logout                 - Sign out
//!
//! # Dashboard
//! GET  /                            - Store counters
//! GET  /analytics                   - Profit over delivered orders
//!
//! # Categories
//! GET  /categories                  - List (?search=&status=)
//! POST /categories                  - Create
//! POST /categories/{key}            - Update
//! POST /categories/{key}/delete     - Soft delete
//! POST /categories/{key}/purge      - Hard delete
//!
//! # Products
//! GET  /products                    - List (?category=&search=&price=)
//! POST /products                    - Create
//! GET  /products/{key}              - Detail
//! POST /products/{key}              - Update
//! POST /products/{key}/delete       - Soft delete
//! POST /products/{key}/purge        - Hard delete
//!
//! # Orders
//! GET  /orders                      - List (?status=)
//! GET  /orders/{id}                 - Detail
//! POST /orders/{id}/status          - Change status
//! POST /orders/{id}/invoice         - Generate invoice into the session
//! GET  /invoice                     - Take the generated invoice (once)
//! ```

pub mod analytics;
pub mod auth;
pub mod categories;
pub mod dashboard;
pub mod health;
pub mod invoice;
pub mod orders;
pub mod products;

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

fn category_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(categories::index).post(categories::create))
        .route("/{key}", post(categories::update))
        .route("/{key}/delete", post(categories::soft_delete))
        .route("/{key}/purge", post(categories::purge))
}

fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index).post(products::create))
        .route("/{key}", get(products::show).post(products::update))
        .route("/{key}/delete", post(products::soft_delete))
        .route("/{key}/purge", post(products::purge))
}

fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(orders::index))
        .route("/{id}", get(orders::show))
        .route("/{id}/status", post(orders::update_status))
        .route("/{id}/invoice", post(orders::generate_invoice))
}

/// Create all routes for the admin API.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(dashboard::index))
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .route("/auth/login", post(auth::login))
        .route("/auth/logout", post(auth::logout))
        .route("/analytics", get(analytics::profit))
        .route("/invoice", get(invoice::show))
        .nest("/categories", category_routes())
        .nest("/products", product_routes())
        .nest("/orders", order_routes())
}
