//! ShopHub Core - Domain types and the order workflow.
//!
//! This crate provides everything shared by the ShopHub binaries:
//! - `storefront` - Customer-facing catalog, cart, and checkout
//! - `admin` - Category, product, and order fulfillment management
//! - `cli` - Migrations, admin accounts, and catalog seeding
//!
//! # Architecture
//!
//! Domain logic is pure and synchronous (catalog filtering, the cart state
//! machine, order snapshots, invoice projection). Persistence sits behind the
//! repository traits in [`repository`]; the async services in [`services`]
//! orchestrate repositories and domain rules. Two backends exist:
//! [`memory::MemoryRepository`] and, with the `postgres` feature,
//! `postgres::PgRepository`.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for ids, prices, emails, and statuses
//! - [`catalog`] - Categories, products, and the filtered catalog projection
//! - [`cart`] - Session-owned shopping cart
//! - [`order`] - Order snapshots and the status transition policy
//! - [`invoice`] - Invoice projection and profit reporting
//! - [`user`] - Accounts and the authenticated principal
//! - [`error`] - Repository and workflow error taxonomy
//! - [`repository`] - Persistence traits
//! - [`services`] - Allocator, catalog, order, account, and reporting services

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod catalog;
pub mod error;
pub mod invoice;
pub mod memory;
pub mod order;
pub mod repository;
pub mod services;
pub mod types;
pub mod user;

#[cfg(feature = "postgres")]
pub mod postgres;

pub use error::{RepositoryError, ValidationError, WorkflowError};
pub use types::*;
