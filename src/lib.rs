//! Clothier
//!
//! Self-hosted clothing storefront service.
//!
//! ## Features
//! - Product catalog with attribute filters and substring search
//! - Per-user shopping cart with live-priced totals
//! - Checkout into orders with frozen totals and a status state machine
//! - Product reviews
//! - Account signup, login, and date-of-birth-verified password reset
//! - Staff panel for categories, products, orders, and users

pub mod auth;
pub mod domain;
pub mod error;
pub mod handlers;
pub mod models;

pub use error::{Result, StoreError};

#[derive(Clone)]
pub struct AppState {
    pub db: sqlx::PgPool,
    pub nats: Option<async_nats::Client>,
}
