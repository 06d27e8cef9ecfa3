//! Request handlers, one module per storefront service.

pub mod accounts;
pub mod admin;
pub mod cart;
pub mod catalog;
pub mod orders;
pub mod reviews;

use axum::{routing::{get, post}, Json, Router};

use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(|| async { Json(serde_json::json!({"status": "healthy", "service": "clothier"})) }))
        .route("/", get(catalog::home))
        .route("/search", get(catalog::search))
        .route("/product/:id", get(catalog::product_detail).post(reviews::submit_review))
        .route("/signup", post(accounts::signup))
        .route("/login", post(accounts::login))
        .route("/logout", post(accounts::logout))
        .route("/forgot-password", post(accounts::forgot_password))
        .route("/profile", get(accounts::profile))
        .route("/profile/edit", post(accounts::edit_profile))
        .route("/cart", get(cart::view_cart))
        .route("/cart/add/:product_id", post(cart::add_to_cart))
        .route("/cart/update/:cart_item_id", post(cart::update_cart))
        .route("/cart/remove/:cart_item_id", post(cart::remove_from_cart))
        .route("/checkout", get(orders::checkout_summary).post(orders::checkout))
        .route("/orders", get(orders::order_history))
        .route("/order/:id", get(orders::order_detail))
        .route("/order/:id/cancel", post(orders::cancel_order))
        .route("/order/:id/return", post(orders::request_return))
        .route("/admin/categories", get(admin::list_categories).post(admin::add_category))
        .route("/admin/categories/:id/update", post(admin::update_category))
        .route("/admin/categories/:id/delete", post(admin::delete_category))
        .route("/admin/products", get(admin::list_products).post(admin::add_product))
        .route("/admin/products/:id/update", post(admin::update_product))
        .route("/admin/products/:id/delete", post(admin::delete_product))
        .route("/admin/orders", get(admin::list_orders))
        .route("/admin/orders/:id/status", post(admin::update_order_status))
        .route("/admin/users", get(admin::list_users))
        .route("/admin/users/:id/promote", post(admin::promote_to_staff))
        .route("/admin/users/:id/delete", post(admin::delete_user))
}
