//! Staff-only management of categories, products, orders, and users.
//!
//! Every handler authorizes explicitly via `require_staff` before touching
//! the store; missing form fields are rejected with validation errors rather
//! than silently skipped.

use std::str::FromStr;

use axum::{extract::{Path, State}, http::{HeaderMap, StatusCode}, Json};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::auth;
use crate::domain::events::{publish, StoreEvent};
use crate::domain::status::OrderStatus;
use crate::error::{Result, StoreError};
use crate::models::{Category, Order, Product, User};
use crate::AppState;

// ---------------------------------------------------------------------------
// Categories
// ---------------------------------------------------------------------------

pub async fn list_categories(State(s): State<AppState>, headers: HeaderMap) -> Result<Json<Vec<Category>>> {
    auth::require_staff(&s, &headers).await?;
    let categories = sqlx::query_as::<_, Category>("SELECT * FROM categories ORDER BY name")
        .fetch_all(&s.db)
        .await?;
    Ok(Json(categories))
}

#[derive(Debug, Deserialize, Validate)]
pub struct CategoryRequest {
    #[validate(length(min = 1, message = "category name is required"))]
    pub name: String,
}

pub async fn add_category(
    State(s): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<CategoryRequest>,
) -> Result<(StatusCode, Json<Category>)> {
    auth::require_staff(&s, &headers).await?;
    req.validate().map_err(|e| StoreError::Validation(e.to_string()))?;
    let category = sqlx::query_as::<_, Category>(
        "INSERT INTO categories (id, name) VALUES ($1, $2) RETURNING *",
    )
    .bind(Uuid::now_v7())
    .bind(&req.name)
    .fetch_one(&s.db)
    .await?;
    Ok((StatusCode::CREATED, Json(category)))
}

pub async fn update_category(
    State(s): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    Json(req): Json<CategoryRequest>,
) -> Result<Json<Category>> {
    auth::require_staff(&s, &headers).await?;
    req.validate().map_err(|e| StoreError::Validation(e.to_string()))?;
    let category = sqlx::query_as::<_, Category>(
        "UPDATE categories SET name = $2 WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(&req.name)
    .fetch_optional(&s.db)
    .await?
    .ok_or(StoreError::NotFound("category"))?;
    Ok(Json(category))
}

/// Deleting a category cascades to its products; order history survives via
/// the snapshots in order_items.
pub async fn delete_category(
    State(s): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<StatusCode> {
    auth::require_staff(&s, &headers).await?;
    let result = sqlx::query("DELETE FROM categories WHERE id = $1").bind(id).execute(&s.db).await?;
    if result.rows_affected() == 0 {
        return Err(StoreError::NotFound("category"));
    }
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Products
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct ManageProductsPage {
    pub products: Vec<Product>,
    pub categories: Vec<Category>,
}

pub async fn list_products(State(s): State<AppState>, headers: HeaderMap) -> Result<Json<ManageProductsPage>> {
    auth::require_staff(&s, &headers).await?;
    let products = sqlx::query_as::<_, Product>("SELECT * FROM products ORDER BY created_at DESC")
        .fetch_all(&s.db)
        .await?;
    let categories = sqlx::query_as::<_, Category>("SELECT * FROM categories ORDER BY name")
        .fetch_all(&s.db)
        .await?;
    Ok(Json(ManageProductsPage { products, categories }))
}

#[derive(Debug, Deserialize, Validate)]
pub struct ProductRequest {
    #[validate(length(min = 1, message = "name is required"))]
    pub name: String,
    #[validate(length(min = 1, message = "description is required"))]
    pub description: String,
    /// Reference into the blob store; optional on update (keeps the current
    /// image), required on create.
    pub image: Option<String>,
    pub category_id: Uuid,
    #[validate(length(min = 1, max = 1, message = "size must be a single character"))]
    pub size: String,
    #[validate(length(min = 1, message = "color is required"))]
    pub color: String,
    pub price: Decimal,
}

impl ProductRequest {
    fn check(&self) -> Result<()> {
        self.validate().map_err(|e| StoreError::Validation(e.to_string()))?;
        if self.price < Decimal::ZERO {
            return Err(StoreError::Validation("price must not be negative".to_string()));
        }
        Ok(())
    }
}

async fn ensure_category(state: &AppState, id: Uuid) -> Result<()> {
    let exists = sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM categories WHERE id = $1)")
        .bind(id)
        .fetch_one(&state.db)
        .await?;
    if !exists {
        return Err(StoreError::NotFound("category"));
    }
    Ok(())
}

pub async fn add_product(
    State(s): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<ProductRequest>,
) -> Result<(StatusCode, Json<Product>)> {
    auth::require_staff(&s, &headers).await?;
    req.check()?;
    let image = req
        .image
        .as_deref()
        .filter(|i| !i.is_empty())
        .ok_or_else(|| StoreError::Validation("image is required".to_string()))?;
    ensure_category(&s, req.category_id).await?;
    let product = sqlx::query_as::<_, Product>(
        "INSERT INTO products (id, name, description, image, category_id, size, color, price, created_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, NOW()) RETURNING *",
    )
    .bind(Uuid::now_v7())
    .bind(&req.name)
    .bind(&req.description)
    .bind(image)
    .bind(req.category_id)
    .bind(req.size.to_uppercase())
    .bind(&req.color)
    .bind(req.price)
    .fetch_one(&s.db)
    .await?;
    Ok((StatusCode::CREATED, Json(product)))
}

pub async fn update_product(
    State(s): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    Json(req): Json<ProductRequest>,
) -> Result<Json<Product>> {
    auth::require_staff(&s, &headers).await?;
    req.check()?;
    ensure_category(&s, req.category_id).await?;
    let product = sqlx::query_as::<_, Product>(
        "UPDATE products SET name = $2, description = $3, image = COALESCE($4, image), \
                category_id = $5, size = $6, color = $7, price = $8 \
         WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(&req.name)
    .bind(&req.description)
    .bind(req.image.as_deref().filter(|i| !i.is_empty()))
    .bind(req.category_id)
    .bind(req.size.to_uppercase())
    .bind(&req.color)
    .bind(req.price)
    .fetch_optional(&s.db)
    .await?
    .ok_or(StoreError::NotFound("product"))?;
    Ok(Json(product))
}

pub async fn delete_product(
    State(s): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<StatusCode> {
    auth::require_staff(&s, &headers).await?;
    let result = sqlx::query("DELETE FROM products WHERE id = $1").bind(id).execute(&s.db).await?;
    if result.rows_affected() == 0 {
        return Err(StoreError::NotFound("product"));
    }
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Orders
// ---------------------------------------------------------------------------

pub async fn list_orders(State(s): State<AppState>, headers: HeaderMap) -> Result<Json<Vec<Order>>> {
    auth::require_staff(&s, &headers).await?;
    let orders = sqlx::query_as::<_, Order>("SELECT * FROM orders ORDER BY ordered_date DESC")
        .fetch_all(&s.db)
        .await?;
    Ok(Json(orders))
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: String,
}

/// Privileged override: staff may force any enumerated status with no
/// transition or ownership restriction.
pub async fn update_order_status(
    State(s): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateStatusRequest>,
) -> Result<Json<Order>> {
    auth::require_staff(&s, &headers).await?;
    let status = OrderStatus::from_str(&req.status)
        .map_err(|_| StoreError::Validation(format!("unknown status '{}'", req.status)))?;
    let order = super::orders::set_status(&s, id, status).await?;
    publish(&s.nats, StoreEvent::StatusChanged { order_id: id, status }).await;
    tracing::info!(order_id = %id, status = %status, "order status updated");
    Ok(Json(order))
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

pub async fn list_users(State(s): State<AppState>, headers: HeaderMap) -> Result<Json<Vec<User>>> {
    auth::require_staff(&s, &headers).await?;
    let users = sqlx::query_as::<_, User>("SELECT * FROM users ORDER BY username")
        .fetch_all(&s.db)
        .await?;
    Ok(Json(users))
}

pub async fn promote_to_staff(
    State(s): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<Json<User>> {
    auth::require_staff(&s, &headers).await?;
    let user = sqlx::query_as::<_, User>("UPDATE users SET is_staff = TRUE WHERE id = $1 RETURNING *")
        .bind(id)
        .fetch_optional(&s.db)
        .await?
        .ok_or(StoreError::NotFound("user"))?;
    Ok(Json(user))
}

/// Removes the user and, by cascade, their cart, sessions, orders, and
/// reviews.
pub async fn delete_user(
    State(s): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<StatusCode> {
    auth::require_staff(&s, &headers).await?;
    let result = sqlx::query("DELETE FROM users WHERE id = $1").bind(id).execute(&s.db).await?;
    if result.rows_affected() == 0 {
        return Err(StoreError::NotFound("user"));
    }
    Ok(StatusCode::NO_CONTENT)
}
