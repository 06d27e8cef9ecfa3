//! Shopping cart operations.

use axum::{extract::{Path, State}, http::{HeaderMap, StatusCode}, Json};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth;
use crate::domain::cart::{cart_total, CartLine};
use crate::error::{Result, StoreError};
use crate::models::CartItem;
use crate::AppState;

/// Provisions the user's cart on first access. Safe under concurrent calls:
/// the unique owner constraint makes the insert a no-op for the loser.
pub async fn get_or_create_cart(db: &PgPool, user_id: Uuid) -> Result<Uuid> {
    sqlx::query("INSERT INTO carts (id, user_id) VALUES ($1, $2) ON CONFLICT (user_id) DO NOTHING")
        .bind(Uuid::now_v7())
        .bind(user_id)
        .execute(db)
        .await?;
    let id = sqlx::query_scalar::<_, Uuid>("SELECT id FROM carts WHERE user_id = $1")
        .bind(user_id)
        .fetch_one(db)
        .await?;
    Ok(id)
}

pub async fn cart_lines(db: &PgPool, cart_id: Uuid) -> Result<Vec<CartLine>> {
    let lines = sqlx::query_as::<_, CartLine>(
        "SELECT ci.id AS cart_item_id, ci.product_id, p.name AS product_name, \
                p.price AS unit_price, ci.quantity \
         FROM cart_items ci JOIN products p ON p.id = ci.product_id \
         WHERE ci.cart_id = $1 ORDER BY p.name",
    )
    .bind(cart_id)
    .fetch_all(db)
    .await?;
    Ok(lines)
}

#[derive(Debug, Serialize)]
pub struct CartView {
    pub items: Vec<CartLine>,
    pub total_cost: Decimal,
}

pub async fn view_cart(State(s): State<AppState>, headers: HeaderMap) -> Result<Json<CartView>> {
    let user = auth::require_user(&s, &headers).await?;
    let cart_id = get_or_create_cart(&s.db, user.id).await?;
    let items = cart_lines(&s.db, cart_id).await?;
    let total_cost = cart_total(&items);
    Ok(Json(CartView { items, total_cost }))
}

/// Adds one unit of the product, merging into an existing line if present.
/// The upsert rides on the (cart, product) unique constraint, so two
/// concurrent adds end up as a single line with quantity 2.
pub async fn add_to_cart(
    State(s): State<AppState>,
    headers: HeaderMap,
    Path(product_id): Path<Uuid>,
) -> Result<(StatusCode, Json<CartItem>)> {
    let user = auth::require_user(&s, &headers).await?;
    let exists = sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM products WHERE id = $1)")
        .bind(product_id)
        .fetch_one(&s.db)
        .await?;
    if !exists {
        return Err(StoreError::NotFound("product"));
    }
    let cart_id = get_or_create_cart(&s.db, user.id).await?;
    let item = sqlx::query_as::<_, CartItem>(
        "INSERT INTO cart_items (id, cart_id, product_id, quantity) VALUES ($1, $2, $3, 1) \
         ON CONFLICT (cart_id, product_id) DO UPDATE SET quantity = cart_items.quantity + 1 \
         RETURNING *",
    )
    .bind(Uuid::now_v7())
    .bind(cart_id)
    .bind(product_id)
    .fetch_one(&s.db)
    .await?;
    Ok((StatusCode::CREATED, Json(item)))
}

#[derive(Debug, Deserialize, Default)]
pub struct UpdateCartRequest {
    pub quantity: Option<i32>,
}

/// Sets a line's quantity from the quantity-input UI. Missing, non-numeric,
/// or non-positive input leaves the line untouched.
pub async fn update_cart(
    State(s): State<AppState>,
    headers: HeaderMap,
    Path(cart_item_id): Path<Uuid>,
    body: Option<Json<UpdateCartRequest>>,
) -> Result<Json<CartItem>> {
    let user = auth::require_user(&s, &headers).await?;
    let item = sqlx::query_as::<_, CartItem>(
        "SELECT ci.* FROM cart_items ci JOIN carts c ON c.id = ci.cart_id \
         WHERE ci.id = $1 AND c.user_id = $2",
    )
    .bind(cart_item_id)
    .bind(user.id)
    .fetch_optional(&s.db)
    .await?
    .ok_or(StoreError::NotFound("cart item"))?;

    let Some(quantity) = body.and_then(|Json(req)| req.quantity).filter(|q| *q >= 1) else {
        return Ok(Json(item));
    };
    let item = sqlx::query_as::<_, CartItem>(
        "UPDATE cart_items SET quantity = $2 WHERE id = $1 RETURNING *",
    )
    .bind(cart_item_id)
    .bind(quantity)
    .fetch_one(&s.db)
    .await?;
    Ok(Json(item))
}

/// Removes a line; removing an already-gone line is treated as success.
pub async fn remove_from_cart(
    State(s): State<AppState>,
    headers: HeaderMap,
    Path(cart_item_id): Path<Uuid>,
) -> Result<StatusCode> {
    let user = auth::require_user(&s, &headers).await?;
    sqlx::query(
        "DELETE FROM cart_items ci USING carts c \
         WHERE ci.id = $1 AND ci.cart_id = c.id AND c.user_id = $2",
    )
    .bind(cart_item_id)
    .bind(user.id)
    .execute(&s.db)
    .await?;
    Ok(StatusCode::NO_CONTENT)
}
