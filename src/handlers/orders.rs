//! Checkout and the order lifecycle.

use axum::{extract::{Path, State}, http::{HeaderMap, StatusCode}, Json};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::auth;
use crate::domain::cart::{cart_total, ensure_not_empty, CartLine};
use crate::domain::events::{publish, StoreEvent};
use crate::domain::status::OrderStatus;
use crate::error::{Result, StoreError};
use crate::models::{Order, OrderItem};
use crate::AppState;

use super::cart::{cart_lines, get_or_create_cart};

#[derive(Debug, Serialize)]
pub struct CheckoutSummary {
    pub items: Vec<CartLine>,
    pub total_cost: rust_decimal::Decimal,
}

pub async fn checkout_summary(
    State(s): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<CheckoutSummary>> {
    let user = auth::require_user(&s, &headers).await?;
    let cart_id = get_or_create_cart(&s.db, user.id).await?;
    let items = cart_lines(&s.db, cart_id).await?;
    let total_cost = cart_total(&items);
    Ok(Json(CheckoutSummary { items, total_cost }))
}

#[derive(Debug, Deserialize, Validate)]
pub struct CheckoutRequest {
    #[validate(length(min = 1, message = "shipping address is required"))]
    pub shipping_address: String,
    #[validate(length(min = 1, message = "payment method is required"))]
    pub payment_method: String,
}

/// Converts the cart into an order. The read of the cart, the order and line
/// inserts, and the cart clear commit or roll back as one transaction, so a
/// concurrent cart edit can't produce a half-converted order.
pub async fn checkout(
    State(s): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<CheckoutRequest>,
) -> Result<(StatusCode, Json<Order>)> {
    let user = auth::require_user(&s, &headers).await?;
    req.validate().map_err(|e| StoreError::Validation(e.to_string()))?;

    let mut tx = s.db.begin().await?;
    let lines = sqlx::query_as::<_, CartLine>(
        "SELECT ci.id AS cart_item_id, ci.product_id, p.name AS product_name, \
                p.price AS unit_price, ci.quantity \
         FROM cart_items ci \
         JOIN carts c ON c.id = ci.cart_id \
         JOIN products p ON p.id = ci.product_id \
         WHERE c.user_id = $1",
    )
    .bind(user.id)
    .fetch_all(&mut *tx)
    .await?;
    ensure_not_empty(&lines)?;

    // Freeze the total now; later product price changes must not touch it.
    let total_cost = cart_total(&lines);
    let order = sqlx::query_as::<_, Order>(
        "INSERT INTO orders (id, user_id, ordered_date, shipping_address, payment_method, total_cost, status) \
         VALUES ($1, $2, NOW(), $3, $4, $5, 'ordered') RETURNING *",
    )
    .bind(Uuid::now_v7())
    .bind(user.id)
    .bind(&req.shipping_address)
    .bind(&req.payment_method)
    .bind(total_cost)
    .fetch_one(&mut *tx)
    .await?;

    for line in &lines {
        sqlx::query(
            "INSERT INTO order_items (id, order_id, product_id, product_name, unit_price, quantity) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(Uuid::now_v7())
        .bind(order.id)
        .bind(line.product_id)
        .bind(&line.product_name)
        .bind(line.unit_price)
        .bind(line.quantity)
        .execute(&mut *tx)
        .await?;
    }

    // Clear only the lines this order was built from; an item added to the
    // cart while the transaction was open stays in the cart.
    let ordered_ids: Vec<Uuid> = lines.iter().map(|l| l.cart_item_id).collect();
    sqlx::query("DELETE FROM cart_items WHERE id = ANY($1)")
        .bind(ordered_ids)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;

    publish(&s.nats, StoreEvent::OrderPlaced { order_id: order.id, user_id: user.id, total: total_cost }).await;
    tracing::info!(order_id = %order.id, total = %total_cost, "order placed");
    Ok((StatusCode::CREATED, Json(order)))
}

pub async fn order_history(State(s): State<AppState>, headers: HeaderMap) -> Result<Json<Vec<Order>>> {
    let user = auth::require_user(&s, &headers).await?;
    let orders = sqlx::query_as::<_, Order>(
        "SELECT * FROM orders WHERE user_id = $1 ORDER BY ordered_date DESC",
    )
    .bind(user.id)
    .fetch_all(&s.db)
    .await?;
    Ok(Json(orders))
}

#[derive(Debug, Serialize)]
pub struct OrderView {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItem>,
}

pub async fn order_detail(
    State(s): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<Json<OrderView>> {
    let user = auth::require_user(&s, &headers).await?;
    let order = fetch_own_order(&s, id, user.id).await?;
    let items = sqlx::query_as::<_, OrderItem>(
        "SELECT * FROM order_items WHERE order_id = $1 ORDER BY product_name",
    )
    .bind(id)
    .fetch_all(&s.db)
    .await?;
    Ok(Json(OrderView { order, items }))
}

pub async fn cancel_order(
    State(s): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<Json<Order>> {
    let user = auth::require_user(&s, &headers).await?;
    fetch_own_order(&s, id, user.id).await?;
    let order = transition(&s, id, user.id, OrderStatus::Cancelled, OrderStatus::CANCELLABLE)
        .await?
        .ok_or_else(|| StoreError::InvalidState("cannot cancel this order".to_string()))?;
    publish(&s.nats, StoreEvent::OrderCancelled { order_id: id, user_id: user.id }).await;
    Ok(Json(order))
}

pub async fn request_return(
    State(s): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<Json<Order>> {
    let user = auth::require_user(&s, &headers).await?;
    fetch_own_order(&s, id, user.id).await?;
    let order = transition(&s, id, user.id, OrderStatus::ReturnRequested, OrderStatus::RETURNABLE)
        .await?
        .ok_or_else(|| StoreError::InvalidState("cannot request a return for this order".to_string()))?;
    publish(&s.nats, StoreEvent::ReturnRequested { order_id: id, user_id: user.id }).await;
    Ok(Json(order))
}

/// Scoping the lookup to the owner makes someone else's order
/// indistinguishable from a missing one.
async fn fetch_own_order(state: &AppState, id: Uuid, user_id: Uuid) -> Result<Order> {
    sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(user_id)
        .fetch_optional(&state.db)
        .await?
        .ok_or(StoreError::NotFound("order"))
}

/// Customer-facing status change. The source-state guard lives in the UPDATE
/// predicate itself, so a status committed by anyone else after our read
/// (say, staff marking the order delivered) makes the write a no-op instead
/// of an illegal transition. `None` means the order was not in a legal
/// source state at write time.
async fn transition(
    state: &AppState,
    id: Uuid,
    user_id: Uuid,
    to: OrderStatus,
    from: &[OrderStatus],
) -> Result<Option<Order>> {
    let from: Vec<String> = from.iter().map(ToString::to_string).collect();
    let order = sqlx::query_as::<_, Order>(
        "UPDATE orders SET status = $3 \
         WHERE id = $1 AND user_id = $2 AND status = ANY($4) RETURNING *",
    )
    .bind(id)
    .bind(user_id)
    .bind(to.to_string())
    .bind(from)
    .fetch_optional(&state.db)
    .await?;
    Ok(order)
}

pub(super) async fn set_status(state: &AppState, id: Uuid, status: OrderStatus) -> Result<Order> {
    let order = sqlx::query_as::<_, Order>("UPDATE orders SET status = $2 WHERE id = $1 RETURNING *")
        .bind(id)
        .bind(status.to_string())
        .fetch_optional(&state.db)
        .await?
        .ok_or(StoreError::NotFound("order"))?;
    Ok(order)
}
