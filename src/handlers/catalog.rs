//! Catalog browsing, filtering, and search.

use axum::{extract::{Path, Query, State}, http::HeaderMap, Json};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth;
use crate::domain::filters::{like_pattern, ProductFilter};
use crate::error::{Result, StoreError};
use crate::models::{Product, Review};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct CatalogParams {
    pub category: Option<String>,
    pub color: Option<String>,
    pub size: Option<String>,
    pub price: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CatalogPage {
    pub products: Vec<Product>,
    /// Product ids already sitting in the caller's cart; empty when browsing
    /// logged out.
    pub in_cart: Vec<Uuid>,
}

pub async fn home(
    State(s): State<AppState>,
    headers: HeaderMap,
    Query(p): Query<CatalogParams>,
) -> Result<Json<CatalogPage>> {
    let filter = ProductFilter::from_query(p.category, p.color, p.size, p.price);
    let products = sqlx::query_as::<_, Product>(
        "SELECT p.* FROM products p JOIN categories c ON c.id = p.category_id \
         WHERE ($1::text IS NULL OR c.name = $1) \
           AND ($2::text IS NULL OR lower(p.color) = $2) \
           AND ($3::text IS NULL OR upper(p.size) = $3) \
           AND ($4::numeric IS NULL OR p.price >= $4) \
           AND ($5::numeric IS NULL OR p.price <= $5) \
         ORDER BY p.created_at DESC",
    )
    .bind(filter.category.as_deref())
    .bind(filter.color.as_deref())
    .bind(filter.size.as_deref())
    .bind(filter.price.map(|r| r.min))
    .bind(filter.price.map(|r| r.max))
    .fetch_all(&s.db)
    .await?;
    let in_cart = in_cart_product_ids(&s, &headers).await?;
    Ok(Json(CatalogPage { products, in_cart }))
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub q: Option<String>,
}

/// Case-insensitive substring match over product name, description, and
/// category name. No query means the full catalog.
pub async fn search(
    State(s): State<AppState>,
    Query(p): Query<SearchParams>,
) -> Result<Json<Vec<Product>>> {
    let pattern = p
        .q
        .filter(|q| !q.trim().is_empty())
        .map(|q| like_pattern(q.trim()));
    let products = sqlx::query_as::<_, Product>(
        "SELECT p.* FROM products p JOIN categories c ON c.id = p.category_id \
         WHERE $1::text IS NULL \
            OR p.name ILIKE $1 OR p.description ILIKE $1 OR c.name ILIKE $1 \
         ORDER BY p.created_at DESC",
    )
    .bind(pattern.as_deref())
    .fetch_all(&s.db)
    .await?;
    Ok(Json(products))
}

#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct ReviewView {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub review: Review,
    pub username: String,
}

#[derive(Debug, Serialize)]
pub struct ProductPage {
    pub product: Product,
    pub reviews: Vec<ReviewView>,
    pub in_cart: Vec<Uuid>,
}

pub async fn product_detail(
    State(s): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<Json<ProductPage>> {
    let product = sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = $1")
        .bind(id)
        .fetch_optional(&s.db)
        .await?
        .ok_or(StoreError::NotFound("product"))?;
    let reviews = sqlx::query_as::<_, ReviewView>(
        "SELECT r.*, u.username FROM reviews r JOIN users u ON u.id = r.user_id \
         WHERE r.product_id = $1 ORDER BY r.created_at DESC",
    )
    .bind(id)
    .fetch_all(&s.db)
    .await?;
    let in_cart = in_cart_product_ids(&s, &headers).await?;
    Ok(Json(ProductPage { product, reviews, in_cart }))
}

async fn in_cart_product_ids(state: &AppState, headers: &HeaderMap) -> Result<Vec<Uuid>> {
    let Some(user) = auth::current_user(state, headers).await? else {
        return Ok(Vec::new());
    };
    let ids = sqlx::query_scalar::<_, Uuid>(
        "SELECT ci.product_id FROM cart_items ci JOIN carts c ON c.id = ci.cart_id \
         WHERE c.user_id = $1",
    )
    .bind(user.id)
    .fetch_all(&state.db)
    .await?;
    Ok(ids)
}
