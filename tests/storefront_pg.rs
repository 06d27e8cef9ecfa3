//! Postgres-backed lifecycle tests.
//!
//! Ignored by default since they need a live database. Point `DATABASE_URL`
//! at a scratch Postgres and run:
//!
//! ```text
//! DATABASE_URL=postgres://localhost/clothier_test cargo test -- --ignored
//! ```
//!
//! Tests only create uniquely-keyed rows and scope every assertion to them,
//! so they are safe to run in parallel and do not wipe the database.

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use clothier::{auth, handlers, AppState};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::{json, Value};
use sqlx::PgPool;
use tower::ServiceExt;
use uuid::Uuid;

async fn setup() -> (Router, PgPool) {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must point at a scratch database");
    let db = PgPool::connect(&url).await.expect("connect");
    sqlx::migrate!("./migrations").run(&db).await.expect("migrate");
    let state = AppState { db: db.clone(), nats: None };
    (handlers::router().with_state(state), db)
}

async fn seed_user(db: &PgPool) -> (Uuid, Uuid) {
    let id = Uuid::now_v7();
    let username = format!("shopper-{id}");
    sqlx::query("INSERT INTO users (id, username, password_hash, email) VALUES ($1, $2, $3, $4)")
        .bind(id)
        .bind(&username)
        .bind(auth::hash_password("pass12345").unwrap())
        .bind(format!("{username}@example.com"))
        .execute(db)
        .await
        .unwrap();
    let token = auth::create_session(db, id).await.unwrap();
    (id, token)
}

async fn seed_product(db: &PgPool, name: &str, price: Decimal) -> Uuid {
    let category_id = Uuid::now_v7();
    sqlx::query("INSERT INTO categories (id, name) VALUES ($1, $2)")
        .bind(category_id)
        .bind(format!("cat-{category_id}"))
        .execute(db)
        .await
        .unwrap();
    let id = Uuid::now_v7();
    sqlx::query(
        "INSERT INTO products (id, name, description, image, category_id, size, color, price) \
         VALUES ($1, $2, 'plain tee', 'tee.jpg', $3, 'M', 'black', $4)",
    )
    .bind(id)
    .bind(format!("{name}-{id}"))
    .bind(category_id)
    .bind(price)
    .execute(db)
    .await
    .unwrap();
    id
}

async fn send(app: &Router, method: &str, uri: &str, token: Option<Uuid>, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(v) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(v.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
    (status, value)
}

async fn checkout(app: &Router, token: Uuid) -> (StatusCode, Value) {
    let body = json!({"shipping_address": "5 High St", "payment_method": "cash_on_delivery"});
    send(app, "POST", "/checkout", Some(token), Some(body)).await
}

async fn order_status(db: &PgPool, order_id: Uuid) -> String {
    sqlx::query_scalar("SELECT status FROM orders WHERE id = $1")
        .bind(order_id)
        .fetch_one(db)
        .await
        .unwrap()
}

#[tokio::test]
#[ignore = "needs DATABASE_URL pointing at a scratch Postgres"]
async fn add_to_cart_merges_into_one_line() {
    let (app, db) = setup().await;
    let (user_id, token) = seed_user(&db).await;
    let product = seed_product(&db, "tee", dec!(10.00)).await;

    for _ in 0..2 {
        let (status, _) = send(&app, "POST", &format!("/cart/add/{product}"), Some(token), None).await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let rows: Vec<(Uuid, i32)> = sqlx::query_as(
        "SELECT ci.id, ci.quantity FROM cart_items ci \
         JOIN carts c ON c.id = ci.cart_id WHERE c.user_id = $1",
    )
    .bind(user_id)
    .fetch_all(&db)
    .await
    .unwrap();
    assert_eq!(rows.len(), 1, "two adds must merge into a single line");
    assert_eq!(rows[0].1, 2);
}

#[tokio::test]
#[ignore = "needs DATABASE_URL pointing at a scratch Postgres"]
async fn checkout_freezes_total_and_clears_cart() {
    let (app, db) = setup().await;
    let (user_id, token) = seed_user(&db).await;
    let tee = seed_product(&db, "tee", dec!(10.00)).await;
    let sock = seed_product(&db, "sock", dec!(5.00)).await;

    send(&app, "POST", &format!("/cart/add/{tee}"), Some(token), None).await;
    send(&app, "POST", &format!("/cart/add/{tee}"), Some(token), None).await;
    send(&app, "POST", &format!("/cart/add/{sock}"), Some(token), None).await;

    let (status, body) = checkout(&app, token).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["total_cost"], "25.00");
    let order_id: Uuid = body["id"].as_str().unwrap().parse().unwrap();

    let item_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM order_items WHERE order_id = $1")
        .bind(order_id)
        .fetch_one(&db)
        .await
        .unwrap();
    assert_eq!(item_count, 2);

    let cart_count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM cart_items ci JOIN carts c ON c.id = ci.cart_id WHERE c.user_id = $1",
    )
    .bind(user_id)
    .fetch_one(&db)
    .await
    .unwrap();
    assert_eq!(cart_count, 0);

    // The frozen total must survive later price changes.
    sqlx::query("UPDATE products SET price = 99 WHERE id = $1").bind(tee).execute(&db).await.unwrap();
    let total: Decimal = sqlx::query_scalar("SELECT total_cost FROM orders WHERE id = $1")
        .bind(order_id)
        .fetch_one(&db)
        .await
        .unwrap();
    assert_eq!(total, dec!(25.00));
}

#[tokio::test]
#[ignore = "needs DATABASE_URL pointing at a scratch Postgres"]
async fn checkout_rejects_empty_cart() {
    let (app, db) = setup().await;
    let (user_id, token) = seed_user(&db).await;

    let (status, _) = checkout(&app, token).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders WHERE user_id = $1")
        .bind(user_id)
        .fetch_one(&db)
        .await
        .unwrap();
    assert_eq!(count, 0);
}

#[tokio::test]
#[ignore = "needs DATABASE_URL pointing at a scratch Postgres"]
async fn remove_from_cart_is_idempotent() {
    let (app, db) = setup().await;
    let (user_id, token) = seed_user(&db).await;
    let product = seed_product(&db, "tee", dec!(10.00)).await;

    send(&app, "POST", &format!("/cart/add/{product}"), Some(token), None).await;
    let item_id: Uuid = sqlx::query_scalar(
        "SELECT ci.id FROM cart_items ci JOIN carts c ON c.id = ci.cart_id WHERE c.user_id = $1",
    )
    .bind(user_id)
    .fetch_one(&db)
    .await
    .unwrap();

    for _ in 0..2 {
        let (status, _) = send(&app, "POST", &format!("/cart/remove/{item_id}"), Some(token), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
    }
}

#[tokio::test]
#[ignore = "needs DATABASE_URL pointing at a scratch Postgres"]
async fn order_history_is_newest_first() {
    let (app, db) = setup().await;
    let (user_id, token) = seed_user(&db).await;
    let older = Uuid::now_v7();
    let newer = Uuid::now_v7();
    for (id, age) in [(older, "2 days"), (newer, "1 day")] {
        sqlx::query(
            "INSERT INTO orders (id, user_id, ordered_date, shipping_address, payment_method, total_cost) \
             VALUES ($1, $2, NOW() - $3::interval, '5 High St', 'card', 1)",
        )
        .bind(id)
        .bind(user_id)
        .bind(age)
        .execute(&db)
        .await
        .unwrap();
    }

    let (status, body) = send(&app, "GET", "/orders", Some(token), None).await;
    assert_eq!(status, StatusCode::OK);
    let ids: Vec<&str> = body.as_array().unwrap().iter().map(|o| o["id"].as_str().unwrap()).collect();
    assert_eq!(ids, vec![newer.to_string().as_str(), older.to_string().as_str()]);
}

#[tokio::test]
#[ignore = "needs DATABASE_URL pointing at a scratch Postgres"]
async fn cancel_is_guarded_by_source_state_at_write_time() {
    let (app, db) = setup().await;
    let (_, token) = seed_user(&db).await;
    let product = seed_product(&db, "tee", dec!(10.00)).await;
    send(&app, "POST", &format!("/cart/add/{product}"), Some(token), None).await;
    let (_, body) = checkout(&app, token).await;
    let order_id: Uuid = body["id"].as_str().unwrap().parse().unwrap();

    // Status moved on (e.g. by staff) after the customer loaded the page;
    // the cancel must fail and leave the stored status alone.
    sqlx::query("UPDATE orders SET status = 'delivered' WHERE id = $1").bind(order_id).execute(&db).await.unwrap();
    let (status, _) = send(&app, "POST", &format!("/order/{order_id}/cancel"), Some(token), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(order_status(&db, order_id).await, "delivered");

    // A delivered order takes a return instead.
    let (status, _) = send(&app, "POST", &format!("/order/{order_id}/return"), Some(token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(order_status(&db, order_id).await, "return_requested");

    // And from a cancellable state the cancel goes through.
    sqlx::query("UPDATE orders SET status = 'ordered' WHERE id = $1").bind(order_id).execute(&db).await.unwrap();
    let (status, _) = send(&app, "POST", &format!("/order/{order_id}/cancel"), Some(token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(order_status(&db, order_id).await, "cancelled");

    // In-flight orders cannot take a return.
    sqlx::query("UPDATE orders SET status = 'on_the_way' WHERE id = $1").bind(order_id).execute(&db).await.unwrap();
    let (status, _) = send(&app, "POST", &format!("/order/{order_id}/return"), Some(token), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(order_status(&db, order_id).await, "on_the_way");
}

#[tokio::test]
#[ignore = "needs DATABASE_URL pointing at a scratch Postgres"]
async fn search_matches_pattern_metacharacters_literally() {
    let (app, db) = setup().await;
    let cotton = seed_product(&db, "100% cotton tee", dec!(12.00)).await;
    seed_product(&db, "1000 thread sheet", dec!(30.00)).await;

    let (status, body) = send(&app, "GET", "/search?q=100%25", None, None).await;
    assert_eq!(status, StatusCode::OK);
    let ids: Vec<&str> = body.as_array().unwrap().iter().map(|p| p["id"].as_str().unwrap()).collect();
    assert!(ids.contains(&cotton.to_string().as_str()));
    for p in body.as_array().unwrap() {
        assert!(p["name"].as_str().unwrap().contains("100%"), "'{}' is not a literal match", p["name"]);
    }
}
