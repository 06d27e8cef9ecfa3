//! Row structs for the storefront schema.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: Uuid, pub username: String, #[serde(skip_serializing)] pub password_hash: String,
    pub email: String, pub contact_number: String, pub dob: NaiveDate, pub address: String,
    pub is_staff: bool, pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Category { pub id: Uuid, pub name: String }

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Product {
    pub id: Uuid, pub name: String, pub description: String, pub image: String,
    pub category_id: Uuid, pub size: String, pub color: String, pub price: Decimal,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Cart { pub id: Uuid, pub user_id: Uuid }

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct CartItem { pub id: Uuid, pub cart_id: Uuid, pub product_id: Uuid, pub quantity: i32 }

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Order {
    pub id: Uuid, pub user_id: Uuid, pub ordered_date: DateTime<Utc>,
    pub shipping_address: String, pub payment_method: String,
    pub total_cost: Decimal, pub status: String,
}

/// Order line with the product name and unit price frozen at checkout time.
/// `product_id` goes NULL if the product is later deleted.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct OrderItem {
    pub id: Uuid, pub order_id: Uuid, pub product_id: Option<Uuid>,
    pub product_name: String, pub unit_price: Decimal, pub quantity: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Review {
    pub id: Uuid, pub product_id: Uuid, pub user_id: Uuid,
    pub rating: i32, pub comment: String, pub created_at: DateTime<Utc>,
}
