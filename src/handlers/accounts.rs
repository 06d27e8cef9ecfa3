//! Registration, login, and profile management.

use axum::{extract::State, http::{HeaderMap, StatusCode}, Json};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::auth;
use crate::domain::account::verify_password_reset;
use crate::error::{Result, StoreError};
use crate::models::User;
use crate::AppState;

const USERNAME_TAKEN: &str = "username already taken";

#[derive(Debug, Deserialize, Validate)]
pub struct SignupRequest {
    #[validate(length(min = 1, message = "username is required"))]
    pub username: String,
    #[validate(email(message = "invalid email address"))]
    pub email: String,
    #[validate(length(min = 8, message = "password must be at least 8 characters"))]
    pub password: String,
    pub contact_number: String,
    pub dob: NaiveDate,
    pub address: String,
}

pub async fn signup(
    State(s): State<AppState>,
    Json(req): Json<SignupRequest>,
) -> Result<(StatusCode, Json<User>)> {
    req.validate().map_err(|e| StoreError::Validation(e.to_string()))?;
    let password_hash = auth::hash_password(&req.password)?;
    let user = sqlx::query_as::<_, User>(
        "INSERT INTO users (id, username, password_hash, email, contact_number, dob, address) \
         VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING *",
    )
    .bind(Uuid::now_v7())
    .bind(&req.username)
    .bind(&password_hash)
    .bind(&req.email)
    .bind(&req.contact_number)
    .bind(req.dob)
    .bind(&req.address)
    .fetch_one(&s.db)
    .await
    .map_err(|e| StoreError::from(e).conflict_on("users_username_key", USERNAME_TAKEN))?;
    tracing::info!(username = %user.username, "user registered");
    Ok((StatusCode::CREATED, Json(user)))
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: Uuid,
    pub user: User,
}

pub async fn login(State(s): State<AppState>, Json(req): Json<LoginRequest>) -> Result<Json<LoginResponse>> {
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = $1")
        .bind(&req.username)
        .fetch_optional(&s.db)
        .await?;
    // Same answer for unknown user and wrong password.
    let user = user
        .filter(|u| auth::verify_password(&req.password, &u.password_hash))
        .ok_or(StoreError::Unauthorized)?;
    let token = auth::create_session(&s.db, user.id).await?;
    Ok(Json(LoginResponse { token, user }))
}

pub async fn logout(State(s): State<AppState>, headers: HeaderMap) -> Result<StatusCode> {
    if let Some(token) = auth::bearer_token(&headers) {
        auth::delete_session(&s.db, token).await?;
    }
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
pub struct ForgotPasswordRequest {
    pub username: String,
    pub dob: String,
    pub new_password: String,
    pub confirm_password: String,
}

/// Date-of-birth-verified password reset. On success the new hash replaces
/// the old one and every live session for the user is revoked.
pub async fn forgot_password(
    State(s): State<AppState>,
    Json(req): Json<ForgotPasswordRequest>,
) -> Result<StatusCode> {
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = $1")
        .bind(&req.username)
        .fetch_optional(&s.db)
        .await?
        .ok_or(StoreError::NotFound("user"))?;
    let new_password =
        verify_password_reset(user.dob, &req.dob, &req.new_password, &req.confirm_password)?;
    let password_hash = auth::hash_password(new_password)?;
    sqlx::query("UPDATE users SET password_hash = $2 WHERE id = $1")
        .bind(user.id)
        .bind(&password_hash)
        .execute(&s.db)
        .await?;
    auth::revoke_sessions(&s.db, user.id).await?;
    tracing::info!(username = %user.username, "password reset");
    Ok(StatusCode::NO_CONTENT)
}

pub async fn profile(State(s): State<AppState>, headers: HeaderMap) -> Result<Json<User>> {
    let user = auth::require_user(&s, &headers).await?;
    Ok(Json(user))
}

#[derive(Debug, Deserialize, Validate)]
pub struct EditProfileRequest {
    #[validate(length(min = 1, message = "username is required"))]
    pub username: String,
    #[validate(email(message = "invalid email address"))]
    pub email: String,
    pub contact_number: String,
    pub address: String,
}

pub async fn edit_profile(
    State(s): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<EditProfileRequest>,
) -> Result<Json<User>> {
    let user = auth::require_user(&s, &headers).await?;
    req.validate().map_err(|e| StoreError::Validation(e.to_string()))?;
    let user = sqlx::query_as::<_, User>(
        "UPDATE users SET username = $2, email = $3, contact_number = $4, address = $5 \
         WHERE id = $1 RETURNING *",
    )
    .bind(user.id)
    .bind(&req.username)
    .bind(&req.email)
    .bind(&req.contact_number)
    .bind(&req.address)
    .fetch_one(&s.db)
    .await
    .map_err(|e| StoreError::from(e).conflict_on("users_username_key", USERNAME_TAKEN))?;
    Ok(Json(user))
}
