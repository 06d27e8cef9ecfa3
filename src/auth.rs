//! Session and principal plumbing.
//!
//! Credentials are argon2 hashes; sessions are opaque bearer tokens held in
//! the `sessions` table. Handlers never read ambient request state: they call
//! `require_user` / `require_staff` at the top and pass the returned
//! principal down explicitly.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use axum::http::{header, HeaderMap};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{Result, StoreError};
use crate::models::User;
use crate::AppState;

pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| StoreError::Validation(format!("unusable password: {e}")))?;
    Ok(hash.to_string())
}

pub fn verify_password(password: &str, hash: &str) -> bool {
    PasswordHash::new(hash)
        .map(|parsed| Argon2::default().verify_password(password.as_bytes(), &parsed).is_ok())
        .unwrap_or(false)
}

pub fn bearer_token(headers: &HeaderMap) -> Option<Uuid> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")?
        .trim()
        .parse()
        .ok()
}

pub async fn create_session(db: &PgPool, user_id: Uuid) -> Result<Uuid> {
    let token = Uuid::new_v4();
    sqlx::query("INSERT INTO sessions (token, user_id) VALUES ($1, $2)")
        .bind(token)
        .bind(user_id)
        .execute(db)
        .await?;
    Ok(token)
}

pub async fn delete_session(db: &PgPool, token: Uuid) -> Result<()> {
    sqlx::query("DELETE FROM sessions WHERE token = $1").bind(token).execute(db).await?;
    Ok(())
}

/// Drops every session a user holds. Called on password reset so credentials
/// minted against the old hash stop working.
pub async fn revoke_sessions(db: &PgPool, user_id: Uuid) -> Result<()> {
    sqlx::query("DELETE FROM sessions WHERE user_id = $1").bind(user_id).execute(db).await?;
    Ok(())
}

/// Resolves the caller from the bearer token, if any. Anonymous requests are
/// fine for the catalog; `Ok(None)` means "browsing logged out".
pub async fn current_user(state: &AppState, headers: &HeaderMap) -> Result<Option<User>> {
    let Some(token) = bearer_token(headers) else { return Ok(None) };
    let user = sqlx::query_as::<_, User>(
        "SELECT u.* FROM users u JOIN sessions s ON s.user_id = u.id WHERE s.token = $1",
    )
    .bind(token)
    .fetch_optional(&state.db)
    .await?;
    Ok(user)
}

pub async fn require_user(state: &AppState, headers: &HeaderMap) -> Result<User> {
    current_user(state, headers).await?.ok_or(StoreError::Unauthorized)
}

pub async fn require_staff(state: &AppState, headers: &HeaderMap) -> Result<User> {
    let user = require_user(state, headers).await?;
    if !user.is_staff {
        return Err(StoreError::Forbidden);
    }
    Ok(user)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn hash_round_trip() {
        let hash = hash_password("hunter2").unwrap();
        assert_ne!(hash, "hunter2");
        assert!(verify_password("hunter2", &hash));
        assert!(!verify_password("hunter3", &hash));
    }

    #[test]
    fn garbage_hash_never_verifies() {
        assert!(!verify_password("anything", "not-a-phc-string"));
    }

    #[test]
    fn bearer_token_parsing() {
        let token = Uuid::new_v4();
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {token}")).unwrap(),
        );
        assert_eq!(bearer_token(&headers), Some(token));

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert_eq!(bearer_token(&headers), None);
    }
}
