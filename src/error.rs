//! Error taxonomy shared by every handler.

use axum::{http::StatusCode, response::{IntoResponse, Response}, Json};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Validation(String),

    /// Illegal lifecycle operation: bad status transition, empty-cart
    /// checkout, password mismatch, wrong date of birth.
    #[error("{0}")]
    InvalidState(String),

    #[error("authentication required")]
    Unauthorized,

    #[error("staff access required")]
    Forbidden,

    #[error("database error")]
    Database(#[from] sqlx::Error),
}

impl StoreError {
    fn status(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::InvalidState(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Folds a unique-violation on the given constraint into `Conflict`,
    /// leaving every other database error untouched.
    pub fn conflict_on(self, constraint: &str, message: &str) -> Self {
        if let Self::Database(sqlx::Error::Database(ref db)) = self {
            if db.constraint() == Some(constraint) {
                return Self::Conflict(message.to_string());
            }
        }
        self
    }
}

impl IntoResponse for StoreError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            // Never leak driver details to the client.
            Self::Database(e) => {
                tracing::error!(error = %e, "database error");
                "internal error".to_string()
            }
            other => other.to_string(),
        };
        let body = Json(json!({
            "error": status.canonical_reason().unwrap_or("error"),
            "message": message,
        }));
        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;
