use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::fmt;

use super::ApiResponse;
use crate::auth::AuthError;
use crate::services::ApiKeyError;

#[derive(Debug)]
pub enum ApiError {
    NotFound(String),

    Conflict(String),

    Unprocessable(String),

    QuotaExceeded(String),

    Unauthenticated(String),

    Forbidden(String),

    DatabaseError(String),

    InternalError(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            ApiError::Unprocessable(msg) => write!(f, "Unprocessable: {}", msg),
            ApiError::QuotaExceeded(msg) => write!(f, "Quota exceeded: {}", msg),
            ApiError::Unauthenticated(msg) => write!(f, "Unauthenticated: {}", msg),
            ApiError::Forbidden(msg) => write!(f, "Forbidden: {}", msg),
            ApiError::DatabaseError(msg) => write!(f, "Database error: {}", msg),
            ApiError::InternalError(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
            ApiError::Unprocessable(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg.clone()),
            ApiError::QuotaExceeded(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ApiError::Unauthenticated(msg) => (StatusCode::UNAUTHORIZED, msg.clone()),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg.clone()),
            ApiError::DatabaseError(msg) => {
                tracing::error!("Database error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "A database error occurred".to_string(),
                )
            }
            ApiError::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An internal error occurred".to_string(),
                )
            }
        };

        let body = ApiResponse::<()>::error(error_message);
        (status, Json(body)).into_response()
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError::DatabaseError(err.to_string())
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Rejected(msg) => ApiError::Unauthenticated(msg),
            AuthError::Internal(source) => ApiError::InternalError(source.to_string()),
        }
    }
}

impl From<ApiKeyError> for ApiError {
    fn from(err: ApiKeyError) -> Self {
        match err {
            ApiKeyError::NotFound => ApiError::NotFound(err.to_string()),
            ApiKeyError::Expired | ApiKeyError::InvalidCredential => {
                ApiError::Unauthenticated(err.to_string())
            }
            ApiKeyError::QuotaExceeded { .. } => ApiError::QuotaExceeded(err.to_string()),
            ApiKeyError::Database(source) => ApiError::DatabaseError(source.to_string()),
        }
    }
}

impl ApiError {
    pub fn user_not_found(id: i32) -> Self {
        ApiError::NotFound(format!("user with id '{}' not found", id))
    }

    pub fn username_not_found(username: &str) -> Self {
        ApiError::NotFound(format!("username '{}' not found", username))
    }

    pub fn encounter_not_found(id: i32) -> Self {
        ApiError::NotFound(format!("encounter with id '{}' not found", id))
    }

    pub fn api_key_not_found(identifier: &str) -> Self {
        ApiError::NotFound(format!("apiKey with identifier '{}' not found", identifier))
    }

    pub fn unprocessable(msg: impl Into<String>) -> Self {
        ApiError::Unprocessable(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        ApiError::Conflict(msg.into())
    }

    /// Missing credentials on a route that needs them.
    pub fn authentication_required() -> Self {
        ApiError::Unauthenticated(
            "Full authentication is required to access this resource".to_string(),
        )
    }

    /// Fixed wording; never names the resource, so a 403 cannot confirm what
    /// exists.
    pub fn not_authorized() -> Self {
        ApiError::Forbidden("not authorized for this resource".to_string())
    }

    pub fn api_key_barred() -> Self {
        ApiError::Forbidden("Forbidden. Cannot use API Key for this action.".to_string())
    }
}
