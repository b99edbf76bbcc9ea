//! Error handling for the backend API

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use lesson_core::ValidationError;
use serde::Serialize;
use thiserror::Error;

use crate::services::identity::AuthError;
use crate::AppState;

/// API error types
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Unauthorized: {0}")]
    Auth(#[from] AuthError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

/// Error response body
#[derive(Debug, Clone, Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    missing: Vec<String>,
}

impl ApiError {
    fn status_and_kind(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::Validation(_) => (StatusCode::BAD_REQUEST, "validation_error"),
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
            ApiError::Auth(_) => (StatusCode::UNAUTHORIZED, "unauthorized"),
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            ApiError::Conflict(_) => (StatusCode::CONFLICT, "conflict"),
            ApiError::Database(_) => (StatusCode::INTERNAL_SERVER_ERROR, "database_error"),
            ApiError::Migration(_) => (StatusCode::INTERNAL_SERVER_ERROR, "migration_error"),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
        }
    }

    /// Message returned to the client. Auth failures and server-side
    /// failures stay generic.
    fn client_message(&self) -> String {
        match self {
            ApiError::Auth(AuthError::MissingToken) => "Missing authorization token".to_string(),
            ApiError::Auth(_) => "Invalid or expired token".to_string(),
            ApiError::Database(_) | ApiError::Migration(_) | ApiError::Internal(_) => {
                "Internal server error".to_string()
            }
            _ => self.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type) = self.status_and_kind();

        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }

        let missing = match &self {
            ApiError::Validation(e) => e.missing_fields().to_vec(),
            _ => Vec::new(),
        };

        let body = ErrorResponse {
            error: error_type.to_string(),
            message: self.client_message(),
            missing,
        };

        let detail = status.is_server_error().then(|| InternalDetail(ErrorResponse {
            message: self.to_string(),
            ..body.clone()
        }));

        let mut response = (status, Json(body)).into_response();
        if let Some(detail) = detail {
            response.extensions_mut().insert(detail);
        }
        response
    }
}

/// Detailed body of a server-side failure, carried on the response until
/// [`reveal_internal_detail`] decides whether the client may see it.
#[derive(Debug, Clone)]
struct InternalDetail(ErrorResponse);

/// Response mapper: swaps in the detailed error body when the app state
/// allows internal errors to be exposed.
pub async fn reveal_internal_detail(
    State(state): State<AppState>,
    mut response: Response,
) -> Response {
    let Some(InternalDetail(detail)) = response.extensions_mut().remove::<InternalDetail>() else {
        return response;
    };
    if !state.expose_errors {
        return response;
    }
    (response.status(), Json(detail)).into_response()
}

/// Result type alias for API operations
pub type Result<T> = std::result::Result<T, ApiError>;
