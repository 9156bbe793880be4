//! Error-to-response mapping.
//!
//! Every failure answers with a JSON envelope `{"success": false, ...}`.
//! The human-readable text lives under `msg` on the auth/signup paths and
//! `message` on the catalog paths, matching the public API contract.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    /// A required request field is missing or invalid.
    #[error("{0}")]
    Validation(String),

    /// Signup payload is missing username or password.
    #[error("Please include both username and password to signup.")]
    MissingCredentials,

    /// The id has no matching record.
    #[error("{0}")]
    NotFound(&'static str),

    /// The unique-username constraint was violated.
    #[error("A user with that username already exists.")]
    DuplicateUser,

    /// A gated request arrived without an `Authorization` header.
    #[error("No token provided.")]
    Unauthenticated,

    /// Token verification failed (bad signature or malformed token).
    #[error("Failed to authenticate token.")]
    InvalidToken,

    /// Wrong credentials on signin.
    #[error("Authentication failed.")]
    AuthenticationFailed,

    /// Store failure; the detail is logged, clients see only `context`.
    #[error("{context}")]
    Internal { context: &'static str },
}

impl ApiError {
    /// Wrap a store failure: log the detail, surface only the redacted
    /// context string to the client.
    pub fn internal(context: &'static str, err: impl std::fmt::Display) -> Self {
        tracing::error!(error = %err, context, "store call failed");
        ApiError::Internal { context }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, key) = match &self {
            ApiError::Validation(_) => (StatusCode::BAD_REQUEST, "message"),
            ApiError::MissingCredentials => (StatusCode::BAD_REQUEST, "msg"),
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "message"),
            // Duplicate usernames answer 200 with success=false.
            ApiError::DuplicateUser => (StatusCode::OK, "message"),
            ApiError::Unauthenticated => (StatusCode::UNAUTHORIZED, "msg"),
            ApiError::InvalidToken => (StatusCode::UNAUTHORIZED, "msg"),
            ApiError::AuthenticationFailed => (StatusCode::UNAUTHORIZED, "msg"),
            ApiError::Internal { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "message"),
        };

        let mut body = serde_json::Map::new();
        body.insert("success".into(), false.into());
        body.insert(key.into(), self.to_string().into());

        (status, axum::Json(serde_json::Value::Object(body))).into_response()
    }
}
