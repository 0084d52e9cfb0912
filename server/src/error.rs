//! Typed error taxonomy for the server (§7, §10.2 of SPEC_FULL.md).

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("not found")]
    NotFound,
    #[error("unauthorized")]
    Unauthorized,
    #[error("permission denied")]
    PermissionDenied,
    #[error("already exists")]
    Exists,
    #[error("locked by another user")]
    LockedByOther,
    #[error("io error: {0}")]
    Io(String),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::PermissionDenied => StatusCode::FORBIDDEN,
            ApiError::Exists => StatusCode::CONFLICT,
            // kept at 410 rather than 423 Locked, matching the source's
            // existing choice and the client's fixed status→kind mapping.
            ApiError::LockedByOther => StatusCode::GONE,
            ApiError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}

impl From<std::io::Error> for ApiError {
    fn from(e: std::io::Error) -> Self {
        match e.kind() {
            std::io::ErrorKind::NotFound => ApiError::NotFound,
            std::io::ErrorKind::PermissionDenied => ApiError::PermissionDenied,
            std::io::ErrorKind::AlreadyExists => ApiError::Exists,
            _ => ApiError::Io(e.to_string()),
        }
    }
}
