//! Translation of failures into HTTP responses
//!
//! Every handler returns `Result<_, ApiError>`, so this is the single place
//! where internal errors become a status code and a JSON body. A failure
//! that carries its own status keeps it; everything else is a 500.

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use nq_core::QueryError;
use serde::Serialize;
use thiserror::Error;

/// Message used for unknown ids
pub const NOT_FOUND_MESSAGE: &str = "Query not found";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Query(#[from] QueryError),

    /// Request body could not be read as JSON
    #[error("{message}")]
    Body { status: StatusCode, message: String },
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub message: String,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Query(err) => err
                .status_code()
                .and_then(|code| StatusCode::from_u16(code).ok())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            Self::Body { status, .. } => *status,
        }
    }

    /// Message exposed to clients
    pub fn message(&self) -> String {
        match self {
            Self::Query(QueryError::NotFound(_)) => NOT_FOUND_MESSAGE.to_string(),
            other => other.to_string(),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Body {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), "request failed: {}", self);
        } else {
            tracing::warn!(status = status.as_u16(), "request rejected: {}", self);
        }

        let body = ErrorBody {
            message: self.message(),
        };
        (status, Json(body)).into_response()
    }
}
