//! HTTP error mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use kitchen_core::KitchenServiceError;
use log::{error, warn};
use serde::Serialize;
use std::fmt::{Display, Formatter};

pub const NOT_FOUND_MESSAGE: &str = "Not found";
pub const ORDER_NOT_FOUND_MESSAGE: &str = "Order not found";

/// Request failure rendered as `{ "success": false, "error": ... }`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    BadRequest(String),
    Unauthorized(&'static str),
    Forbidden(&'static str),
    NotFound(&'static str),
    /// The order changed between read and write.
    Conflict(String),
    ApiKeyNotConfigured,
    /// Unexpected failure; carries the public message only.
    Internal(&'static str),
}

impl ApiError {
    /// Maps a service error; store failures are logged and reduced to
    /// `failure`.
    pub fn from_service(err: KitchenServiceError, failure: &'static str) -> Self {
        match err {
            KitchenServiceError::Validation(err) => Self::BadRequest(err.to_string()),
            KitchenServiceError::OrderNotFound(_) => Self::NotFound(ORDER_NOT_FOUND_MESSAGE),
            KitchenServiceError::InvalidTransition { from, to, .. } => {
                Self::BadRequest(format!("Invalid status transition from {from} to {to}"))
            }
            conflict @ KitchenServiceError::StatusConflict { .. } => {
                Self::Conflict(conflict.to_string())
            }
            KitchenServiceError::Repo(err) => {
                error!(
                    "event=service_call module=server status=error reason={} error={}",
                    failure, err
                );
                Self::Internal(failure)
            }
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::ApiKeyNotConfigured | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl Display for ApiError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BadRequest(message) | Self::Conflict(message) => f.write_str(message),
            Self::Unauthorized(message)
            | Self::Forbidden(message)
            | Self::NotFound(message)
            | Self::Internal(message) => f.write_str(message),
            Self::ApiKeyNotConfigured => f.write_str("API key not configured"),
        }
    }
}

impl std::error::Error for ApiError {}

#[derive(Debug, Serialize)]
struct ErrorBody {
    success: bool,
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_client_error() {
            warn!(
                "event=http_response module=server status=rejected code={}",
                status.as_u16()
            );
        }
        (
            status,
            Json(ErrorBody {
                success: false,
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}
