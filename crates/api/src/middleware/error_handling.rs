//! # Error Handling Middleware
//!
//! Maps domain errors to HTTP status codes and JSON error bodies so every
//! handler fails the same way.
//!
//! Caller mistakes (4xx) carry the error text verbatim. Infrastructure faults
//! (5xx) get a generic message; the typed reason is logged server-side
//! instead of being sent to the browser.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use repairdesk_core::errors::RepairError;
use serde_json::json;

/// Application error wrapper that provides HTTP status code mapping
///
/// # Example
///
/// ```
/// use axum::Json;
/// use repairdesk_api::middleware::error_handling::AppError;
/// use repairdesk_core::errors::RepairError;
///
/// async fn handler(found: bool) -> Result<Json<&'static str>, AppError> {
///     if !found {
///         return Err(AppError(RepairError::NotFound("Service with ID 7 not found".into())));
///     }
///     Ok(Json("ok"))
/// }
/// # fn main() {}
/// ```
#[derive(Debug)]
pub struct AppError(pub RepairError);

impl AppError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            RepairError::NotFound(_) => StatusCode::NOT_FOUND,
            RepairError::Validation(_) | RepairError::InvalidDate(_) => StatusCode::BAD_REQUEST,
            RepairError::InvalidTransition { .. }
            | RepairError::AlreadyDecided(_)
            | RepairError::Conflict(_) => StatusCode::CONFLICT,
            RepairError::Authentication(_) => StatusCode::UNAUTHORIZED,
            RepairError::Authorization(_) => StatusCode::FORBIDDEN,
            RepairError::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            RepairError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        let message = if status.is_server_error() {
            tracing::error!(error = %self.0, status = status.as_u16(), "Request failed");
            match status {
                StatusCode::SERVICE_UNAVAILABLE => {
                    "The service is temporarily unavailable, please retry".to_string()
                }
                _ => "Internal server error".to_string(),
            }
        } else {
            self.0.to_string()
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

/// Lets handlers use `?` on `RepairResult`.
impl From<RepairError> for AppError {
    fn from(err: RepairError) -> Self {
        AppError(err)
    }
}

/// Bare `eyre` failures come from the store side and are treated as such.
impl From<eyre::Report> for AppError {
    fn from(err: eyre::Report) -> Self {
        AppError(RepairError::StoreUnavailable(err))
    }
}
