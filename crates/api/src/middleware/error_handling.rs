//! # Error Handling Middleware
//!
//! Maps [`ClinicError`] values onto HTTP status codes and a JSON body of the
//! form `{ "error": "<message>" }`, so every handler reports failures the
//! same way.
//!
//! | Error                      | Status |
//! |----------------------------|--------|
//! | `ClinicError::NotFound`    | 404    |
//! | `ClinicError::Validation`  | 400    |
//! | `ClinicError::Upstream`    | 502    |
//! | `ClinicError::Internal`    | 500    |

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use dentiro_core::errors::ClinicError;
use serde_json::json;
use tracing::error;

/// Application error wrapper that provides HTTP status code mapping
///
/// # Example
///
/// ```
/// use axum::Json;
/// use dentiro_api::middleware::error_handling::AppError;
/// use dentiro_core::errors::ClinicError;
///
/// async fn handler(message: String) -> Result<Json<String>, AppError> {
///     if message.trim().is_empty() {
///         return Err(ClinicError::Validation("Message is required".into()).into());
///     }
///     Ok(Json(message))
/// }
/// # fn main() {}
/// ```
#[derive(Debug)]
pub struct AppError(pub ClinicError);

impl AppError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            ClinicError::NotFound(_) => StatusCode::NOT_FOUND,
            ClinicError::Validation(_) => StatusCode::BAD_REQUEST,
            ClinicError::Upstream(_) => StatusCode::BAD_GATEWAY,
            ClinicError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(%status, error = %self.0, "Request failed");
        }

        let body = Json(json!({ "error": self.0.to_string() }));
        (status, body).into_response()
    }
}

impl From<ClinicError> for AppError {
    fn from(err: ClinicError) -> Self {
        AppError(err)
    }
}

/// Webhook calls return `eyre` reports; those surface as upstream failures
impl From<eyre::Report> for AppError {
    fn from(err: eyre::Report) -> Self {
        AppError(ClinicError::Upstream(err))
    }
}
