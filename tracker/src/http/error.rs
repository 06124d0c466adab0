// tracker/src/http/error.rs
// Maps `DomainError` onto the HTTP error body from spec.md §6:
// `{description, code, exceptionName, exceptionMessage, stackTrace[]}`,
// in the idiom of the teacher's `AuthError: IntoResponse`
// (backend/src/api/http/auth.rs).

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use linktracker_common::DomainError;
use serde::Serialize;
use tracing::error;

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub description: String,
    pub code: String,
    #[serde(rename = "exceptionName")]
    pub exception_name: String,
    #[serde(rename = "exceptionMessage")]
    pub exception_message: String,
    #[serde(rename = "stackTrace")]
    pub stack_trace: Vec<String>,
}

pub struct ApiError(pub DomainError);

impl From<DomainError> for ApiError {
    fn from(e: DomainError) -> Self {
        ApiError(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            DomainError::Validation(_) => StatusCode::BAD_REQUEST,
            DomainError::AlreadyExists(_) => StatusCode::CONFLICT,
            DomainError::NotExists(_) => StatusCode::NOT_FOUND,
            DomainError::Transient(_)
            | DomainError::Permanent(_)
            | DomainError::CircuitOpen
            | DomainError::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let message = self.0.to_string();
        if status.is_server_error() {
            error!(error = %message, "request failed");
        }

        let body = ErrorBody {
            description: message.clone(),
            code: self.0.code().to_string(),
            exception_name: "DomainError".to_string(),
            exception_message: message,
            stack_trace: Vec::new(),
        };

        (status, Json(body)).into_response()
    }
}
