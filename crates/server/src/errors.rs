use axum::extract::rejection::{FormRejection, JsonRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use service::auth::errors::AuthError;
use service::errors::{ServiceError, UploadRejection};
use thiserror::Error;
use tracing::error;

/// JSON error body: `{"error": <title>, "message": <detail?>}`.
#[derive(Debug)]
pub struct JsonApiError {
    pub status: StatusCode,
    pub error: &'static str,
    pub message: Option<String>,
}

impl JsonApiError {
    pub fn new(status: StatusCode, error: &'static str, message: Option<String>) -> Self {
        Self { status, error, message }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "Validation Error", Some(message.into()))
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, "Not Found", Some(message.into()))
    }

    pub fn unauthorized() -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "Unauthorized", None)
    }

    /// Log the cause and return a body that does not leak it.
    pub fn internal(cause: impl std::fmt::Display) -> Self {
        error!(err = %cause, "request failed");
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error", Some("something went wrong, please try again".into()))
    }
}

impl IntoResponse for JsonApiError {
    fn into_response(self) -> Response {
        let body = match self.message {
            Some(msg) => serde_json::json!({"error": self.error, "message": msg}),
            None => serde_json::json!({"error": self.error}),
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<ServiceError> for JsonApiError {
    fn from(e: ServiceError) -> Self {
        match e {
            ServiceError::Validation(msg) => JsonApiError::bad_request(msg),
            ServiceError::NotFound(msg) => JsonApiError::not_found(msg),
            ServiceError::Upload(reason) => {
                let status = match reason {
                    UploadRejection::Empty => StatusCode::BAD_REQUEST,
                    UploadRejection::TooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
                    UploadRejection::UnsupportedType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
                };
                JsonApiError::new(status, "Upload Rejected", Some(reason.to_string()))
            }
            ServiceError::Storage(_) => JsonApiError::internal(e),
        }
    }
}

// Malformed or incomplete bodies are validation errors like any other.
impl From<JsonRejection> for JsonApiError {
    fn from(e: JsonRejection) -> Self {
        JsonApiError::bad_request(e.body_text())
    }
}

impl From<FormRejection> for JsonApiError {
    fn from(e: FormRejection) -> Self {
        JsonApiError::bad_request(e.body_text())
    }
}

impl From<AuthError> for JsonApiError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::Unauthorized => JsonApiError::unauthorized(),
            AuthError::Validation(msg) => JsonApiError::bad_request(msg),
            AuthError::Conflict => JsonApiError::new(StatusCode::CONFLICT, "Conflict", Some(e.to_string())),
            _ => {
                error!(code = e.code(), "auth failure");
                JsonApiError::internal(e)
            }
        }
    }
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("admin bootstrap failed: {0}")]
    Bootstrap(#[from] AuthError),
    #[error(transparent)]
    Service(#[from] ServiceError),
    #[error(transparent)]
    Any(#[from] anyhow::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn service_errors_map_to_statuses() {
        let cases = [
            (ServiceError::Validation("x".into()), StatusCode::BAD_REQUEST),
            (ServiceError::not_found("record"), StatusCode::NOT_FOUND),
            (ServiceError::Storage("disk full".into()), StatusCode::INTERNAL_SERVER_ERROR),
            (ServiceError::Upload(UploadRejection::TooLarge { limit: 1 }), StatusCode::PAYLOAD_TOO_LARGE),
            (ServiceError::Upload(UploadRejection::UnsupportedType("text/plain".into())), StatusCode::UNSUPPORTED_MEDIA_TYPE),
        ];
        for (err, status) in cases {
            assert_eq!(JsonApiError::from(err).status, status);
        }
    }

    #[test]
    fn storage_details_are_not_exposed() {
        let e = JsonApiError::from(ServiceError::Storage("/srv/data/products.json: permission denied".into()));
        assert!(!e.message.unwrap_or_default().contains("products.json"));
    }
}
