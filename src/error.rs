use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Errors surfaced to gateway clients
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("{0}")]
    Validation(String),

    #[error("All translation services failed")]
    AllServicesFailed { details: Option<String> },

    #[error("Failed to process request")]
    RequestProcessing(String),
}

impl GatewayError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            GatewayError::Validation(_) => StatusCode::BAD_REQUEST,
            GatewayError::AllServicesFailed { .. } => StatusCode::SERVICE_UNAVAILABLE,
            GatewayError::RequestProcessing(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn details(&self) -> Option<&str> {
        match self {
            GatewayError::Validation(_) => None,
            GatewayError::AllServicesFailed { details } => details.as_deref(),
            GatewayError::RequestProcessing(details) => Some(details.as_str()),
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let mut body = json!({ "error": self.to_string() });
        if let Some(details) = self.details() {
            body["details"] = json!(details);
        }
        (self.status_code(), Json(body)).into_response()
    }
}

/// A single upstream attempt that did not produce a usable answer.
///
/// Never returned to clients directly; its `Display` form becomes the
/// `details` of [`GatewayError::AllServicesFailed`] when it was the last one.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum UpstreamError {
    #[error("{service} returned HTTP {status}: {body}")]
    Status {
        service: String,
        status: u16,
        body: String,
    },

    #[error("{service} timed out after {timeout_secs}s")]
    Timeout { service: String, timeout_secs: f64 },

    #[error("{service} request failed: {message}")]
    Transport { service: String, message: String },

    #[error("{service} returned an invalid response: {message}")]
    InvalidResponse { service: String, message: String },
}
