//! REST-facing error type: every gateway handler produces a `GatewayError`,
//! which renders an HTTP response using the table in [`crate::status`]. No
//! handler ever constructs an `axum::http::StatusCode` directly (//! errors are translated at one boundary, never leak backend-specific text).

use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tonic::Status;

use trac_proto::ConversionError;

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error(transparent)]
    Status(#[from] Status),

    #[error("{0}")]
    BadRequest(String),
}

impl GatewayError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        GatewayError::BadRequest(msg.into())
    }

    fn code_and_message(&self) -> (tonic::Code, String) {
        match self {
            GatewayError::Status(status) => (status.code(), status.message().to_string()),
            GatewayError::BadRequest(msg) => (tonic::Code::InvalidArgument, msg.clone()),
        }
    }
}

impl From<ConversionError> for GatewayError {
    fn from(e: ConversionError) -> Self {
        GatewayError::BadRequest(e.to_string())
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let (code, message) = self.code_and_message();
        let http_status = crate::status::grpc_to_http(code);
        let body = json!({
            "error": {
                "code": format!("{code:?}"),
                "message": message,
            }
        });
        (http_status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_status_renders_404() {
        let err = GatewayError::from(Status::not_found("missing"));
        let response = err.into_response();
        assert_eq!(response.status(), http::StatusCode::NOT_FOUND);
    }

    #[test]
    fn bad_request_renders_400() {
        let err = GatewayError::bad_request("nope");
        let response = err.into_response();
        assert_eq!(response.status(), http::StatusCode::BAD_REQUEST);
    }
}
