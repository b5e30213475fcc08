use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use scannerpro::quote::Status;
use scannerpro::Error;
use serde::Serialize;

#[derive(Serialize, Debug)]
pub struct ErrorResponse {
    pub status: Status,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<u16>,
}

impl ErrorResponse {
    pub fn new(message: String) -> Self {
        ErrorResponse {
            status: Status::Error,
            message,
            code: None,
        }
    }
}

/// Error body carrying `code`, sent with that status.
pub fn error_response(status: StatusCode, message: String) -> Response {
    let body = ErrorResponse {
        status: Status::Error,
        message,
        code: Some(status.as_u16()),
    };

    (status, Json(body)).into_response()
}

/// Upstream transport and decoding failures are the provider's fault;
/// everything else is ours.
pub fn upstream_error(err: &Error, context: &str) -> Response {
    let status = match err {
        Error::HTTPError(_) | Error::SerdeError(_) => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };

    error_response(status, format!("{}: {}", context, err))
}

pub async fn not_found() -> Response {
    error_response(StatusCode::NOT_FOUND, "Endpoint not found".to_string())
}

pub async fn preflight() -> StatusCode {
    StatusCode::OK
}
