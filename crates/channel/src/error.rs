//! HTTP encoding of the shared error taxonomy.

use {
    atypica_common::Error,
    axum::{
        Json,
        http::StatusCode,
        response::{IntoResponse, Response},
    },
    serde_json::json,
    tracing::{debug, error},
};

/// Map an error to its HTTP status.
#[must_use]
pub fn status_for(error: &Error) -> StatusCode {
    match error {
        Error::Validation { .. } => StatusCode::BAD_REQUEST,
        Error::Auth { .. } => StatusCode::UNAUTHORIZED,
        Error::Forbidden { .. } => StatusCode::FORBIDDEN,
        Error::NotFound { .. } => StatusCode::NOT_FOUND,
        Error::Provision { .. }
        | Error::Timeout { .. }
        | Error::Delivery { .. }
        | Error::Host { .. }
        | Error::SerdeJson(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Encode an error as a structured JSON response.
#[must_use]
pub fn error_response(err: &Error) -> Response {
    let status = status_for(err);
    if status.is_server_error() {
        error!(error = %err, "request failed");
    } else {
        debug!(error = %err, status = %status, "request rejected");
    }
    (status, Json(json!({ "ok": false, "error": err.to_string() }))).into_response()
}
