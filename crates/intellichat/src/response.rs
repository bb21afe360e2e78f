//! JSON error responses.

use axum::Json;
use axum::http::StatusCode;
use intellichat_types::ErrorBody;

pub fn bad_request(message: impl Into<String>) -> (StatusCode, Json<ErrorBody>) {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorBody {
            error: message.into(),
        }),
    )
}
