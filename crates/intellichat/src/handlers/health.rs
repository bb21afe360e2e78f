use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use intellichat_types::ProviderName;
use serde::Serialize;

use crate::server::AppState;

pub async fn livez() -> (StatusCode, &'static str) {
    (StatusCode::OK, "ok")
}

#[derive(Debug, Serialize)]
pub struct Readiness {
    status: &'static str,
    /// Providers usable without a caller-supplied key.
    server_keys: Vec<ProviderName>,
    one_key: bool,
}

pub async fn readyz(State(state): State<AppState>) -> Json<Readiness> {
    Json(Readiness {
        status: "ok",
        server_keys: state.keys.configured_providers(),
        one_key: state.keys.has_one_key(),
    })
}
