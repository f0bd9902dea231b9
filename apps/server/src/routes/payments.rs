//! # Gateway Callback Endpoint
//!
//! ```text
//!   signature missing / wrong ──► 401, nothing read
//!   storage failure ───────────► 500, gateway retries
//!   anything else ─────────────► 200
//!        applied / replayed / ignored        {"outcome": ...}
//!        unknown reference, amount mismatch,  {"outcome": "rejected"}
//!        malformed body                       (logged, never retried)
//! ```

use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use axum::Json;
use kasir_engine::ErrorKind;
use serde_json::json;
use tracing::warn;

use crate::error::ApiError;
use crate::state::AppState;

/// POST /api/payments/webhook
pub async fn webhook(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> Response {
    let signature = headers
        .get(&state.signature_header)
        .and_then(|value| value.to_str().ok());

    match state
        .reconciler
        .handle_callback(&state.settings, &body, signature)
        .await
    {
        Ok(outcome) => Json(outcome).into_response(),
        Err(err) if err.is_invalid_signature() || err.kind() == ErrorKind::Internal => {
            ApiError::from(err).into_response()
        }
        Err(err) => {
            warn!(error = %err, kind = ?err.kind(), "Callback acknowledged without change");
            Json(json!({ "outcome": "rejected", "reason": err.kind() })).into_response()
        }
    }
}
