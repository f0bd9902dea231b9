//! # Routes
//!
//! ```text
//! GET    /health
//!
//! POST   /api/checkout
//! POST   /api/holds                      GET /api/holds
//! GET    /api/holds/{id}                 DELETE /api/holds/{id}
//! GET    /api/orders/{id}                GET /api/orders/{id}/payment-status
//! POST   /api/payments/webhook           (gateway, signed; no cashier)
//! POST   /api/shifts/start               POST /api/shifts/end
//! GET    /api/shifts/current
//! ```
//!
//! Cashier-facing routes read the cashier from `x-cashier-id`, set by the
//! authentication proxy in front of this server, and answer 401 when it is
//! missing or names no cashier.

pub mod checkout;
pub mod health;
pub mod holds;
pub mod orders;
pub mod payments;
pub mod shifts;

use axum::extract::rejection::JsonRejection;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::routing::{get, post};
use axum::{Json, Router};

use kasir_engine::EngineError;

use crate::error::ApiError;
use crate::state::AppState;

/// Header carrying the authenticated cashier's id.
pub const CASHIER_HEADER: &str = "x-cashier-id";

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/api/checkout", post(checkout::checkout))
        .route("/api/holds", post(holds::hold).get(holds::list_holds))
        .route("/api/holds/{id}", get(holds::resume_hold).delete(holds::discard_hold))
        .route("/api/orders/{id}", get(orders::get_order))
        .route("/api/orders/{id}/payment-status", get(orders::payment_status))
        .route("/api/payments/webhook", post(payments::webhook))
        .route("/api/shifts/start", post(shifts::start_shift))
        .route("/api/shifts/end", post(shifts::end_shift))
        .route("/api/shifts/current", get(shifts::current_shift))
}

/// The cashier making the request.
///
/// The id must name a cashier row; unknown ids are rejected with 401.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cashier(pub String);

impl FromRequestParts<AppState> for Cashier {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let id = parts
            .headers
            .get(CASHIER_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| ApiError::unauthorized("Missing cashier identity"))?;

        match state.db.cashiers().get_by_id(id).await {
            Ok(Some(cashier)) => Ok(Cashier(cashier.id)),
            Ok(None) => Err(ApiError::unauthorized("Unknown cashier")),
            Err(err) => Err(EngineError::from(err).into()),
        }
    }
}

/// Unwraps a JSON body, reporting malformed input in the API error shape.
pub(crate) fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    body.map(|Json(value)| value)
        .map_err(|rejection| ApiError::validation(rejection.body_text()))
}
