//! Shift endpoints.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use kasir_core::{Shift, ShiftSummary};
use serde::Deserialize;

use super::{json_body, Cashier};
use crate::error::ApiResult;
use crate::state::AppState;

/// POST /api/shifts/start
#[derive(Debug, Deserialize)]
pub struct StartShiftBody {
    pub opening_cash: i64,
    #[serde(default)]
    pub notes: Option<String>,
}

/// POST /api/shifts/end
#[derive(Debug, Deserialize)]
pub struct EndShiftBody {
    pub closing_cash: i64,
    #[serde(default)]
    pub notes: Option<String>,
}

pub async fn start_shift(
    State(state): State<AppState>,
    Cashier(cashier_id): Cashier,
    body: Result<Json<StartShiftBody>, JsonRejection>,
) -> ApiResult<Shift> {
    let body = json_body(body)?;
    let shift = state
        .ledger
        .start_shift(&cashier_id, body.opening_cash, body.notes.as_deref())
        .await?;

    Ok(Json(shift))
}

pub async fn end_shift(
    State(state): State<AppState>,
    Cashier(cashier_id): Cashier,
    body: Result<Json<EndShiftBody>, JsonRejection>,
) -> ApiResult<ShiftSummary> {
    let body = json_body(body)?;
    let summary = state
        .ledger
        .end_shift(&cashier_id, body.closing_cash, body.notes.as_deref())
        .await?;

    Ok(Json(summary))
}

/// GET /api/shifts/current
pub async fn current_shift(
    State(state): State<AppState>,
    Cashier(cashier_id): Cashier,
) -> ApiResult<ShiftSummary> {
    Ok(Json(state.ledger.current_shift(&cashier_id).await?))
}
