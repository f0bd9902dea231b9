//! Hold endpoints: park, list, read back, discard.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::Json;
use kasir_core::{CartLine, HoldSummary, ResumedHold};
use kasir_engine::{HoldReceipt, HoldRequest};
use serde::{Deserialize, Serialize};

use super::{json_body, Cashier};
use crate::error::ApiResult;
use crate::state::AppState;

/// POST /api/holds
#[derive(Debug, Deserialize)]
pub struct HoldBody {
    pub items: Vec<CartLine>,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub resume_from: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct Deleted {
    pub deleted: bool,
}

pub async fn hold(
    State(state): State<AppState>,
    Cashier(cashier_id): Cashier,
    body: Result<Json<HoldBody>, JsonRejection>,
) -> ApiResult<HoldReceipt> {
    let body = json_body(body)?;
    let receipt = state
        .engine
        .hold(
            &state.settings,
            &cashier_id,
            HoldRequest {
                items: body.items,
                note: body.note,
                resume_from: body.resume_from,
            },
        )
        .await?;

    Ok(Json(receipt))
}

/// GET /api/holds
pub async fn list_holds(
    State(state): State<AppState>,
    Cashier(cashier_id): Cashier,
) -> ApiResult<Vec<HoldSummary>> {
    Ok(Json(state.engine.list_holds(&cashier_id).await?))
}

/// GET /api/holds/{id}
pub async fn resume_hold(
    State(state): State<AppState>,
    Cashier(cashier_id): Cashier,
    Path(order_id): Path<String>,
) -> ApiResult<ResumedHold> {
    Ok(Json(state.engine.resume_hold(&order_id, &cashier_id).await?))
}

/// DELETE /api/holds/{id}
pub async fn discard_hold(
    State(state): State<AppState>,
    Cashier(cashier_id): Cashier,
    Path(order_id): Path<String>,
) -> ApiResult<Deleted> {
    state.engine.discard_hold(&order_id, &cashier_id).await?;
    Ok(Json(Deleted { deleted: true }))
}
