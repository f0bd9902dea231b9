//! Checkout endpoint.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use kasir_core::{CartLine, PaymentMethod, ValidationError};
use kasir_engine::{CheckoutReceipt, CheckoutRequest, EngineError, Tender};
use serde::Deserialize;

use super::{json_body, Cashier};
use crate::error::ApiResult;
use crate::state::AppState;

/// POST /api/checkout
#[derive(Debug, Deserialize)]
pub struct CheckoutBody {
    pub items: Vec<CartLine>,
    pub payment_method: PaymentMethod,
    /// Required for cash.
    #[serde(default)]
    pub tendered_amount: Option<i64>,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub resume_from: Option<String>,
}

impl TryFrom<CheckoutBody> for CheckoutRequest {
    type Error = EngineError;

    fn try_from(body: CheckoutBody) -> Result<Self, Self::Error> {
        let tender = match body.payment_method {
            PaymentMethod::Cash => Tender::Cash {
                tendered: body.tendered_amount.ok_or_else(|| ValidationError::Required {
                    field: "tendered_amount".to_string(),
                })?,
            },
            PaymentMethod::Wallet => Tender::Wallet,
        };

        Ok(CheckoutRequest {
            items: body.items,
            tender,
            note: body.note,
            resume_from: body.resume_from,
        })
    }
}

pub async fn checkout(
    State(state): State<AppState>,
    Cashier(cashier_id): Cashier,
    body: Result<Json<CheckoutBody>, JsonRejection>,
) -> ApiResult<CheckoutReceipt> {
    let request = CheckoutRequest::try_from(json_body(body)?)?;
    let receipt = state
        .engine
        .checkout(&state.settings, &cashier_id, request)
        .await?;

    Ok(Json(receipt))
}
