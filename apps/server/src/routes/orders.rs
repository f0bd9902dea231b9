//! Order queries: receipt detail and payment polling, limited to the
//! requesting cashier's orders.

use axum::extract::{Path, State};
use axum::Json;
use kasir_engine::{OrderDetail, PaymentStatusView};

use super::Cashier;
use crate::error::ApiResult;
use crate::state::AppState;

/// GET /api/orders/{id}
pub async fn get_order(
    State(state): State<AppState>,
    Cashier(cashier_id): Cashier,
    Path(order_id): Path<String>,
) -> ApiResult<OrderDetail> {
    Ok(Json(state.engine.cashier_order(&cashier_id, &order_id).await?))
}

/// GET /api/orders/{id}/payment-status
///
/// Polled by the register while the customer scans the QR code.
pub async fn payment_status(
    State(state): State<AppState>,
    Cashier(cashier_id): Cashier,
    Path(order_id): Path<String>,
) -> ApiResult<PaymentStatusView> {
    Ok(Json(
        state
            .engine
            .cashier_payment_status(&cashier_id, &order_id)
            .await?,
    ))
}
