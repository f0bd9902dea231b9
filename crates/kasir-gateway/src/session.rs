//! # Payment Sessions
//!
//! The provider-agnostic half of the adapter: what checkout asks for and
//! what it gets back.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::GatewayResult;

/// One line shown on the gateway's payment page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionItem {
    pub id: String,
    pub name: String,
    /// Unit price in minor units; negative for discount lines.
    pub price: i64,
    pub quantity: i64,
}

/// Everything a gateway needs to open a payment session for an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRequest {
    /// Internal order id, sent as metadata.
    pub order_id: String,
    /// Reference the gateway will echo back in notifications
    /// (the invoice number).
    pub reference: String,
    /// Amount to collect, in minor units.
    pub amount: i64,
    /// ISO 4217 currency code.
    pub currency: String,
    /// Fraction digits of `currency`; `amount` and item prices are scaled
    /// by `10^currency_decimals`.
    pub currency_decimals: u8,
    /// Lines whose `price × quantity` sum to `amount`.
    pub items: Vec<SessionItem>,
}

impl SessionRequest {
    /// Sum of `price × quantity` over all items.
    pub fn items_total(&self) -> i64 {
        self.items.iter().map(|i| i.price * i.quantity).sum()
    }
}

/// What the register displays so the customer can pay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionDescriptor {
    /// Gateway name, e.g. "snap".
    pub provider: String,
    /// The gateway's identifier for this session; notifications carry it.
    pub provider_reference: String,
    /// Session token for an embedded payment widget.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    /// Raw QR string for QRIS.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub qr_payload: Option<String>,
    /// Hosted payment page.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect_url: Option<String>,
}

/// A remote payment gateway.
///
/// Implementations must bound every call with a timeout; the caller holds
/// an open database transaction while it waits.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Name recorded as `payments.provider`.
    fn provider(&self) -> &str;

    /// Opens a payment session.
    ///
    /// ## Errors
    /// `Unavailable`, `Timeout`, `Rejected` or `InvalidResponse`; in every
    /// case no session exists that the caller needs to track.
    async fn create_session(&self, request: &SessionRequest) -> GatewayResult<SessionDescriptor>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_items_total_includes_adjustments() {
        let request = SessionRequest {
            order_id: "o-1".to_string(),
            reference: "INV/1".to_string(),
            amount: 21_090,
            currency: "IDR".to_string(),
            currency_decimals: 0,
            items: vec![
                SessionItem {
                    id: "p-1".to_string(),
                    name: "Kopi".to_string(),
                    price: 10_000,
                    quantity: 2,
                },
                SessionItem {
                    id: "DISCOUNT".to_string(),
                    name: "Discount".to_string(),
                    price: -1_000,
                    quantity: 1,
                },
                SessionItem {
                    id: "TAX".to_string(),
                    name: "Tax".to_string(),
                    price: 2_090,
                    quantity: 1,
                },
            ],
        };
        assert_eq!(request.items_total(), request.amount);
    }

    #[test]
    fn test_descriptor_omits_missing_fields() {
        let descriptor = SessionDescriptor {
            provider: "snap".to_string(),
            provider_reference: "INV/1".to_string(),
            token: Some("tok".to_string()),
            qr_payload: None,
            redirect_url: None,
        };
        let json = serde_json::to_value(&descriptor).unwrap();
        assert_eq!(json["token"], "tok");
        assert!(json.get("qr_payload").is_none());
    }
}
