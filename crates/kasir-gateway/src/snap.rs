//! # Snap Gateway
//!
//! [`PaymentGateway`] over a Snap-style REST API (`POST /snap/v1/transactions`,
//! HTTP Basic auth with the server key as user name).
//!
//! ## Request Mapping
//! ```text
//! SessionRequest                         Snap body
//! ──────────────                         ─────────
//! reference          ──────────────────► transaction_details.order_id
//! amount             ──────────────────► transaction_details.gross_amount
//! currency           ──────────────────► transaction_details.currency
//! items[]            ──────────────────► item_details[]
//! order_id           ──────────────────► custom_field1
//! config.enabled_payments ─────────────► enabled_payments   (omitted if empty)
//!
//! 201 { token, redirect_url[, qr_string] } ──► SessionDescriptor
//! ```
//!
//! Snap takes amounts in major units, the same unit notifications echo in
//! `gross_amount`: minor 1099 with 2 decimals is sent as `10.99`.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use crate::error::{GatewayError, GatewayResult};
use crate::session::{PaymentGateway, SessionDescriptor, SessionItem, SessionRequest};

/// Provider name stored on payment rows.
pub const SNAP_PROVIDER: &str = "snap";

/// Connection settings for the Snap API.
#[derive(Debug, Clone)]
pub struct SnapConfig {
    /// e.g. `https://app.sandbox.midtrans.com`
    pub base_url: String,
    pub server_key: String,
    /// Upper bound for one session request, connect included.
    pub timeout: Duration,
    /// Payment channels offered on the payment page, e.g. `["qris"]`.
    pub enabled_payments: Vec<String>,
}

/// HTTP client for the Snap API.
#[derive(Debug, Clone)]
pub struct SnapGateway {
    client: reqwest::Client,
    config: SnapConfig,
}

#[derive(Debug, Serialize)]
struct SnapTransactionRequest<'a> {
    transaction_details: SnapTransactionDetails<'a>,
    item_details: Vec<SnapItemDetail<'a>>,
    #[serde(skip_serializing_if = "<[String]>::is_empty")]
    enabled_payments: &'a [String],
    custom_field1: &'a str,
}

#[derive(Debug, Serialize)]
struct SnapTransactionDetails<'a> {
    order_id: &'a str,
    gross_amount: Value,
    currency: &'a str,
}

#[derive(Debug, Serialize)]
struct SnapItemDetail<'a> {
    id: &'a str,
    name: &'a str,
    price: Value,
    quantity: i64,
}

impl<'a> SnapTransactionRequest<'a> {
    fn new(request: &'a SessionRequest, enabled_payments: &'a [String]) -> Self {
        let decimals = request.currency_decimals;
        SnapTransactionRequest {
            transaction_details: SnapTransactionDetails {
                order_id: &request.reference,
                gross_amount: major_units(request.amount, decimals),
                currency: &request.currency,
            },
            item_details: request.items.iter().map(|item| item_detail(item, decimals)).collect(),
            enabled_payments,
            custom_field1: &request.order_id,
        }
    }
}

fn item_detail(item: &SessionItem, decimals: u8) -> SnapItemDetail<'_> {
    SnapItemDetail {
        id: &item.id,
        name: &item.name,
        price: major_units(item.price, decimals),
        quantity: item.quantity,
    }
}

/// Minor units to the JSON number Snap expects: an integer when the
/// currency has no fraction digits, otherwise the decimal value.
fn major_units(minor: i64, decimals: u8) -> Value {
    if decimals == 0 {
        Value::from(minor)
    } else {
        // Exact quotient rounded once; prints back as the shortest decimal.
        Value::from(minor as f64 / 10_f64.powi(decimals as i32))
    }
}

#[derive(Debug, Deserialize)]
struct SnapTransactionResponse {
    token: Option<String>,
    redirect_url: Option<String>,
    qr_string: Option<String>,
}

impl SnapGateway {
    /// Builds the client.
    ///
    /// ## Errors
    /// * `Unavailable` - the TLS backend could not be initialised
    pub fn new(config: SnapConfig) -> GatewayResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.timeout)
            .build()
            .map_err(|e| GatewayError::Unavailable(e.to_string()))?;

        Ok(SnapGateway { client, config })
    }

    fn transactions_url(&self) -> String {
        format!(
            "{}/snap/v1/transactions",
            self.config.base_url.trim_end_matches('/')
        )
    }

    fn classify(&self, err: reqwest::Error) -> GatewayError {
        if err.is_timeout() {
            GatewayError::Timeout {
                seconds: self.config.timeout.as_secs(),
            }
        } else {
            GatewayError::Unavailable(err.to_string())
        }
    }
}

#[async_trait]
impl PaymentGateway for SnapGateway {
    fn provider(&self) -> &str {
        SNAP_PROVIDER
    }

    async fn create_session(&self, request: &SessionRequest) -> GatewayResult<SessionDescriptor> {
        let body = SnapTransactionRequest::new(request, &self.config.enabled_payments);

        let response = self
            .client
            .post(self.transactions_url())
            .basic_auth(&self.config.server_key, None::<&str>)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(reference = %request.reference, status = status.as_u16(), "Gateway rejected session");
            return Err(GatewayError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: SnapTransactionResponse = response.json().await.map_err(|e| {
            if e.is_timeout() {
                self.classify(e)
            } else {
                GatewayError::InvalidResponse(e.to_string())
            }
        })?;

        if parsed.token.is_none() && parsed.redirect_url.is_none() && parsed.qr_string.is_none() {
            return Err(GatewayError::InvalidResponse(
                "response carries neither token, redirect_url nor qr_string".to_string(),
            ));
        }

        info!(reference = %request.reference, amount = request.amount, "Payment session created");

        Ok(SessionDescriptor {
            provider: SNAP_PROVIDER.to_string(),
            provider_reference: request.reference.clone(),
            token: parsed.token,
            qr_payload: parsed.qr_string,
            redirect_url: parsed.redirect_url,
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::post;
    use axum::{Json, Router};
    use serde_json::{json, Value};

    async fn stub(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn gateway(base_url: String, timeout: Duration) -> SnapGateway {
        SnapGateway::new(SnapConfig {
            base_url,
            server_key: "SB-Mid-server-test".to_string(),
            timeout,
            enabled_payments: vec!["qris".to_string()],
        })
        .unwrap()
    }

    fn request() -> SessionRequest {
        SessionRequest {
            order_id: "order-1".to_string(),
            reference: "INV/20261016/0001".to_string(),
            amount: 20_000,
            currency: "IDR".to_string(),
            currency_decimals: 0,
            items: vec![SessionItem {
                id: "p-1".to_string(),
                name: "Kopi".to_string(),
                price: 10_000,
                quantity: 2,
            }],
        }
    }

    #[tokio::test]
    async fn test_create_session_maps_response() {
        let router = Router::new().route(
            "/snap/v1/transactions",
            post(|headers: HeaderMap, Json(body): Json<Value>| async move {
                let authorized = headers
                    .get("authorization")
                    .and_then(|v| v.to_str().ok())
                    .map(|v| v.starts_with("Basic "))
                    .unwrap_or(false);
                if !authorized
                    || body["transaction_details"]["gross_amount"] != 20_000
                    || body["transaction_details"]["order_id"] != "INV/20261016/0001"
                    || body["transaction_details"]["currency"] != "IDR"
                    || body["item_details"][0]["price"] != 10_000
                    || body["enabled_payments"][0] != "qris"
                    || body["custom_field1"] != "order-1"
                {
                    return (StatusCode::BAD_REQUEST, Json(json!({"error_messages": ["bad"]})));
                }
                (
                    StatusCode::CREATED,
                    Json(json!({"token": "tok-123", "redirect_url": "https://pay.example/tok-123"})),
                )
            }),
        );
        let base = stub(router).await;

        let descriptor = gateway(base, Duration::from_secs(5))
            .create_session(&request())
            .await
            .unwrap();

        assert_eq!(descriptor.provider, "snap");
        assert_eq!(descriptor.provider_reference, "INV/20261016/0001");
        assert_eq!(descriptor.token.as_deref(), Some("tok-123"));
        assert_eq!(descriptor.redirect_url.as_deref(), Some("https://pay.example/tok-123"));
        assert_eq!(descriptor.qr_payload, None);
    }

    #[test]
    fn test_amounts_sent_in_major_units() {
        let mut request = request();
        request.currency = "USD".to_string();
        request.currency_decimals = 2;
        request.amount = 1_099;
        request.items = vec![
            SessionItem {
                id: "p-1".to_string(),
                name: "Mug".to_string(),
                price: 550,
                quantity: 2,
            },
            SessionItem {
                id: "DISCOUNT".to_string(),
                name: "Discount".to_string(),
                price: -1,
                quantity: 1,
            },
        ];

        let body = serde_json::to_value(SnapTransactionRequest::new(&request, &[])).unwrap();
        assert_eq!(body["transaction_details"]["gross_amount"].to_string(), "10.99");
        assert_eq!(body["transaction_details"]["currency"], "USD");
        assert_eq!(body["item_details"][0]["price"].to_string(), "5.5");
        assert_eq!(body["item_details"][1]["price"].to_string(), "-0.01");
        assert!(body.get("enabled_payments").is_none());

        // The gateway echoes the amount back as a decimal string.
        let echoed = format!("{:.2}", body["transaction_details"]["gross_amount"].as_f64().unwrap());
        let notification = crate::Notification::parse(
            format!(
                r#"{{"order_id":"{}","transaction_status":"settlement","gross_amount":"{}"}}"#,
                request.reference, echoed
            )
            .as_bytes(),
        )
        .unwrap();
        assert_eq!(notification.amount_minor(2).unwrap(), Some(request.amount));
    }

    #[test]
    fn test_zero_decimal_amounts_stay_integers() {
        let body = serde_json::to_value(SnapTransactionRequest::new(&request(), &[])).unwrap();
        assert_eq!(body["transaction_details"]["gross_amount"].to_string(), "20000");
        assert_eq!(body["item_details"][0]["price"].to_string(), "10000");
    }

    #[tokio::test]
    async fn test_non_2xx_is_rejected() {
        let router = Router::new().route(
            "/snap/v1/transactions",
            post(|| async { (StatusCode::UNAUTHORIZED, "Access denied") }),
        );
        let base = stub(router).await;

        let err = gateway(base, Duration::from_secs(5))
            .create_session(&request())
            .await
            .unwrap_err();

        match err {
            GatewayError::Rejected { status, body } => {
                assert_eq!(status, 401);
                assert_eq!(body, "Access denied");
            }
            other => panic!("expected Rejected, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_empty_success_body_is_invalid() {
        let router = Router::new().route(
            "/snap/v1/transactions",
            post(|| async { (StatusCode::CREATED, Json(json!({}))) }),
        );
        let base = stub(router).await;

        let err = gateway(base, Duration::from_secs(5))
            .create_session(&request())
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn test_slow_gateway_times_out() {
        let router = Router::new().route(
            "/snap/v1/transactions",
            post(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                (StatusCode::CREATED, Json(json!({"token": "late"})))
            }),
        );
        let base = stub(router).await;

        let err = gateway(base, Duration::from_millis(200))
            .create_session(&request())
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::Timeout { .. }));
        assert!(err.is_session_failure());
    }

    #[tokio::test]
    async fn test_unreachable_gateway_is_unavailable() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = gateway(format!("http://{}", addr), Duration::from_secs(2))
            .create_session(&request())
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::Unavailable(_)));
    }
}
