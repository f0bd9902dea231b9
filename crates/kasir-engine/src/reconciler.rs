//! # Webhook Reconciler
//!
//! Applies gateway notifications to payments and orders. Delivery is
//! at-least-once and unordered, so every step is safe to repeat.
//!
//! ## Callback State Machine
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  raw body + signature                                                   │
//! │       │ verify HMAC ──────────────── mismatch ──► InvalidSignature      │
//! │       ▼                                                                 │
//! │  parse ─► resolve payment by (provider, reference)                      │
//! │       │                         └── none ──► UnknownReference           │
//! │       ▼                                                                 │
//! │  map provider status ─── no transition ──► Ignored                      │
//! │       │                                                                 │
//! │  payment terminal? ───── yes ──► Replayed (no side effects)             │
//! │       │                                                                 │
//! │  settled with another amount? ── yes ──► Integrity                      │
//! │       │                                                                 │
//! │  BEGIN                                                                  │
//! │    UPDATE payment ... WHERE status = 'pending'   (0 rows ──► Replayed)  │
//! │    settled: UPDATE order SET paid ... WHERE status = 'pending'          │
//! │  COMMIT                                                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A payment that expires or fails leaves its order `pending` and its stock
//! reserved.

use std::sync::Arc;

use chrono::Utc;
use kasir_core::provider::map_provider_status;
use kasir_core::{DomainEvent, EventSink, PaymentStatus, StoreSettings};
use kasir_db::{Database, OrderRepository, PaymentRepository};
use kasir_gateway::{GatewayError, Notification, SignatureVerifier};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::{EngineError, EngineResult};

/// What a callback did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "status", rename_all = "snake_case")]
pub enum CallbackOutcome {
    /// The payment moved to this terminal status.
    Applied(PaymentStatus),
    /// The payment was already terminal; nothing changed.
    Replayed,
    /// The notification carries no transition (e.g. `pending`).
    Ignored,
}

/// Consumes gateway callbacks. Each call runs in its own transaction.
#[derive(Clone)]
pub struct WebhookReconciler {
    db: Database,
    verifier: SignatureVerifier,
    provider: String,
    events: Arc<dyn EventSink>,
}

impl WebhookReconciler {
    /// `provider` must match the name the gateway records on payments.
    pub fn new(
        db: Database,
        verifier: SignatureVerifier,
        provider: impl Into<String>,
        events: Arc<dyn EventSink>,
    ) -> Self {
        WebhookReconciler {
            db,
            verifier,
            provider: provider.into(),
            events,
        }
    }

    /// Handles one notification.
    ///
    /// ## Errors
    /// * `External(InvalidSignature)` - signature missing or wrong; nothing read
    /// * `External(MalformedNotification)` - body is not a notification
    /// * `UnknownReference` - no payment carries the reference
    /// * `Integrity` - settlement amount differs from the payment amount
    pub async fn handle_callback(
        &self,
        settings: &StoreSettings,
        payload: &[u8],
        signature: Option<&str>,
    ) -> EngineResult<CallbackOutcome> {
        let signature = signature.ok_or(GatewayError::InvalidSignature)?;
        if let Err(e) = self.verifier.verify(payload, signature) {
            warn!(bytes = payload.len(), "Rejected callback with invalid signature");
            return Err(e.into());
        }

        let notification = Notification::parse(payload)?;
        let reference = notification.order_id.as_str();
        debug!(
            reference = %reference,
            transaction_status = %notification.transaction_status,
            "Callback received"
        );

        let payment = match self
            .db
            .payments()
            .find_by_reference(&self.provider, reference)
            .await?
        {
            Some(payment) => payment,
            None => {
                warn!(provider = %self.provider, reference = %reference, "Callback for unknown reference");
                return Err(EngineError::UnknownReference(reference.to_string()));
            }
        };

        let Some(status) = map_provider_status(
            &notification.transaction_status,
            notification.fraud_status.as_deref(),
        ) else {
            debug!(reference = %reference, "Callback carries no transition");
            return Ok(CallbackOutcome::Ignored);
        };

        if payment.status.is_terminal() {
            debug!(reference = %reference, status = payment.status.as_str(), "Callback replay ignored");
            return Ok(CallbackOutcome::Replayed);
        }

        if status == PaymentStatus::Settled {
            if let Some(amount) = notification.amount_minor(settings.currency_decimals)? {
                if amount != payment.amount {
                    warn!(
                        reference = %reference,
                        expected = payment.amount,
                        reported = amount,
                        "Settlement amount mismatch"
                    );
                    return Err(EngineError::Integrity(format!(
                        "settlement of {} reports amount {}, expected {}",
                        reference, amount, payment.amount
                    )));
                }
            }
        }

        let now = Utc::now();
        let mut tx = self.db.begin().await?;

        if !PaymentRepository::close(&mut tx, &payment.id, status, now).await? {
            // A concurrent delivery closed it first.
            debug!(reference = %reference, "Payment closed concurrently");
            return Ok(CallbackOutcome::Replayed);
        }

        if status == PaymentStatus::Settled
            && !OrderRepository::mark_paid(&mut tx, &payment.order_id, payment.amount, now).await?
        {
            warn!(order_id = %payment.order_id, "Settled payment for an order that is not pending");
        }

        tx.commit().await?;

        info!(
            order_id = %payment.order_id,
            reference = %reference,
            status = status.as_str(),
            "Payment closed"
        );

        let event = if status == PaymentStatus::Settled {
            DomainEvent::PaymentSettled {
                order_id: payment.order_id.clone(),
                payment_id: payment.id.clone(),
                amount: payment.amount,
            }
        } else {
            DomainEvent::PaymentClosed {
                order_id: payment.order_id.clone(),
                payment_id: payment.id.clone(),
                status: status.as_str().to_string(),
            }
        };
        self.events.emit(&event);

        Ok(CallbackOutcome::Applied(status))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activity::testing::RecordingSink;
    use crate::checkout::{CheckoutReceipt, CheckoutRequest, OrderEngine, Tender};
    use crate::error::ErrorKind;
    use crate::test_support::*;
    use kasir_core::{CartLine, OrderStatus};
    use serde_json::json;

    const SECRET: &str = "whsec_kasir";

    struct Fixture {
        db: Database,
        engine: OrderEngine,
        reconciler: WebhookReconciler,
        sink: Arc<RecordingSink>,
        product_id: String,
        receipt: CheckoutReceipt,
    }

    async fn fixture() -> Fixture {
        let db = database().await;
        let cashier = cashier(&db).await;
        let x = product(&db, "X", 10_500, 4).await;
        let (engine, _) = engine(&db, FakeGateway::ok());
        let sink = Arc::new(RecordingSink::default());
        let reconciler = WebhookReconciler::new(
            db.clone(),
            SignatureVerifier::new(SECRET),
            FAKE_PROVIDER,
            sink.clone(),
        );

        let receipt = engine
            .checkout(
                &StoreSettings::default(),
                &cashier,
                CheckoutRequest {
                    items: vec![CartLine::new(&x.id, 2)],
                    tender: Tender::Wallet,
                    note: None,
                    resume_from: None,
                },
            )
            .await
            .unwrap();

        Fixture {
            db,
            engine,
            reconciler,
            sink,
            product_id: x.id,
            receipt,
        }
    }

    fn body(reference: &str, status: &str, amount: &str) -> Vec<u8> {
        serde_json::to_vec(&json!({
            "order_id": reference,
            "transaction_status": status,
            "status_code": "200",
            "gross_amount": amount,
        }))
        .unwrap()
    }

    fn sign(payload: &[u8]) -> String {
        SignatureVerifier::new(SECRET).sign(payload).unwrap()
    }

    #[tokio::test]
    async fn test_settlement_marks_order_paid_once() {
        let f = fixture().await;
        let settings = StoreSettings::default();
        let payload = body(&f.receipt.invoice_number, "settlement", "21000.00");
        let signature = sign(&payload);

        let first = f
            .reconciler
            .handle_callback(&settings, &payload, Some(&signature))
            .await
            .unwrap();
        assert_eq!(first, CallbackOutcome::Applied(PaymentStatus::Settled));

        let paid = f.engine.get_order(&f.receipt.order_id).await.unwrap();
        assert_eq!(paid.order.status, OrderStatus::Paid);
        assert_eq!(paid.order.paid_amount, 21_000);
        assert!(paid.order.paid_at.is_some());
        assert_eq!(paid.payments.len(), 1);
        assert_eq!(paid.payments[0].status, PaymentStatus::Settled);

        let replay = f
            .reconciler
            .handle_callback(&settings, &payload, Some(&signature))
            .await
            .unwrap();
        assert_eq!(replay, CallbackOutcome::Replayed);

        let after = f.engine.get_order(&f.receipt.order_id).await.unwrap();
        assert_eq!(after.payments.len(), 1);
        assert_eq!(after.order.paid_at, paid.order.paid_at);
        assert_eq!(after.payments[0].paid_at, paid.payments[0].paid_at);
        assert_eq!(f.sink.names(), vec!["payment_settled"]);

        let status = f.engine.payment_status(&f.receipt.order_id).await.unwrap();
        assert!(status.paid);
    }

    #[tokio::test]
    async fn test_invalid_signature_changes_nothing() {
        let f = fixture().await;
        let settings = StoreSettings::default();
        let payload = body(&f.receipt.invoice_number, "settlement", "21000.00");
        let forged = SignatureVerifier::new("guess").sign(&payload).unwrap();

        let err = f
            .reconciler
            .handle_callback(&settings, &payload, Some(&forged))
            .await
            .unwrap_err();
        assert!(err.is_invalid_signature());

        let missing = f
            .reconciler
            .handle_callback(&settings, &payload, None)
            .await
            .unwrap_err();
        assert!(missing.is_invalid_signature());

        let order = f.engine.get_order(&f.receipt.order_id).await.unwrap();
        assert_eq!(order.order.status, OrderStatus::Pending);
        assert!(f.sink.names().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_reference_is_rejected() {
        let f = fixture().await;
        let payload = body("INV/19990101/9999", "settlement", "21000.00");

        let err = f
            .reconciler
            .handle_callback(&StoreSettings::default(), &payload, Some(&sign(&payload)))
            .await
            .unwrap_err();

        assert!(matches!(err, EngineError::UnknownReference(ref r) if r == "INV/19990101/9999"));
        assert_eq!(err.kind(), ErrorKind::Integrity);
    }

    #[tokio::test]
    async fn test_amount_mismatch_is_rejected() {
        let f = fixture().await;
        let payload = body(&f.receipt.invoice_number, "settlement", "1.00");

        let err = f
            .reconciler
            .handle_callback(&StoreSettings::default(), &payload, Some(&sign(&payload)))
            .await
            .unwrap_err();

        assert!(matches!(err, EngineError::Integrity(_)));
        let order = f.engine.get_order(&f.receipt.order_id).await.unwrap();
        assert_eq!(order.order.status, OrderStatus::Pending);
        assert_eq!(order.payments[0].status, PaymentStatus::Pending);
    }

    #[tokio::test]
    async fn test_two_decimal_currency_settles() {
        let db = database().await;
        let cashier = cashier(&db).await;
        let mug = product(&db, "MUG", 550, 5).await;
        let gateway = FakeGateway::ok();
        let (engine, _) = engine(&db, gateway.clone());
        let reconciler = WebhookReconciler::new(
            db.clone(),
            SignatureVerifier::new(SECRET),
            FAKE_PROVIDER,
            Arc::new(RecordingSink::default()),
        );
        let settings = StoreSettings {
            currency: "USD".to_string(),
            currency_decimals: 2,
            ..StoreSettings::default()
        };

        let receipt = engine
            .checkout(
                &settings,
                &cashier,
                CheckoutRequest {
                    items: vec![CartLine::new(&mug.id, 2)],
                    tender: Tender::Wallet,
                    note: None,
                    resume_from: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(receipt.total, 1_100);

        let request = gateway.last_request().unwrap();
        assert_eq!(request.currency, "USD");
        assert_eq!(request.currency_decimals, 2);

        let payload = body(&receipt.invoice_number, "settlement", "11.00");
        let outcome = reconciler
            .handle_callback(&settings, &payload, Some(&sign(&payload)))
            .await
            .unwrap();
        assert_eq!(outcome, CallbackOutcome::Applied(PaymentStatus::Settled));

        let paid = engine.get_order(&receipt.order_id).await.unwrap();
        assert_eq!(paid.order.status, OrderStatus::Paid);
        assert_eq!(paid.order.paid_amount, 1_100);
    }

    #[tokio::test]
    async fn test_expiry_keeps_order_pending_and_stock_reserved() {
        let f = fixture().await;
        let settings = StoreSettings::default();
        let payload = body(&f.receipt.invoice_number, "expire", "21000.00");

        let outcome = f
            .reconciler
            .handle_callback(&settings, &payload, Some(&sign(&payload)))
            .await
            .unwrap();
        assert_eq!(outcome, CallbackOutcome::Applied(PaymentStatus::Expired));

        let detail = f.engine.get_order(&f.receipt.order_id).await.unwrap();
        assert_eq!(detail.order.status, OrderStatus::Pending);
        assert_eq!(detail.payments[0].status, PaymentStatus::Expired);
        assert!(detail.payments[0].paid_at.is_none());
        assert_eq!(stock(&f.db, &f.product_id).await, 2);

        let status = f.engine.payment_status(&f.receipt.order_id).await.unwrap();
        assert_eq!(status.status, "expired");
        assert!(!status.paid);

        // A late settlement cannot resurrect a terminal payment.
        let late = body(&f.receipt.invoice_number, "settlement", "21000.00");
        let outcome = f
            .reconciler
            .handle_callback(&settings, &late, Some(&sign(&late)))
            .await
            .unwrap();
        assert_eq!(outcome, CallbackOutcome::Replayed);
        assert_eq!(f.sink.names(), vec!["payment_closed"]);
    }

    #[tokio::test]
    async fn test_pending_and_challenge_are_ignored() {
        let f = fixture().await;
        let settings = StoreSettings::default();

        let pending = body(&f.receipt.invoice_number, "pending", "21000.00");
        let outcome = f
            .reconciler
            .handle_callback(&settings, &pending, Some(&sign(&pending)))
            .await
            .unwrap();
        assert_eq!(outcome, CallbackOutcome::Ignored);

        let challenge = serde_json::to_vec(&json!({
            "order_id": f.receipt.invoice_number,
            "transaction_status": "capture",
            "fraud_status": "challenge",
            "gross_amount": "21000.00",
        }))
        .unwrap();
        let outcome = f
            .reconciler
            .handle_callback(&settings, &challenge, Some(&sign(&challenge)))
            .await
            .unwrap();
        assert_eq!(outcome, CallbackOutcome::Ignored);

        let status = f.engine.payment_status(&f.receipt.order_id).await.unwrap();
        assert_eq!(status.status, "pending");
    }

    #[tokio::test]
    async fn test_malformed_body_is_external_error() {
        let f = fixture().await;
        let payload = b"{not json".to_vec();

        let err = f
            .reconciler
            .handle_callback(&StoreSettings::default(), &payload, Some(&sign(&payload)))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            EngineError::External(GatewayError::MalformedNotification(_))
        ));
    }
}
