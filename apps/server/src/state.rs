//! Shared application state handed to every route.

use std::sync::Arc;

use axum::http::HeaderName;
use kasir_core::{EventSink, StoreSettings};
use kasir_db::Database;
use kasir_engine::{OrderEngine, ShiftLedger, TracingSink, WebhookReconciler};
use kasir_gateway::{PaymentGateway, SignatureVerifier};

use crate::config::{ConfigError, GatewaySettings};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub engine: OrderEngine,
    pub reconciler: WebhookReconciler,
    pub ledger: ShiftLedger,
    pub settings: Arc<StoreSettings>,
    /// Header the gateway puts its callback signature in.
    pub signature_header: HeaderName,
}

impl AppState {
    /// Wires the engine components around one database and gateway.
    pub fn new(
        db: Database,
        gateway: Arc<dyn PaymentGateway>,
        settings: StoreSettings,
        gateway_settings: &GatewaySettings,
    ) -> Result<Self, ConfigError> {
        let events: Arc<dyn EventSink> = Arc::new(TracingSink);
        let signature_header = HeaderName::from_bytes(gateway_settings.signature_header.as_bytes())
            .map_err(|_| ConfigError::InvalidValue("gateway.signature_header".to_string()))?;

        let reconciler = WebhookReconciler::new(
            db.clone(),
            SignatureVerifier::new(gateway_settings.webhook_secret.as_str()),
            gateway.provider(),
            events.clone(),
        );

        Ok(AppState {
            engine: OrderEngine::new(db.clone(), gateway, events.clone()),
            ledger: ShiftLedger::new(db.clone(), events),
            reconciler,
            settings: Arc::new(settings),
            signature_header,
            db,
        })
    }
}
