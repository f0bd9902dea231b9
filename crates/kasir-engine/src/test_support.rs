//! Shared fixtures for engine tests.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use kasir_core::{Cashier, Product};
use kasir_db::{new_id, Database, DbConfig};
use kasir_gateway::{
    GatewayError, GatewayResult, PaymentGateway, SessionDescriptor, SessionRequest,
};

use crate::activity::testing::RecordingSink;
use crate::checkout::OrderEngine;

pub const FAKE_PROVIDER: &str = "fake";

/// In-process gateway: succeeds with a QR payload, or times out.
#[derive(Debug, Default)]
pub struct FakeGateway {
    fail: bool,
    calls: AtomicUsize,
    last: Mutex<Option<SessionRequest>>,
}

impl FakeGateway {
    pub fn ok() -> Arc<Self> {
        Arc::new(FakeGateway::default())
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(FakeGateway {
            fail: true,
            ..FakeGateway::default()
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<SessionRequest> {
        self.last.lock().unwrap().clone()
    }
}

#[async_trait]
impl PaymentGateway for FakeGateway {
    fn provider(&self) -> &str {
        FAKE_PROVIDER
    }

    async fn create_session(&self, request: &SessionRequest) -> GatewayResult<SessionDescriptor> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last.lock().unwrap() = Some(request.clone());

        if self.fail {
            return Err(GatewayError::Timeout { seconds: 10 });
        }

        Ok(SessionDescriptor {
            provider: FAKE_PROVIDER.to_string(),
            provider_reference: request.reference.clone(),
            token: Some(format!("tok-{}", request.order_id)),
            qr_payload: Some(format!("00020101021226{}", request.amount)),
            redirect_url: None,
        })
    }
}

pub async fn database() -> Database {
    Database::new(DbConfig::in_memory()).await.unwrap()
}

pub async fn file_database(path: &Path) -> Database {
    Database::new(DbConfig::new(path).max_connections(8)).await.unwrap()
}

/// Inserts a cashier and returns its id.
pub async fn cashier(db: &Database) -> String {
    let cashier = Cashier {
        id: new_id(),
        name: "Sari".to_string(),
        created_at: Utc::now(),
    };
    db.cashiers().insert(&cashier).await.unwrap();
    cashier.id
}

pub async fn product(db: &Database, sku: &str, price: i64, stock: i64) -> Product {
    let now = Utc::now();
    let product = Product {
        id: new_id(),
        sku: sku.to_string(),
        name: format!("Product {}", sku),
        price,
        stock,
        is_active: true,
        created_at: now,
        updated_at: now,
    };
    db.products().insert(&product).await.unwrap()
}

pub async fn stock(db: &Database, product_id: &str) -> i64 {
    db.products().get_by_id(product_id).await.unwrap().unwrap().stock
}

pub fn engine(db: &Database, gateway: Arc<FakeGateway>) -> (OrderEngine, Arc<RecordingSink>) {
    let sink = Arc::new(RecordingSink::default());
    (OrderEngine::new(db.clone(), gateway, sink.clone()), sink)
}
