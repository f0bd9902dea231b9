//! # Order Engine
//!
//! Checkout and hold: the race-critical path from cart to persisted order.
//!
//! ## Checkout Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  validate cart, note, tender                  (no I/O)                  │
//! │       │                                                                 │
//! │  BEGIN ─► claim invoice sequence              (takes the write lock)    │
//! │       │                                                                 │
//! │       ├─► resume_from? compare-and-delete the hold, remember its stock  │
//! │       ├─► batch-load products, price cart, check stock                  │
//! │       ├─► per line: UPDATE stock = stock - n WHERE stock >= n           │
//! │       ├─► INSERT order + lines                                          │
//! │       │                                                                 │
//! │       ├─► Cash:   paid now, change = tendered - total                   │
//! │       └─► Wallet: create gateway session ─► INSERT payment (pending)    │
//! │                        │ failure / timeout                              │
//! │                        └──────────► ROLLBACK, nothing persisted         │
//! │  COMMIT ─► emit events                                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Local, Utc};
use kasir_core::pricing::{cash_change, price_cart, totals_for_lines};
use kasir_core::validation::{normalize_note, validate_amount, validate_cart};
use kasir_core::{
    CartLine, CoreError, DomainEvent, EventSink, Money, Order, OrderLine, OrderStatus,
    OrderTotals, Payment, PaymentMethod, PaymentStatus, PricedLine, StoreSettings,
};
use kasir_db::{
    new_id, Database, OrderRepository, PaymentRepository, ProductRepository, SequenceRepository,
};
use kasir_gateway::{PaymentGateway, SessionDescriptor, SessionItem, SessionRequest};
use serde::{Deserialize, Serialize};
use sqlx::SqliteConnection;
use tracing::{debug, info, warn};

use crate::error::{EngineError, EngineResult};

// =============================================================================
// Requests and Receipts
// =============================================================================

/// How the customer pays, chosen once at checkout entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tender {
    /// Settled on the spot; `tendered` must cover the total.
    Cash { tendered: i64 },
    /// Settled later by the gateway.
    Wallet,
}

impl Tender {
    pub fn method(&self) -> PaymentMethod {
        match self {
            Tender::Cash { .. } => PaymentMethod::Cash,
            Tender::Wallet => PaymentMethod::Wallet,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CheckoutRequest {
    pub items: Vec<CartLine>,
    pub tender: Tender,
    pub note: Option<String>,
    /// Hold being resumed into this order.
    pub resume_from: Option<String>,
}

#[derive(Debug, Clone)]
pub struct HoldRequest {
    pub items: Vec<CartLine>,
    pub note: Option<String>,
    /// Hold being replaced by this one.
    pub resume_from: Option<String>,
}

/// Result of a checkout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutReceipt {
    pub order_id: String,
    pub invoice_number: String,
    pub status: OrderStatus,
    pub total: i64,
    pub paid_amount: i64,
    pub change_amount: i64,
    /// Present for wallet checkouts: what the register shows the customer.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_descriptor: Option<SessionDescriptor>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HoldReceipt {
    pub order_id: String,
    pub invoice_number: String,
    pub status: OrderStatus,
    pub total: i64,
}

/// An order with its lines and payment attempts (receipt data).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderDetail {
    pub order: Order,
    pub lines: Vec<OrderLine>,
    pub payments: Vec<Payment>,
}

/// Answer to the register's payment polling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentStatusView {
    pub order_id: String,
    pub status: String,
    pub paid: bool,
}

// =============================================================================
// Order Engine
// =============================================================================

/// Checkout, holds and order queries.
#[derive(Clone)]
pub struct OrderEngine {
    pub(crate) db: Database,
    gateway: Arc<dyn PaymentGateway>,
    pub(crate) events: Arc<dyn EventSink>,
}

/// One product's stock change inside a placement. Negative = taken out.
#[derive(Debug, Clone)]
struct StockMovement {
    product_id: String,
    sku: String,
    delta: i64,
}

/// A priced cart whose stock has been reserved inside the open transaction.
#[derive(Debug)]
struct Placement {
    lines: Vec<PricedLine>,
    totals: OrderTotals,
    movements: Vec<StockMovement>,
}

impl OrderEngine {
    pub fn new(db: Database, gateway: Arc<dyn PaymentGateway>, events: Arc<dyn EventSink>) -> Self {
        OrderEngine {
            db,
            gateway,
            events,
        }
    }

    /// Turns a cart into an order.
    ///
    /// Cash orders are paid on return; wallet orders are `pending` with a
    /// pending payment and the session descriptor to display.
    ///
    /// ## Errors
    /// * `Validation` - empty cart, duplicate product, bad quantity, unknown
    ///   product, cash underpayment
    /// * `Conflict` - `OutOfStock` naming the first short SKU
    /// * `NotFound` - `resume_from` is not a hold of this cashier
    /// * `External` - the gateway session could not be created; nothing is
    ///   persisted
    pub async fn checkout(
        &self,
        settings: &StoreSettings,
        cashier_id: &str,
        request: CheckoutRequest,
    ) -> EngineResult<CheckoutReceipt> {
        validate_cart(&request.items)?;
        let note = normalize_note(request.note.as_deref(), "note")?;
        if let Tender::Cash { tendered } = request.tender {
            validate_amount(tendered, "tendered_amount")?;
        }

        debug!(
            cashier_id = %cashier_id,
            lines = request.items.len(),
            method = request.tender.method().as_str(),
            "Checkout started"
        );

        let now = Utc::now();
        let mut tx = self.db.begin().await?;

        let invoice_number = claim_invoice_number(&mut tx, settings, now).await?;
        let placement = reserve_cart(
            &mut tx,
            settings,
            cashier_id,
            &request.items,
            request.resume_from.as_deref(),
            now,
        )
        .await?;

        let mut order = draft_order(
            invoice_number,
            cashier_id,
            &placement.totals,
            note,
            request.resume_from.clone(),
            now,
        );
        order.payment_method = request.tender.method();

        if let Tender::Cash { tendered } = request.tender {
            let change = cash_change(order.total(), Money::from_minor(tendered))?;
            order.status = OrderStatus::Paid;
            order.paid_amount = tendered;
            order.change_amount = change.minor();
            order.paid_at = Some(now);
        }

        OrderRepository::insert(&mut tx, &order)
            .await
            .map_err(EngineError::owned_by(cashier_id))?;
        OrderRepository::insert_lines(&mut tx, &order_lines(&order.id, &placement.lines, now)).await?;

        let session_descriptor = match request.tender {
            Tender::Cash { .. } => None,
            Tender::Wallet => {
                Some(self.open_session(&mut tx, settings, &order, &placement.lines, now).await?)
            }
        };

        tx.commit().await?;

        info!(
            order_id = %order.id,
            invoice_number = %order.invoice_number,
            status = order.status.as_str(),
            total = order.total,
            "Checkout committed"
        );
        self.announce(&order, &placement.movements, "checkout");

        Ok(CheckoutReceipt {
            order_id: order.id,
            invoice_number: order.invoice_number,
            status: order.status,
            total: order.total,
            paid_amount: order.paid_amount,
            change_amount: order.change_amount,
            session_descriptor,
        })
    }

    /// Parks a cart as a suspended order.
    ///
    /// Validation and stock reservation are those of
    /// [`checkout`](Self::checkout); no payment is started and the stock
    /// stays reserved while the hold exists.
    pub async fn hold(
        &self,
        settings: &StoreSettings,
        cashier_id: &str,
        request: HoldRequest,
    ) -> EngineResult<HoldReceipt> {
        validate_cart(&request.items)?;
        let note = normalize_note(request.note.as_deref(), "note")?;

        let now = Utc::now();
        let mut tx = self.db.begin().await?;

        let invoice_number = claim_invoice_number(&mut tx, settings, now).await?;
        let placement = reserve_cart(
            &mut tx,
            settings,
            cashier_id,
            &request.items,
            request.resume_from.as_deref(),
            now,
        )
        .await?;

        let mut order = draft_order(
            invoice_number,
            cashier_id,
            &placement.totals,
            note,
            request.resume_from.clone(),
            now,
        );
        order.status = OrderStatus::Suspended;

        OrderRepository::insert(&mut tx, &order)
            .await
            .map_err(EngineError::owned_by(cashier_id))?;
        OrderRepository::insert_lines(&mut tx, &order_lines(&order.id, &placement.lines, now)).await?;

        tx.commit().await?;

        info!(order_id = %order.id, invoice_number = %order.invoice_number, "Cart held");
        self.announce(&order, &placement.movements, "hold");

        Ok(HoldReceipt {
            order_id: order.id,
            invoice_number: order.invoice_number,
            status: order.status,
            total: order.total,
        })
    }

    /// An order with its lines and payment attempts.
    pub async fn get_order(&self, order_id: &str) -> EngineResult<OrderDetail> {
        let order = self.load_order(order_id, None).await?;
        self.order_detail(order).await
    }

    /// [`get_order`](Self::get_order) for the register that rang the order
    /// up; another cashier's order is `OrderNotFound`.
    pub async fn cashier_order(&self, cashier_id: &str, order_id: &str) -> EngineResult<OrderDetail> {
        let order = self.load_order(order_id, Some(cashier_id)).await?;
        self.order_detail(order).await
    }

    /// Status for client-side polling.
    ///
    /// `paid` once the order is paid; otherwise the latest payment attempt's
    /// status, or the order's own status when there is no attempt.
    pub async fn payment_status(&self, order_id: &str) -> EngineResult<PaymentStatusView> {
        let order = self.load_order(order_id, None).await?;
        self.status_view(order).await
    }

    /// [`payment_status`](Self::payment_status) scoped to the cashier's own
    /// orders.
    pub async fn cashier_payment_status(
        &self,
        cashier_id: &str,
        order_id: &str,
    ) -> EngineResult<PaymentStatusView> {
        let order = self.load_order(order_id, Some(cashier_id)).await?;
        self.status_view(order).await
    }

    async fn load_order(&self, order_id: &str, owner: Option<&str>) -> EngineResult<Order> {
        self.db
            .orders()
            .get_by_id(order_id)
            .await?
            .filter(|order| owner.map_or(true, |cashier_id| order.user_id == cashier_id))
            .ok_or_else(|| CoreError::OrderNotFound(order_id.to_string()).into())
    }

    async fn order_detail(&self, order: Order) -> EngineResult<OrderDetail> {
        let lines = self.db.orders().get_lines(&order.id).await?;
        let payments = self.db.payments().list_for_order(&order.id).await?;

        Ok(OrderDetail {
            order,
            lines,
            payments,
        })
    }

    async fn status_view(&self, order: Order) -> EngineResult<PaymentStatusView> {
        let status = if order.is_paid() {
            OrderStatus::Paid.as_str()
        } else {
            match self.db.payments().latest_for_order(&order.id).await? {
                Some(payment) => payment.status.as_str(),
                None => order.status.as_str(),
            }
        };

        Ok(PaymentStatusView {
            order_id: order.id,
            status: status.to_string(),
            paid: matches!(status, "settled" | "paid"),
        })
    }

    /// Creates the gateway session and records the pending payment.
    ///
    /// Runs inside the checkout transaction; an error here rolls back the
    /// whole order.
    async fn open_session(
        &self,
        conn: &mut SqliteConnection,
        settings: &StoreSettings,
        order: &Order,
        lines: &[PricedLine],
        now: DateTime<Utc>,
    ) -> EngineResult<SessionDescriptor> {
        let request = session_request(settings, order, lines);

        let descriptor = match self.gateway.create_session(&request).await {
            Ok(descriptor) => descriptor,
            Err(e) => {
                warn!(
                    invoice_number = %order.invoice_number,
                    provider = self.gateway.provider(),
                    error = %e,
                    "Payment session failed, rolling back checkout"
                );
                return Err(e.into());
            }
        };

        let metadata = serde_json::to_string(&descriptor)
            .map_err(|e| EngineError::Internal(format!("session metadata: {}", e)))?;

        let payment = Payment {
            id: new_id(),
            order_id: order.id.clone(),
            method: PaymentMethod::Wallet,
            provider: descriptor.provider.clone(),
            provider_reference: descriptor.provider_reference.clone(),
            status: PaymentStatus::Pending,
            amount: order.total,
            metadata,
            paid_at: None,
            created_at: now,
            updated_at: now,
        };

        PaymentRepository::insert(conn, &payment).await.map_err(|e| {
            if e.is_unique_on("payments.provider_reference") {
                warn!(reference = %payment.provider_reference, "Gateway reused a provider reference");
                EngineError::Integrity(format!(
                    "provider reference {} is already recorded",
                    payment.provider_reference
                ))
            } else {
                e.into()
            }
        })?;

        Ok(descriptor)
    }

    fn announce(&self, order: &Order, movements: &[StockMovement], reason: &str) {
        for movement in movements {
            self.events.emit(&DomainEvent::StockChanged {
                product_id: movement.product_id.clone(),
                sku: movement.sku.clone(),
                delta: movement.delta,
                reason: reason.to_string(),
            });
        }
        self.events.emit(&DomainEvent::TransactionCreated {
            order_id: order.id.clone(),
            invoice_number: order.invoice_number.clone(),
            status: order.status.as_str().to_string(),
            total: order.total,
            user_id: order.user_id.clone(),
        });
    }
}

// =============================================================================
// Transaction Steps
// =============================================================================

/// Claims the next invoice number. Must be the first statement of the
/// transaction.
async fn claim_invoice_number(
    conn: &mut SqliteConnection,
    settings: &StoreSettings,
    now: DateTime<Utc>,
) -> EngineResult<String> {
    let date = now.with_timezone(&Local).date_naive();
    let scope = settings.sequence_reset.scope(date);
    let seq = SequenceRepository::next_value(conn, &scope, now).await?;

    Ok(settings.invoice_template.render(date, seq))
}

/// Prices `items` and reserves their stock.
///
/// With `resume_from`, the hold is deleted (compare-and-delete, so it can
/// feed at most one order) and its reserved quantities count as available:
/// only the difference is taken from or returned to stock.
async fn reserve_cart(
    conn: &mut SqliteConnection,
    settings: &StoreSettings,
    cashier_id: &str,
    items: &[CartLine],
    resume_from: Option<&str>,
    now: DateTime<Utc>,
) -> EngineResult<Placement> {
    // product_id -> (sku, quantity) already out of stock for the hold
    let mut held: HashMap<String, (String, i64)> = HashMap::new();

    if let Some(hold_id) = resume_from {
        OrderRepository::find_hold_in(conn, hold_id, cashier_id)
            .await?
            .ok_or_else(|| CoreError::HoldNotFound(hold_id.to_string()))?;

        for line in OrderRepository::get_lines_in(conn, hold_id).await? {
            held.entry(line.product_id)
                .or_insert_with(|| (line.sku, 0))
                .1 += line.quantity;
        }

        if !OrderRepository::delete_hold_in(conn, hold_id, cashier_id).await? {
            return Err(CoreError::HoldNotFound(hold_id.to_string()).into());
        }
        debug!(hold_id = %hold_id, "Hold consumed");
    }

    let ids: Vec<String> = items.iter().map(|line| line.product_id.clone()).collect();
    let products = ProductRepository::fetch_many(conn, &ids).await?;

    let reserved: HashMap<String, i64> = held
        .iter()
        .map(|(product_id, (_, quantity))| (product_id.clone(), *quantity))
        .collect();
    let lines = price_cart(items, &products, &reserved)?;
    let totals = totals_for_lines(&lines, settings.discount, settings.tax);

    let mut movements = Vec::with_capacity(lines.len());
    for line in &lines {
        let already = held.remove(&line.product_id).map(|(_, q)| q).unwrap_or(0);
        let needed = line.quantity - already;

        if needed > 0 {
            if !ProductRepository::reserve(conn, &line.product_id, needed, now).await? {
                let stock = ProductRepository::stock_of(conn, &line.product_id)
                    .await?
                    .unwrap_or(0);
                return Err(CoreError::OutOfStock {
                    sku: line.sku.clone(),
                    available: stock + already,
                    requested: line.quantity,
                }
                .into());
            }
        } else if needed < 0 {
            ProductRepository::release(conn, &line.product_id, -needed, now).await?;
        }

        if needed != 0 {
            movements.push(StockMovement {
                product_id: line.product_id.clone(),
                sku: line.sku.clone(),
                delta: -needed,
            });
        }
    }

    // Products dropped from the resumed cart go back on the shelf.
    for (product_id, (sku, quantity)) in held {
        ProductRepository::release(conn, &product_id, quantity, now).await?;
        movements.push(StockMovement {
            product_id,
            sku,
            delta: quantity,
        });
    }

    Ok(Placement {
        lines,
        totals,
        movements,
    })
}

/// A pending order header; callers adjust status and payment fields.
fn draft_order(
    invoice_number: String,
    cashier_id: &str,
    totals: &OrderTotals,
    note: Option<String>,
    suspended_from_id: Option<String>,
    now: DateTime<Utc>,
) -> Order {
    Order {
        id: new_id(),
        invoice_number,
        status: OrderStatus::Pending,
        payment_method: PaymentMethod::Cash,
        subtotal: totals.subtotal,
        discount_amount: totals.discount_amount,
        tax_amount: totals.tax_amount,
        total: totals.total,
        paid_amount: 0,
        change_amount: 0,
        note,
        suspended_from_id,
        user_id: cashier_id.to_string(),
        created_at: now,
        updated_at: now,
        paid_at: None,
    }
}

fn order_lines(order_id: &str, lines: &[PricedLine], now: DateTime<Utc>) -> Vec<OrderLine> {
    lines
        .iter()
        .map(|line| OrderLine {
            id: new_id(),
            order_id: order_id.to_string(),
            product_id: line.product_id.clone(),
            sku: line.sku.clone(),
            name: line.name.clone(),
            quantity: line.quantity,
            unit_price: line.unit_price,
            line_total: line.line_total,
            created_at: now,
        })
        .collect()
}

/// Maps an order to the gateway's request. Discount and tax ride along as
/// adjustment items so the items add up to the amount charged.
fn session_request(settings: &StoreSettings, order: &Order, lines: &[PricedLine]) -> SessionRequest {
    let mut items: Vec<SessionItem> = lines
        .iter()
        .map(|line| SessionItem {
            id: line.product_id.clone(),
            name: line.name.clone(),
            price: line.unit_price,
            quantity: line.quantity,
        })
        .collect();

    if order.discount_amount != 0 {
        items.push(SessionItem {
            id: "DISCOUNT".to_string(),
            name: "Discount".to_string(),
            price: -order.discount_amount,
            quantity: 1,
        });
    }
    if order.tax_amount != 0 {
        items.push(SessionItem {
            id: "TAX".to_string(),
            name: "Tax".to_string(),
            price: order.tax_amount,
            quantity: 1,
        });
    }

    SessionRequest {
        order_id: order.id.clone(),
        reference: order.invoice_number.clone(),
        amount: order.total,
        currency: settings.currency.clone(),
        currency_decimals: settings.currency_decimals,
        items,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
