//! # Domain Events
//!
//! Facts the engine announces after a state change commits. Collaborators
//! (the activity log, dashboards) consume them through an [`EventSink`].
//!
//! Emission is fire-and-forget: a sink cannot fail the operation that
//! produced the event, which is why [`EventSink::emit`] returns nothing.

use serde::Serialize;

/// Something that happened in the order-to-payment flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum DomainEvent {
    /// Stock moved for one product. Negative `delta` means reserved.
    StockChanged {
        product_id: String,
        sku: String,
        delta: i64,
        reason: String,
    },
    /// An order (paid, pending or suspended) was persisted.
    TransactionCreated {
        order_id: String,
        invoice_number: String,
        status: String,
        total: i64,
        user_id: String,
    },
    /// A wallet payment settled and its order became paid.
    PaymentSettled {
        order_id: String,
        payment_id: String,
        amount: i64,
    },
    /// A wallet payment reached a non-settled terminal status.
    PaymentClosed {
        order_id: String,
        payment_id: String,
        status: String,
    },
    /// A suspended order was deleted without being resumed.
    HoldDiscarded { order_id: String, user_id: String },
    ShiftOpened {
        shift_id: String,
        user_id: String,
        opening_cash: i64,
    },
    ShiftClosed {
        shift_id: String,
        user_id: String,
        expected_cash: i64,
        variance: i64,
    },
}

impl DomainEvent {
    /// Short machine name, e.g. `payment_settled`.
    pub fn name(&self) -> &'static str {
        match self {
            DomainEvent::StockChanged { .. } => "stock_changed",
            DomainEvent::TransactionCreated { .. } => "transaction_created",
            DomainEvent::PaymentSettled { .. } => "payment_settled",
            DomainEvent::PaymentClosed { .. } => "payment_closed",
            DomainEvent::HoldDiscarded { .. } => "hold_discarded",
            DomainEvent::ShiftOpened { .. } => "shift_opened",
            DomainEvent::ShiftClosed { .. } => "shift_closed",
        }
    }
}

/// Receives domain events.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: &DomainEvent);
}

/// Drops every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&self, _event: &DomainEvent) {}
}
