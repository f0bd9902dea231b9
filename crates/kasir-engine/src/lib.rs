//! # kasir-engine: Order-to-Payment Transaction Engine
//!
//! Turns carts into durable, inventory-consistent orders, parks them as
//! holds, settles them in cash or through the payment gateway, reconciles
//! gateway callbacks, and balances cash-drawer shifts.
//!
//! ## Components
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   OrderEngine ─────────────┬──────────────► PaymentGateway             │
//! │   checkout / hold          │ one DB tx      (session, bounded timeout)  │
//! │   list / resume / discard  │                                            │
//! │   get_order / status       ▼                                            │
//! │                     ┌─────────────┐                                     │
//! │   WebhookReconciler │   SQLite    │◄──────── ShiftLedger               │
//! │   handle_callback ─►│ (kasir-db)  │          start / end / current      │
//! │   own tx per call   └─────────────┘          read-only aggregates       │
//! │                            │                                            │
//! │                            ▼                                            │
//! │                     EventSink (activity log)                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Transaction Discipline
//! Checkout and hold claim the invoice number first. The counter upsert
//! takes SQLite's write lock, so the stock check, the conditional stock
//! decrements and the order insert that follow run against a snapshot no
//! other writer can change. Any failure drops the transaction, which rolls
//! back stock, order, lines and the invoice number together.
//!
//! [`StoreSettings`](kasir_core::StoreSettings) is passed into every
//! operation that prices or numbers anything.

pub mod activity;
pub mod checkout;
pub mod error;
pub mod holds;
pub mod reconciler;
pub mod shift;

#[cfg(test)]
mod test_support;

pub use activity::TracingSink;
pub use checkout::{
    CheckoutReceipt, CheckoutRequest, HoldReceipt, HoldRequest, OrderDetail, OrderEngine,
    PaymentStatusView, Tender,
};
pub use error::{EngineError, EngineResult, ErrorKind};
pub use reconciler::{CallbackOutcome, WebhookReconciler};
pub use shift::ShiftLedger;
