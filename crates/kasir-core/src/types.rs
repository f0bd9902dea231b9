//! # Domain Types
//!
//! Core domain types used throughout Kasir.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │     Order       │   │    Payment      │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  id (UUID)      │   │  id (UUID)      │       │
//! │  │  sku (business) │   │  invoice_number │   │  order_id (FK)  │       │
//! │  │  price          │   │  status         │   │  provider_ref   │       │
//! │  │  stock          │   │  total          │   │  status         │       │
//! │  └─────────────────┘   └────────┬────────┘   └─────────────────┘       │
//! │                                 │ 1..n                                  │
//! │                        ┌────────▼────────┐   ┌─────────────────┐       │
//! │                        │   OrderLine     │   │     Shift       │       │
//! │                        │  unit_price     │   │  opening_cash   │       │
//! │                        │  (snapshot)     │   │  closing_cash?  │       │
//! │                        └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Order Lifecycle
//! ```text
//!            checkout(cash) ─────────────────────────────► Paid
//!            checkout(wallet) ──► Pending ── settlement ──► Paid
//!            hold ──────────────► Suspended ── resume ──► (row deleted,
//!                                     │                    new order)
//!                                     └── discard ──► (row deleted)
//! ```
//!
//! Every monetary field is an `i64` in minor units of the store currency.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;

// =============================================================================
// Product
// =============================================================================

/// A catalog entry as seen by the order engine.
///
/// The catalog itself is managed elsewhere; the engine only reads `price`
/// and `stock` and decrements `stock` when it reserves.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Product {
    pub id: String,
    /// Stock Keeping Unit - business identifier.
    pub sku: String,
    pub name: String,
    /// Current selling price in minor units.
    pub price: i64,
    /// Units on hand not yet reserved by an order or hold.
    pub stock: i64,
    /// Whether product is active (soft delete).
    pub is_active: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Returns the price as a Money type.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_minor(self.price)
    }
}

// =============================================================================
// Cashier
// =============================================================================

/// A user who can ring up orders and own shifts.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Cashier {
    pub id: String,
    pub name: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Order Status
// =============================================================================

/// The status of an order ("transaction" in the cashier UI).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Waiting for a wallet payment to settle.
    Pending,
    /// Settled by cash or by a settled wallet payment.
    Paid,
    /// Parked as a hold with its stock reserved.
    Suspended,
    /// Abandoned.
    Canceled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Paid => "paid",
            OrderStatus::Suspended => "suspended",
            OrderStatus::Canceled => "canceled",
        }
    }
}

// =============================================================================
// Payment Method
// =============================================================================

/// How the customer pays.
///
/// Dispatched once at checkout entry: `Cash` settles synchronously,
/// `Wallet` opens a gateway session and settles through the webhook.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Physical cash counted into the drawer.
    Cash,
    /// QRIS-style e-wallet settled through the payment gateway.
    Wallet,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::Wallet => "wallet",
        }
    }
}

// =============================================================================
// Payment Status
// =============================================================================

/// The state of one gateway payment attempt.
///
/// ```text
///              ┌──► Settled
///   Pending ───┼──► Expired
///              ├──► Canceled
///              ├──► Denied
///              └──► Failed
/// ```
/// Every state other than `Pending` is terminal and immutable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Settled,
    Expired,
    Canceled,
    Denied,
    Failed,
}

impl PaymentStatus {
    /// Whether the payment has left `Pending` for good.
    #[inline]
    pub fn is_terminal(&self) -> bool {
        !matches!(self, PaymentStatus::Pending)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Settled => "settled",
            PaymentStatus::Expired => "expired",
            PaymentStatus::Canceled => "canceled",
            PaymentStatus::Denied => "denied",
            PaymentStatus::Failed => "failed",
        }
    }
}

// =============================================================================
// Order
// =============================================================================

/// A priced, line-itemed sale record.
///
/// ## Invariants
/// - `total = subtotal - discount_amount + tax_amount`
/// - all monetary fields are non-negative
/// - `status == Paid` implies `paid_amount >= total` for cash, or a settled
///   payment for wallet
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Order {
    pub id: String,
    /// Human-readable invoice number, unique and immutable.
    pub invoice_number: String,
    pub status: OrderStatus,
    pub payment_method: PaymentMethod,
    pub subtotal: i64,
    pub discount_amount: i64,
    pub tax_amount: i64,
    pub total: i64,
    pub paid_amount: i64,
    pub change_amount: i64,
    pub note: Option<String>,
    /// The hold this order was resumed from, if any.
    pub suspended_from_id: Option<String>,
    /// Owning cashier.
    pub user_id: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
    /// When the order became paid.
    #[ts(as = "Option<String>")]
    pub paid_at: Option<DateTime<Utc>>,
}

impl Order {
    /// Returns the total as Money.
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_minor(self.total)
    }

    #[inline]
    pub fn is_paid(&self) -> bool {
        self.status == OrderStatus::Paid
    }
}

// =============================================================================
// Order Line
// =============================================================================

/// A line item in an order.
/// Uses snapshot pattern to freeze product data at time of sale.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct OrderLine {
    pub id: String,
    pub order_id: String,
    pub product_id: String,
    /// SKU at time of sale (frozen).
    pub sku: String,
    /// Product name at time of sale (frozen).
    pub name: String,
    pub quantity: i64,
    /// Unit price at time of sale (frozen).
    pub unit_price: i64,
    /// `quantity × unit_price`.
    pub line_total: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Payment
// =============================================================================

/// One settlement attempt against the external gateway.
///
/// An order may collect several attempts over time, but at most one of
/// them is `Pending` at once.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Payment {
    pub id: String,
    pub order_id: String,
    pub method: PaymentMethod,
    /// Gateway name, e.g. "snap".
    pub provider: String,
    /// The gateway's identifier for this session, unique per provider.
    pub provider_reference: String,
    pub status: PaymentStatus,
    pub amount: i64,
    /// Opaque session data (token, QR payload, redirect URL) as JSON text.
    pub metadata: String,
    #[ts(as = "Option<String>")]
    pub paid_at: Option<DateTime<Utc>>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Shift
// =============================================================================

/// A cashier's cash-drawer session.
///
/// Open while `ended_at` is `None`; closed shifts are immutable history.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Shift {
    pub id: String,
    pub user_id: String,
    pub opening_cash: i64,
    pub closing_cash: Option<i64>,
    pub notes: Option<String>,
    #[ts(as = "String")]
    pub started_at: DateTime<Utc>,
    #[ts(as = "Option<String>")]
    pub ended_at: Option<DateTime<Utc>>,
}

impl Shift {
    #[inline]
    pub fn is_open(&self) -> bool {
        self.ended_at.is_none()
    }
}

// =============================================================================
// Hold Views
// =============================================================================

/// One row of `list_holds`.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct HoldSummary {
    pub order_id: String,
    pub invoice_number: String,
    pub total: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    pub note: Option<String>,
}

/// A held line as handed back to the register on resume.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct HeldItem {
    pub product_id: String,
    pub quantity: i64,
    /// Unit price frozen when the hold was created.
    pub price: i64,
}

/// Everything the register needs to rebuild a held cart.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ResumedHold {
    pub order_id: String,
    pub note: Option<String>,
    pub items: Vec<HeldItem>,
}

// =============================================================================
// Cart
// =============================================================================

/// One requested line: which product and how many.
///
/// Any client-side price is deliberately absent; orders are always priced
/// from the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CartLine {
    pub product_id: String,
    pub quantity: i64,
}

impl CartLine {
    pub fn new(product_id: impl Into<String>, quantity: i64) -> Self {
        CartLine {
            product_id: product_id.into(),
            quantity,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
