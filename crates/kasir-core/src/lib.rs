//! # kasir-core: Pure Business Logic for Kasir
//!
//! The order-to-payment rules of the Kasir back office, written as pure
//! functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Kasir Architecture                             │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                  apps/server (axum HTTP)                        │   │
//! │  │   checkout, hold, webhook, start_shift, end_shift, ...          │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │         kasir-engine (transaction boundaries)                   │   │
//! │  └──────────┬──────────────────┬──────────────────────┬────────────┘   │
//! │             │                  │                      │                 │
//! │  ┌──────────▼───────┐ ┌────────▼─────────┐ ┌──────────▼──────────┐     │
//! │  │ ★ kasir-core ★   │ │    kasir-db      │ │   kasir-gateway     │     │
//! │  │  money  pricing  │ │  SQLite repos    │ │  sessions, HMAC     │     │
//! │  │  invoice  types  │ │                  │ │                     │     │
//! │  └──────────────────┘ └──────────────────┘ └─────────────────────┘     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//! ```rust
//! use kasir_core::money::{Money, Rate};
//! use kasir_core::pricing::compute_totals;
//!
//! // 10% discount first, then 11% tax on the discounted base
//! let totals = compute_totals(Money::from_minor(100_000), Rate::from_bps(1000), Rate::from_bps(1100));
//! assert_eq!(totals.discount_amount, 10_000);
//! assert_eq!(totals.total, 99_900);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod events;
pub mod invoice;
pub mod money;
pub mod pricing;
pub mod provider;
pub mod settings;
pub mod shift;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use events::{DomainEvent, EventSink, NullSink};
pub use invoice::{InvoiceTemplate, SequenceReset};
pub use money::{Money, Rate};
pub use pricing::{OrderTotals, PricedLine};
pub use settings::StoreSettings;
pub use shift::{ShiftSummary, ShiftTotals};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum distinct products allowed in a single cart.
pub const MAX_CART_ITEMS: usize = 100;

/// Maximum quantity of a single product in a cart.
///
/// Guards against typing 1000 instead of 10 at the register.
pub const MAX_ITEM_QUANTITY: i64 = 999;

/// Maximum length of a free-text order or shift note.
pub const MAX_NOTE_LENGTH: usize = 500;

/// How many holds `list_holds` returns at most.
pub const HOLD_LIST_LIMIT: u32 = 50;
