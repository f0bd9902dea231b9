//! # kasir-db: Database Layer for Kasir
//!
//! Database access for the Kasir back office: SQLite through sqlx, with
//! every SQL statement living in one of the repositories below.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Kasir Data Flow                                  │
//! │                                                                         │
//! │  kasir-engine (checkout, webhook, end_shift)                           │
//! │       │   begins a transaction, passes &mut SqliteConnection           │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     kasir-db (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌────────────────┐   ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories  │   │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │                │   │  (embedded)  │  │   │
//! │  │   │               │    │ ProductRepo    │   │              │  │   │
//! │  │   │ SqlitePool    │◄───│ OrderRepo      │   │ 001_initial_ │  │   │
//! │  │   │ begin()       │    │ PaymentRepo    │   │   schema.sql │  │   │
//! │  │   │               │    │ ShiftRepo      │   │              │  │   │
//! │  │   │               │    │ SequenceRepo   │   │              │  │   │
//! │  │   └───────────────┘    └────────────────┘   └──────────────┘  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite database (WAL)                                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Two Kinds of Repository Methods
//!
//! - `&self` methods run directly on the pool. They are single statements
//!   or plain reads.
//! - Associated functions taking `conn: &mut SqliteConnection` are the
//!   statements the engine composes inside one transaction (stock
//!   reservation, order insert, payment close, ...).
//!
//! ## Usage
//!
//! ```rust,ignore
//! use kasir_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("kasir.db")).await?;
//! let product = db.products().get_by_sku("KOPI-250").await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::cashier::CashierRepository;
pub use repository::order::OrderRepository;
pub use repository::payment::PaymentRepository;
pub use repository::product::ProductRepository;
pub use repository::sequence::SequenceRepository;
pub use repository::shift::ShiftRepository;

/// Generates a new primary key.
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
