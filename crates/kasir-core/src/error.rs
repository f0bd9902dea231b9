//! # Error Types
//!
//! Domain-specific error types for kasir-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  kasir-core errors (this file)                                         │
//! │  ├── CoreError        - Domain rule violations                         │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  kasir-db errors       └── DbError       - Database failures           │
//! │  kasir-gateway errors  └── GatewayError  - Provider failures           │
//! │  kasir-engine errors   └── EngineError   - Taxonomy for callers        │
//! │  server errors         └── ApiError      - What HTTP clients see       │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → EngineError → ApiError → Client   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (SKU, ID, etc.)
//! 3. Errors are enum variants, never String
//! 4. Each error variant maps to a user-facing message

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
///
/// These represent business rule violations. The engine sorts them into
/// validation failures and conflicts before they reach a caller.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Checkout or hold was attempted with no lines.
    #[error("Cart is empty")]
    EmptyCart,

    /// The same product appears on two cart lines.
    #[error("Product {0} appears more than once in the cart")]
    DuplicateProduct(String),

    /// Cart has exceeded maximum allowed lines.
    #[error("Cart cannot have more than {max} items")]
    CartTooLarge { max: usize },

    /// Product cannot be found (or is no longer active).
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// Remaining stock is below the requested quantity.
    ///
    /// ## User Workflow
    /// ```text
    /// Checkout [{X, qty: 5}]
    ///      │
    ///      ▼
    /// Catalog says stock = 3
    ///      │
    ///      ▼
    /// OutOfStock { sku: "X", available: 3, requested: 5 }
    ///      │
    ///      ▼
    /// Register shows: "Only 3 X in stock"
    /// ```
    #[error("Out of stock for {sku}: available {available}, requested {requested}")]
    OutOfStock {
        sku: String,
        available: i64,
        requested: i64,
    },

    /// Cash tendered does not cover the order total.
    #[error("Insufficient payment: total {total}, tendered {tendered}")]
    InsufficientPayment { total: i64, tendered: i64 },

    /// Order cannot be found.
    #[error("Order not found: {0}")]
    OrderNotFound(String),

    /// Hold cannot be found, is not suspended, or belongs to another cashier.
    #[error("Hold not found: {0}")]
    HoldNotFound(String),

    /// The cashier id names no cashier row.
    #[error("Unknown cashier: {0}")]
    UnknownCashier(String),

    /// Cashier already has an open shift.
    #[error("Cashier {user_id} already has an open shift")]
    ShiftAlreadyOpen { user_id: String },

    /// Cashier has no open shift to close.
    #[error("Cashier {user_id} has no open shift")]
    NoOpenShift { user_id: String },

    /// Invoice number template is unusable.
    #[error("Invalid invoice template '{template}': {reason}")]
    InvalidTemplate { template: String, reason: String },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Field-level failures, reported to JSON callers as structured errors
/// keyed by `field`.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must not be negative.
    #[error("{field} must not be negative")]
    MustNotBeNegative { field: String },

    /// Invalid format (e.g., invalid UUID, invalid SKU).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

impl ValidationError {
    /// Name of the offending field.
    pub fn field(&self) -> &str {
        match self {
            ValidationError::Required { field }
            | ValidationError::TooLong { field, .. }
            | ValidationError::OutOfRange { field, .. }
            | ValidationError::MustBePositive { field }
            | ValidationError::MustNotBeNegative { field }
            | ValidationError::InvalidFormat { field, .. } => field,
        }
    }
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
