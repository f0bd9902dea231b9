//! # Engine Error Types
//!
//! Every failure an engine operation can report, sorted into the categories
//! callers act on.
//!
//! ## Error Categories
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Validation   bad input, nothing persisted         EmptyCart,           │
//! │                                                     InsufficientPayment  │
//! │  Conflict     state does not allow it              OutOfStock(sku),     │
//! │                                                     ShiftAlreadyOpen     │
//! │  NotFound     order / hold absent or not yours     HoldNotFound         │
//! │  External     gateway or caller authenticity       Timeout,             │
//! │                                                     InvalidSignature     │
//! │  Integrity    would merge two different records    duplicate reference, │
//! │                                                     amount mismatch,     │
//! │                                                     UnknownReference     │
//! │  Internal     storage failure                      DbError              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every variant is scoped to one request or callback; none of them leaves
//! a half-applied change behind.

use kasir_core::{CoreError, ValidationError};
use kasir_db::DbError;
use kasir_gateway::GatewayError;
use serde::Serialize;
use thiserror::Error;

/// Result type alias for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Failure category, used by the HTTP layer to pick a status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    Conflict,
    NotFound,
    External,
    Integrity,
    Internal,
}

/// Engine error.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Input rejected before anything was written.
    #[error(transparent)]
    Validation(CoreError),

    /// The current state does not allow the operation.
    #[error(transparent)]
    Conflict(CoreError),

    /// The order or hold does not exist for this caller.
    #[error(transparent)]
    NotFound(CoreError),

    /// The payment gateway failed, or a callback failed authentication.
    ///
    /// ## When This Occurs
    /// - Session creation timed out or the gateway is down (checkout rolled back)
    /// - Webhook signature missing or wrong (no state change)
    /// - Webhook body unparseable
    #[error(transparent)]
    External(GatewayError),

    /// A callback names a provider reference no payment carries.
    #[error("Unknown payment reference: {0}")]
    UnknownReference(String),

    /// The request would silently merge two different records.
    #[error("Integrity violation: {0}")]
    Integrity(String),

    /// Storage failure.
    #[error(transparent)]
    Database(DbError),

    /// Anything else that should not happen.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl EngineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            EngineError::Validation(_) => ErrorKind::Validation,
            EngineError::Conflict(_) => ErrorKind::Conflict,
            EngineError::NotFound(_) => ErrorKind::NotFound,
            EngineError::External(_) => ErrorKind::External,
            EngineError::UnknownReference(_) | EngineError::Integrity(_) => ErrorKind::Integrity,
            EngineError::Database(_) | EngineError::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Field-level detail for validation failures, as `(field, message)`.
    pub fn field_errors(&self) -> Vec<(String, String)> {
        match self {
            EngineError::Validation(CoreError::Validation(err)) => {
                vec![(err.field().to_string(), err.to_string())]
            }
            EngineError::Validation(CoreError::EmptyCart)
            | EngineError::Validation(CoreError::CartTooLarge { .. })
            | EngineError::Validation(CoreError::DuplicateProduct(_)) => {
                vec![("items".to_string(), self.to_string())]
            }
            EngineError::Validation(CoreError::InsufficientPayment { .. }) => {
                vec![("tendered_amount".to_string(), self.to_string())]
            }
            _ => Vec::new(),
        }
    }

    /// Sorts a failed insert of a row owned by `cashier_id`.
    ///
    /// Orders and shifts reference only their cashier, so a foreign key
    /// failure there means the cashier does not exist.
    pub(crate) fn owned_by(cashier_id: &str) -> impl FnOnce(DbError) -> EngineError + '_ {
        move |err| match err {
            DbError::ForeignKeyViolation(_) => {
                EngineError::Validation(CoreError::UnknownCashier(cashier_id.to_string()))
            }
            other => EngineError::Database(other),
        }
    }

    /// Whether the gateway signature check failed.
    pub fn is_invalid_signature(&self) -> bool {
        matches!(self, EngineError::External(GatewayError::InvalidSignature))
    }
}

/// Sorts domain errors into categories.
impl From<CoreError> for EngineError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::OutOfStock { .. }
            | CoreError::ShiftAlreadyOpen { .. }
            | CoreError::NoOpenShift { .. } => EngineError::Conflict(err),
            CoreError::OrderNotFound(_) | CoreError::HoldNotFound(_) => EngineError::NotFound(err),
            _ => EngineError::Validation(err),
        }
    }
}

impl From<ValidationError> for EngineError {
    fn from(err: ValidationError) -> Self {
        EngineError::Validation(CoreError::Validation(err))
    }
}

impl From<DbError> for EngineError {
    fn from(err: DbError) -> Self {
        EngineError::Database(err)
    }
}

impl From<sqlx::Error> for EngineError {
    fn from(err: sqlx::Error) -> Self {
        EngineError::Database(err.into())
    }
}

impl From<GatewayError> for EngineError {
    fn from(err: GatewayError) -> Self {
        EngineError::External(err)
    }
}
