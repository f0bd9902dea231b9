//! # Database Error Types
//!
//! SQLite failures sorted by what the engine does with them.
//!
//! ```text
//! sqlx::Error ──► DbError ──► EngineError ──► ApiError
//!                    │
//!                    ├── UniqueViolation{field}   engine decides: ShiftAlreadyOpen,
//!                    │                            duplicate provider reference, ...
//!                    ├── ForeignKeyViolation      unknown cashier / product
//!                    ├── CheckViolation           negative stock, bad totals
//!                    ├── Busy                     write lock not acquired in time
//!                    └── everything else          internal
//! ```

use thiserror::Error;

/// Database operation errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// A row the caller expected is absent.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// UNIQUE constraint failed.
    ///
    /// `field` is SQLite's column list, e.g.
    /// `payments.provider, payments.provider_reference`.
    ///
    /// ## When This Occurs
    /// - Duplicate invoice number
    /// - Duplicate (provider, provider_reference)
    /// - Second open shift for a cashier
    /// - Duplicate SKU
    #[error("Duplicate {field}")]
    UniqueViolation { field: String },

    /// FOREIGN KEY constraint failed.
    ///
    /// ## When This Occurs
    /// - Unknown cashier id on an order or shift
    /// - Order line naming a product that does not exist
    #[error("Foreign key violation: {0}")]
    ForeignKeyViolation(String),

    /// CHECK constraint failed.
    #[error("Check constraint violation: {0}")]
    CheckViolation(String),

    /// Another connection held the write lock past the busy timeout.
    #[error("Database is busy")]
    Busy,

    /// The pool could not be opened, or has been closed.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// No pooled connection became free within the acquire timeout.
    #[error("Connection pool exhausted")]
    PoolExhausted,

    #[error("Query failed: {0}")]
    QueryFailed(String),
}

impl DbError {
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Whether this is a UNIQUE violation on a column list containing `column`.
    ///
    /// ```rust
    /// use kasir_db::DbError;
    ///
    /// let err = DbError::UniqueViolation { field: "shifts.user_id".to_string() };
    /// assert!(err.is_unique_on("shifts.user_id"));
    /// assert!(!err.is_unique_on("orders.invoice_number"));
    /// ```
    pub fn is_unique_on(&self, column: &str) -> bool {
        matches!(self, DbError::UniqueViolation { field } if field.contains(column))
    }
}

const UNIQUE_FAILED: &str = "UNIQUE constraint failed: ";

impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::not_found("Row", "unknown"),

            sqlx::Error::Database(db_err) => {
                let msg = db_err.message();

                if let Some(columns) = msg.strip_prefix(UNIQUE_FAILED) {
                    DbError::UniqueViolation {
                        field: columns.to_string(),
                    }
                } else if msg.starts_with("FOREIGN KEY constraint failed") {
                    DbError::ForeignKeyViolation(msg.to_string())
                } else if msg.starts_with("CHECK constraint failed") {
                    DbError::CheckViolation(msg.to_string())
                } else if msg.contains("database is locked") || msg.contains("database is busy") {
                    DbError::Busy
                } else {
                    DbError::QueryFailed(msg.to_string())
                }
            }

            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,
            sqlx::Error::PoolClosed => DbError::ConnectionFailed("pool is closed".to_string()),
            other => DbError::QueryFailed(other.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

/// Result type for database operations.
pub type DbResult<T> = Result<T, DbError>;
