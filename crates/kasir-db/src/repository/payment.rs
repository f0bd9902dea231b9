//! # Payment Repository
//!
//! Gateway payment attempts. A row is created `pending` at checkout and
//! closed exactly once by the webhook reconciler.
//!
//! ```text
//!   insert()  ──►  pending  ──close()──►  settled | expired | canceled | denied | failed
//!                              │
//!                              └── WHERE status = 'pending': a second close of
//!                                  the same row affects 0 rows and changes nothing
//! ```

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use kasir_core::{Payment, PaymentStatus};

const PAYMENT_COLUMNS: &str = r#"
    id, order_id, method, provider, provider_reference, status,
    amount, metadata, paid_at, created_at, updated_at
"#;

/// Repository for payment attempts.
#[derive(Debug, Clone)]
pub struct PaymentRepository {
    pool: SqlitePool,
}

impl PaymentRepository {
    /// Creates a new PaymentRepository.
    pub fn new(pool: SqlitePool) -> Self {
        PaymentRepository { pool }
    }

    /// Resolves a payment by the gateway's identifier.
    pub async fn find_by_reference(
        &self,
        provider: &str,
        provider_reference: &str,
    ) -> DbResult<Option<Payment>> {
        let payment = sqlx::query_as::<_, Payment>(&format!(
            "SELECT {} FROM payments WHERE provider = ?1 AND provider_reference = ?2",
            PAYMENT_COLUMNS
        ))
        .bind(provider)
        .bind(provider_reference)
        .fetch_optional(&self.pool)
        .await?;

        Ok(payment)
    }

    /// Gets a payment by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Payment>> {
        let payment = sqlx::query_as::<_, Payment>(&format!(
            "SELECT {} FROM payments WHERE id = ?1",
            PAYMENT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(payment)
    }

    /// All attempts for an order, oldest first.
    pub async fn list_for_order(&self, order_id: &str) -> DbResult<Vec<Payment>> {
        let payments = sqlx::query_as::<_, Payment>(&format!(
            "SELECT {} FROM payments WHERE order_id = ?1 ORDER BY created_at, rowid",
            PAYMENT_COLUMNS
        ))
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(payments)
    }

    /// The most recent attempt for an order.
    pub async fn latest_for_order(&self, order_id: &str) -> DbResult<Option<Payment>> {
        let payment = sqlx::query_as::<_, Payment>(&format!(
            "SELECT {} FROM payments WHERE order_id = ?1 ORDER BY created_at DESC, rowid DESC LIMIT 1",
            PAYMENT_COLUMNS
        ))
        .bind(order_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(payment)
    }

    // =========================================================================
    // Transactional statements
    // =========================================================================

    /// Inserts a payment attempt.
    ///
    /// ## Errors
    /// * `DbError::UniqueViolation` on `payments.provider, payments.provider_reference`
    ///   when the gateway hands out a reference that is already recorded
    pub async fn insert(conn: &mut SqliteConnection, payment: &Payment) -> DbResult<()> {
        debug!(
            order_id = %payment.order_id,
            provider = %payment.provider,
            reference = %payment.provider_reference,
            "Recording payment attempt"
        );

        sqlx::query(
            r#"
            INSERT INTO payments (
                id, order_id, method, provider, provider_reference, status,
                amount, metadata, paid_at, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
        )
        .bind(&payment.id)
        .bind(&payment.order_id)
        .bind(payment.method)
        .bind(&payment.provider)
        .bind(&payment.provider_reference)
        .bind(payment.status)
        .bind(payment.amount)
        .bind(&payment.metadata)
        .bind(payment.paid_at)
        .bind(payment.created_at)
        .bind(payment.updated_at)
        .execute(conn)
        .await?;

        Ok(())
    }

    /// Closes a pending payment with a terminal status.
    ///
    /// `paid_at` is recorded only for `Settled`.
    ///
    /// ## Returns
    /// * `Ok(true)` - This call made the transition
    /// * `Ok(false)` - The payment was already terminal; nothing changed
    pub async fn close(
        conn: &mut SqliteConnection,
        payment_id: &str,
        status: PaymentStatus,
        now: DateTime<Utc>,
    ) -> DbResult<bool> {
        debug!(payment_id = %payment_id, status = status.as_str(), "Closing payment");

        let paid_at = (status == PaymentStatus::Settled).then_some(now);

        let result = sqlx::query(
            r#"
            UPDATE payments
            SET status = ?2, paid_at = ?3, updated_at = ?4
            WHERE id = ?1 AND status = 'pending'
            "#,
        )
        .bind(payment_id)
        .bind(status)
        .bind(paid_at)
        .bind(now)
        .execute(conn)
        .await?;

        Ok(result.rows_affected() == 1)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
