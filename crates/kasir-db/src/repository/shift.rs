//! # Shift Repository
//!
//! Cash-drawer shifts and the paid-order aggregates of a shift window.
//!
//! ## One Open Shift per Cashier
//! The partial unique index `idx_shifts_one_open ON shifts(user_id) WHERE
//! ended_at IS NULL` makes a second `open()` for the same cashier fail with
//! a UNIQUE violation on `shifts.user_id`, even under concurrent requests.

use chrono::{DateTime, Utc};
use sqlx::{Executor, Sqlite, SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use kasir_core::{Shift, ShiftTotals};

const SHIFT_COLUMNS: &str =
    "id, user_id, opening_cash, closing_cash, notes, started_at, ended_at";

/// Repository for shifts.
#[derive(Debug, Clone)]
pub struct ShiftRepository {
    pool: SqlitePool,
}

impl ShiftRepository {
    /// Creates a new ShiftRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ShiftRepository { pool }
    }

    /// Inserts a new open shift.
    ///
    /// ## Errors
    /// * `DbError::UniqueViolation` on `shifts.user_id` - already open
    pub async fn open(&self, shift: &Shift) -> DbResult<()> {
        debug!(user_id = %shift.user_id, opening_cash = shift.opening_cash, "Opening shift");

        sqlx::query(
            r#"
            INSERT INTO shifts (id, user_id, opening_cash, closing_cash, notes, started_at, ended_at)
            VALUES (?1, ?2, ?3, NULL, ?4, ?5, NULL)
            "#,
        )
        .bind(&shift.id)
        .bind(&shift.user_id)
        .bind(shift.opening_cash)
        .bind(&shift.notes)
        .bind(shift.started_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// The cashier's open shift, if any.
    pub async fn find_open(&self, user_id: &str) -> DbResult<Option<Shift>> {
        let shift = sqlx::query_as::<_, Shift>(&format!(
            "SELECT {} FROM shifts WHERE user_id = ?1 AND ended_at IS NULL",
            SHIFT_COLUMNS
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(shift)
    }

    /// Paid-order aggregates for `[from, to)` on the pool.
    pub async fn totals(
        &self,
        user_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> DbResult<ShiftTotals> {
        select_totals(&self.pool, user_id, from, to).await
    }

    // =========================================================================
    // Transactional statements
    // =========================================================================

    /// Closes the cashier's open shift and returns the closed row.
    ///
    /// Returns `None` when the cashier has no open shift.
    pub async fn close(
        conn: &mut SqliteConnection,
        user_id: &str,
        closing_cash: i64,
        notes: Option<&str>,
        ended_at: DateTime<Utc>,
    ) -> DbResult<Option<Shift>> {
        debug!(user_id = %user_id, closing_cash, "Closing shift");

        let shift = sqlx::query_as::<_, Shift>(&format!(
            r#"
            UPDATE shifts
            SET closing_cash = ?2, ended_at = ?3, notes = COALESCE(?4, notes)
            WHERE user_id = ?1 AND ended_at IS NULL
            RETURNING {}
            "#,
            SHIFT_COLUMNS
        ))
        .bind(user_id)
        .bind(closing_cash)
        .bind(ended_at)
        .bind(notes)
        .fetch_optional(conn)
        .await?;

        Ok(shift)
    }

    /// Paid-order aggregates for `[from, to)` inside a transaction.
    pub async fn totals_in(
        conn: &mut SqliteConnection,
        user_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> DbResult<ShiftTotals> {
        select_totals(conn, user_id, from, to).await
    }
}

/// Sums the totals of the cashier's paid orders whose `paid_at` falls in
/// `[from, to)`, split by payment method.
async fn select_totals<'e, E>(
    executor: E,
    user_id: &str,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
) -> DbResult<ShiftTotals>
where
    E: Executor<'e, Database = Sqlite>,
{
    let totals = sqlx::query_as::<_, ShiftTotals>(
        r#"
        SELECT
            COALESCE(SUM(CASE WHEN payment_method = 'cash' THEN total ELSE 0 END), 0) AS cash_total,
            COALESCE(SUM(CASE WHEN payment_method = 'wallet' THEN total ELSE 0 END), 0) AS wallet_total,
            COUNT(*) AS transaction_count
        FROM orders
        WHERE user_id = ?1
          AND status = 'paid'
          AND paid_at >= ?2
          AND paid_at < ?3
        "#,
    )
    .bind(user_id)
    .bind(from)
    .bind(to)
    .fetch_one(executor)
    .await?;

    Ok(totals)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::order::OrderRepository;
    use crate::repository::test_support;
    use crate::{new_id, Database};
    use chrono::Duration;
    use kasir_core::{Order, OrderStatus, PaymentMethod};

    fn shift(user_id: &str, opening_cash: i64) -> Shift {
        Shift {
            id: new_id(),
            user_id: user_id.to_string(),
            opening_cash,
            closing_cash: None,
            notes: None,
            started_at: Utc::now(),
            ended_at: None,
        }
    }

    async fn paid_order(
        db: &Database,
        user_id: &str,
        method: PaymentMethod,
        total: i64,
        paid_at: Option<DateTime<Utc>>,
    ) {
        let now = Utc::now();
        let order = Order {
            id: new_id(),
            invoice_number: new_id(),
            status: if paid_at.is_some() { OrderStatus::Paid } else { OrderStatus::Pending },
            payment_method: method,
            subtotal: total,
            discount_amount: 0,
            tax_amount: 0,
            total,
            paid_amount: if paid_at.is_some() { total } else { 0 },
            change_amount: 0,
            note: None,
            suspended_from_id: None,
            user_id: user_id.to_string(),
            created_at: now,
            updated_at: now,
            paid_at,
        };
        let mut conn = db.pool().acquire().await.unwrap();
        OrderRepository::insert(&mut conn, &order).await.unwrap();
    }

    #[tokio::test]
    async fn test_one_open_shift_per_cashier() {
        let db = test_support::database().await;
        let cashier = test_support::cashier(&db, "Budi").await;

        db.shifts().open(&shift(&cashier.id, 100_000)).await.unwrap();
        let err = db.shifts().open(&shift(&cashier.id, 0)).await.unwrap_err();
        assert!(err.is_unique_on("shifts.user_id"));

        let open = db.shifts().find_open(&cashier.id).await.unwrap().unwrap();
        assert_eq!(open.opening_cash, 100_000);
        assert!(open.is_open());
    }

    #[tokio::test]
    async fn test_close_then_reopen() {
        let db = test_support::database().await;
        let cashier = test_support::cashier(&db, "Budi").await;
        db.shifts().open(&shift(&cashier.id, 50_000)).await.unwrap();

        let closed = {
            let mut conn = db.pool().acquire().await.unwrap();
            let closed = ShiftRepository::close(&mut conn, &cashier.id, 70_000, Some("ok"), Utc::now())
                .await
                .unwrap()
                .unwrap();
            assert!(ShiftRepository::close(&mut conn, &cashier.id, 1, None, Utc::now())
                .await
                .unwrap()
                .is_none());
            closed
        };

        assert_eq!(closed.closing_cash, Some(70_000));
        assert_eq!(closed.notes.as_deref(), Some("ok"));
        assert!(!closed.is_open());

        assert!(db.shifts().find_open(&cashier.id).await.unwrap().is_none());
        db.shifts().open(&shift(&cashier.id, 0)).await.unwrap();
    }

    #[tokio::test]
    async fn test_totals_split_by_method_within_window() {
        let db = test_support::database().await;
        let budi = test_support::cashier(&db, "Budi").await;
        let sari = test_support::cashier(&db, "Sari").await;

        let from = Utc::now();
        let inside = from + Duration::seconds(1);
        let to = from + Duration::seconds(10);

        paid_order(&db, &budi.id, PaymentMethod::Cash, 10_000, Some(inside)).await;
        paid_order(&db, &budi.id, PaymentMethod::Cash, 5_000, Some(inside)).await;
        paid_order(&db, &budi.id, PaymentMethod::Wallet, 7_000, Some(inside)).await;
        // outside the window, unpaid, or another cashier
        paid_order(&db, &budi.id, PaymentMethod::Cash, 99_000, Some(from - Duration::seconds(1))).await;
        paid_order(&db, &budi.id, PaymentMethod::Cash, 99_000, Some(to)).await;
        paid_order(&db, &budi.id, PaymentMethod::Wallet, 99_000, None).await;
        paid_order(&db, &sari.id, PaymentMethod::Cash, 99_000, Some(inside)).await;

        let totals = db.shifts().totals(&budi.id, from, to).await.unwrap();
        assert_eq!(
            totals,
            ShiftTotals {
                cash_total: 15_000,
                wallet_total: 7_000,
                transaction_count: 3,
            }
        );
    }
}
