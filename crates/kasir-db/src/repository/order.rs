//! # Order Repository
//!
//! Orders ("transactions"), their lines, and the hold view over suspended
//! orders.
//!
//! ## Order Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Order Lifecycle                                   │
//! │                                                                         │
//! │  1. INSERT (inside the checkout transaction)                           │
//! │     ├── insert()       → Order { status: paid | pending | suspended }  │
//! │     └── insert_lines() → OrderLine × n  (unit price snapshot)          │
//! │                                                                         │
//! │  2. SETTLE (webhook transaction)                                       │
//! │     └── mark_paid()    → pending → paid, exactly once                  │
//! │                                                                         │
//! │  3. HOLD END                                                           │
//! │     └── delete_hold()  → suspended row and its lines removed           │
//! │         (resume into a new order, or discard)                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::{Executor, Sqlite, SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use kasir_core::{HoldSummary, Order, OrderLine};

const ORDER_COLUMNS: &str = r#"
    id, invoice_number, status, payment_method,
    subtotal, discount_amount, tax_amount, total,
    paid_amount, change_amount, note, suspended_from_id, user_id,
    created_at, updated_at, paid_at
"#;

const LINE_COLUMNS: &str =
    "id, order_id, product_id, sku, name, quantity, unit_price, line_total, created_at";

/// Repository for order database operations.
#[derive(Debug, Clone)]
pub struct OrderRepository {
    pool: SqlitePool,
}

impl OrderRepository {
    /// Creates a new OrderRepository.
    pub fn new(pool: SqlitePool) -> Self {
        OrderRepository { pool }
    }

    /// Gets an order by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Order>> {
        select_order(&self.pool, id).await
    }

    /// Gets the lines of an order in the order they were rung up.
    pub async fn get_lines(&self, order_id: &str) -> DbResult<Vec<OrderLine>> {
        select_lines(&self.pool, order_id).await
    }

    /// Lists a cashier's holds, newest first.
    pub async fn list_holds(&self, user_id: &str, limit: u32) -> DbResult<Vec<HoldSummary>> {
        let holds = sqlx::query_as::<_, HoldSummary>(
            r#"
            SELECT
                id AS order_id,
                invoice_number,
                total,
                created_at,
                note
            FROM orders
            WHERE user_id = ?1 AND status = 'suspended'
            ORDER BY created_at DESC, rowid DESC
            LIMIT ?2
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(holds)
    }

    /// Finds a hold that belongs to `user_id`.
    ///
    /// Returns `None` when the order does not exist, is not suspended, or
    /// belongs to another cashier.
    pub async fn find_hold(&self, id: &str, user_id: &str) -> DbResult<Option<Order>> {
        let mut conn = self.pool.acquire().await?;
        Self::find_hold_in(&mut conn, id, user_id).await
    }

    /// Deletes a hold (and, by cascade, its lines).
    ///
    /// Compare-and-delete: only a row that is still suspended and owned by
    /// `user_id` is removed, so two concurrent callers cannot both succeed.
    ///
    /// ## Returns
    /// * `Ok(true)` - This call removed the hold
    /// * `Ok(false)` - Nothing matched
    pub async fn delete_hold(&self, id: &str, user_id: &str) -> DbResult<bool> {
        let mut conn = self.pool.acquire().await?;
        Self::delete_hold_in(&mut conn, id, user_id).await
    }

    // =========================================================================
    // Transactional statements
    // =========================================================================

    /// Inserts an order header.
    pub async fn insert(conn: &mut SqliteConnection, order: &Order) -> DbResult<()> {
        debug!(id = %order.id, invoice_number = %order.invoice_number, status = order.status.as_str(), "Inserting order");

        sqlx::query(
            r#"
            INSERT INTO orders (
                id, invoice_number, status, payment_method,
                subtotal, discount_amount, tax_amount, total,
                paid_amount, change_amount, note, suspended_from_id, user_id,
                created_at, updated_at, paid_at
            ) VALUES (
                ?1, ?2, ?3, ?4,
                ?5, ?6, ?7, ?8,
                ?9, ?10, ?11, ?12, ?13,
                ?14, ?15, ?16
            )
            "#,
        )
        .bind(&order.id)
        .bind(&order.invoice_number)
        .bind(order.status)
        .bind(order.payment_method)
        .bind(order.subtotal)
        .bind(order.discount_amount)
        .bind(order.tax_amount)
        .bind(order.total)
        .bind(order.paid_amount)
        .bind(order.change_amount)
        .bind(&order.note)
        .bind(&order.suspended_from_id)
        .bind(&order.user_id)
        .bind(order.created_at)
        .bind(order.updated_at)
        .bind(order.paid_at)
        .execute(conn)
        .await?;

        Ok(())
    }

    /// Inserts order lines.
    ///
    /// ## Snapshot Pattern
    /// SKU, name and unit price are copied onto the line so later catalog
    /// edits never rewrite a sale.
    pub async fn insert_lines(conn: &mut SqliteConnection, lines: &[OrderLine]) -> DbResult<()> {
        for line in lines {
            sqlx::query(
                r#"
                INSERT INTO order_lines (
                    id, order_id, product_id, sku, name,
                    quantity, unit_price, line_total, created_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                "#,
            )
            .bind(&line.id)
            .bind(&line.order_id)
            .bind(&line.product_id)
            .bind(&line.sku)
            .bind(&line.name)
            .bind(line.quantity)
            .bind(line.unit_price)
            .bind(line.line_total)
            .bind(line.created_at)
            .execute(&mut *conn)
            .await?;
        }

        Ok(())
    }

    /// Gets an order inside an open transaction.
    pub async fn get_in(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Order>> {
        select_order(conn, id).await
    }

    /// Gets order lines inside an open transaction.
    pub async fn get_lines_in(conn: &mut SqliteConnection, order_id: &str) -> DbResult<Vec<OrderLine>> {
        select_lines(conn, order_id).await
    }

    /// See [`find_hold`](Self::find_hold).
    pub async fn find_hold_in(
        conn: &mut SqliteConnection,
        id: &str,
        user_id: &str,
    ) -> DbResult<Option<Order>> {
        let order = sqlx::query_as::<_, Order>(&format!(
            "SELECT {} FROM orders WHERE id = ?1 AND user_id = ?2 AND status = 'suspended'",
            ORDER_COLUMNS
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(conn)
        .await?;

        Ok(order)
    }

    /// See [`delete_hold`](Self::delete_hold).
    pub async fn delete_hold_in(conn: &mut SqliteConnection, id: &str, user_id: &str) -> DbResult<bool> {
        debug!(id = %id, user_id = %user_id, "Deleting hold");

        let result = sqlx::query(
            "DELETE FROM orders WHERE id = ?1 AND user_id = ?2 AND status = 'suspended'",
        )
        .bind(id)
        .bind(user_id)
        .execute(conn)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Moves a pending order to paid.
    ///
    /// ## Returns
    /// * `Ok(true)` - The order was pending and is now paid
    /// * `Ok(false)` - The order is not pending; nothing changed
    pub async fn mark_paid(
        conn: &mut SqliteConnection,
        order_id: &str,
        paid_amount: i64,
        paid_at: DateTime<Utc>,
    ) -> DbResult<bool> {
        debug!(order_id = %order_id, paid_amount, "Marking order paid");

        let result = sqlx::query(
            r#"
            UPDATE orders
            SET status = 'paid', paid_amount = ?2, paid_at = ?3, updated_at = ?3
            WHERE id = ?1 AND status = 'pending'
            "#,
        )
        .bind(order_id)
        .bind(paid_amount)
        .bind(paid_at)
        .execute(conn)
        .await?;

        Ok(result.rows_affected() == 1)
    }
}

async fn select_order<'e, E>(executor: E, id: &str) -> DbResult<Option<Order>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let order = sqlx::query_as::<_, Order>(&format!(
        "SELECT {} FROM orders WHERE id = ?1",
        ORDER_COLUMNS
    ))
    .bind(id)
    .fetch_optional(executor)
    .await?;

    Ok(order)
}

async fn select_lines<'e, E>(executor: E, order_id: &str) -> DbResult<Vec<OrderLine>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let lines = sqlx::query_as::<_, OrderLine>(&format!(
        "SELECT {} FROM order_lines WHERE order_id = ?1 ORDER BY rowid",
        LINE_COLUMNS
    ))
    .bind(order_id)
    .fetch_all(executor)
    .await?;

    Ok(lines)
}

// =============================================================================
// Unit Tests
// =============================================================================
