//! # Product Repository
//!
//! Catalog lookup and stock movements.
//!
//! ## Atomic Reservation
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Stock Reservation Strategy                           │
//! │                                                                         │
//! │  ❌ WRONG: read, check, write (two checkouts both see stock = 1)       │
//! │     SELECT stock FROM products WHERE id = ?     -- 1                    │
//! │     UPDATE products SET stock = 0 WHERE id = ?                          │
//! │                                                                         │
//! │  ✅ CORRECT: one conditional statement per line                        │
//! │     UPDATE products SET stock = stock - ?qty                            │
//! │      WHERE id = ? AND stock >= ?qty                                     │
//! │     rows_affected = 0  →  not enough stock, abort the transaction      │
//! │                                                                         │
//! │  Only the product being sold is touched; no range locks.               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::{Executor, QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use kasir_core::Product;

const PRODUCT_COLUMNS: &str = "id, sku, name, price, stock, is_active, created_at, updated_at";

/// Repository for product database operations.
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Gets a product by its ID.
    ///
    /// ## Returns
    /// * `Ok(Some(Product))` - Product found (active or not)
    /// * `Ok(None)` - Product not found
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {} FROM products WHERE id = ?1",
            PRODUCT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Gets a product by its SKU (e.g., "KOPI-250").
    pub async fn get_by_sku(&self, sku: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {} FROM products WHERE sku = ?1",
            PRODUCT_COLUMNS
        ))
        .bind(sku)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Gets every product in `ids` with one query.
    ///
    /// Missing ids are simply absent from the result; order is unspecified.
    pub async fn get_many(&self, ids: &[String]) -> DbResult<Vec<Product>> {
        select_many(&self.pool, ids).await
    }

    /// Same as [`get_many`](Self::get_many), inside an open transaction.
    pub async fn fetch_many(conn: &mut SqliteConnection, ids: &[String]) -> DbResult<Vec<Product>> {
        select_many(conn, ids).await
    }

    /// Inserts a new product.
    ///
    /// ## Returns
    /// * `Ok(Product)` - The inserted product
    /// * `Err(DbError::UniqueViolation)` - SKU already exists
    pub async fn insert(&self, product: &Product) -> DbResult<Product> {
        debug!(sku = %product.sku, "Inserting product");

        sqlx::query(
            r#"
            INSERT INTO products (
                id, sku, name, price, stock, is_active, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&product.id)
        .bind(&product.sku)
        .bind(&product.name)
        .bind(product.price)
        .bind(product.stock)
        .bind(product.is_active)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(product.clone())
    }

    /// Adds received units to a product's stock.
    pub async fn restock(&self, id: &str, quantity: i64) -> DbResult<()> {
        debug!(id = %id, quantity, "Restocking product");

        let mut conn = self.pool.acquire().await?;
        if !Self::release(&mut conn, id, quantity, Utc::now()).await? {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    /// Counts active products (for diagnostics and the seed binary).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE is_active = 1")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    // =========================================================================
    // Transactional statements
    // =========================================================================

    /// Takes `quantity` units out of stock if at least that many remain.
    ///
    /// ## Returns
    /// * `Ok(true)` - Stock decremented
    /// * `Ok(false)` - Not enough stock (or product inactive); nothing changed
    pub async fn reserve(
        conn: &mut SqliteConnection,
        product_id: &str,
        quantity: i64,
        now: DateTime<Utc>,
    ) -> DbResult<bool> {
        debug!(product_id = %product_id, quantity, "Reserving stock");

        let result = sqlx::query(
            r#"
            UPDATE products
            SET stock = stock - ?2, updated_at = ?3
            WHERE id = ?1 AND is_active = 1 AND stock >= ?2
            "#,
        )
        .bind(product_id)
        .bind(quantity)
        .bind(now)
        .execute(conn)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Puts `quantity` units back into stock.
    ///
    /// Returns `false` when the product does not exist.
    pub async fn release(
        conn: &mut SqliteConnection,
        product_id: &str,
        quantity: i64,
        now: DateTime<Utc>,
    ) -> DbResult<bool> {
        debug!(product_id = %product_id, quantity, "Releasing stock");

        let result = sqlx::query(
            "UPDATE products SET stock = stock + ?2, updated_at = ?3 WHERE id = ?1",
        )
        .bind(product_id)
        .bind(quantity)
        .bind(now)
        .execute(conn)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Current stock of one product, read inside the transaction.
    pub async fn stock_of(conn: &mut SqliteConnection, product_id: &str) -> DbResult<Option<i64>> {
        let stock = sqlx::query_scalar::<_, i64>("SELECT stock FROM products WHERE id = ?1")
            .bind(product_id)
            .fetch_optional(conn)
            .await?;

        Ok(stock)
    }
}

async fn select_many<'e, E>(executor: E, ids: &[String]) -> DbResult<Vec<Product>>
where
    E: Executor<'e, Database = Sqlite>,
{
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    let mut builder: QueryBuilder<Sqlite> =
        QueryBuilder::new(format!("SELECT {} FROM products WHERE id IN (", PRODUCT_COLUMNS));
    let mut separated = builder.separated(", ");
    for id in ids {
        separated.push_bind(id);
    }
    separated.push_unseparated(")");

    let products = builder
        .build_query_as::<Product>()
        .fetch_all(executor)
        .await?;

    Ok(products)
}

// =============================================================================
// Unit Tests
// =============================================================================
