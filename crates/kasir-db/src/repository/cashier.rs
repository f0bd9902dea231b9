//! # Cashier Repository
//!
//! The back office does not manage users; authentication lives elsewhere.
//! This repository only keeps the rows orders and shifts point at.

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;
use kasir_core::Cashier;

/// Repository for cashier rows.
#[derive(Debug, Clone)]
pub struct CashierRepository {
    pool: SqlitePool,
}

impl CashierRepository {
    /// Creates a new CashierRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CashierRepository { pool }
    }

    /// Inserts a cashier.
    pub async fn insert(&self, cashier: &Cashier) -> DbResult<()> {
        debug!(id = %cashier.id, "Inserting cashier");

        sqlx::query("INSERT INTO users (id, name, created_at) VALUES (?1, ?2, ?3)")
            .bind(&cashier.id)
            .bind(&cashier.name)
            .bind(cashier.created_at)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Gets a cashier by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Cashier>> {
        let cashier = sqlx::query_as::<_, Cashier>(
            "SELECT id, name, created_at FROM users WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(cashier)
    }
}

#[cfg(test)]
mod tests {
    use crate::repository::test_support;

    #[tokio::test]
    async fn test_insert_and_get() {
        let db = test_support::database().await;
        let cashier = test_support::cashier(&db, "Sari").await;

        let found = db.cashiers().get_by_id(&cashier.id).await.unwrap().unwrap();
        assert_eq!(found.name, "Sari");
        assert!(db.cashiers().get_by_id("missing").await.unwrap().is_none());
    }
}
