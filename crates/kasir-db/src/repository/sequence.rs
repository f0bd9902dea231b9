//! # Invoice Sequence Repository
//!
//! Monotonic counters behind invoice numbers, one row per scope.
//!
//! ```text
//!   INSERT ... ON CONFLICT(scope) DO UPDATE SET last_value = last_value + 1
//!   RETURNING last_value
//! ```
//! The upsert runs inside the checkout transaction: a rolled-back checkout
//! gives its number back, and the write lock it takes serialises
//! concurrent checkouts so no two read the same value.

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::DbResult;

/// Repository for invoice counters.
#[derive(Debug, Clone)]
pub struct SequenceRepository {
    pool: SqlitePool,
}

impl SequenceRepository {
    /// Creates a new SequenceRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SequenceRepository { pool }
    }

    /// Last value handed out for `scope`, if any.
    pub async fn current(&self, scope: &str) -> DbResult<Option<i64>> {
        let value = sqlx::query_scalar::<_, i64>(
            "SELECT last_value FROM invoice_sequences WHERE scope = ?1",
        )
        .bind(scope)
        .fetch_optional(&self.pool)
        .await?;

        Ok(value)
    }

    /// Claims the next value for `scope`, starting at 1.
    pub async fn next_value(
        conn: &mut SqliteConnection,
        scope: &str,
        now: DateTime<Utc>,
    ) -> DbResult<i64> {
        let value = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO invoice_sequences (scope, last_value, updated_at)
            VALUES (?1, 1, ?2)
            ON CONFLICT(scope) DO UPDATE
                SET last_value = last_value + 1, updated_at = excluded.updated_at
            RETURNING last_value
            "#,
        )
        .bind(scope)
        .bind(now)
        .fetch_one(conn)
        .await?;

        debug!(scope = %scope, value, "Claimed invoice sequence");
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support;

    #[tokio::test]
    async fn test_counters_are_per_scope() {
        let db = test_support::database().await;

        {
            let mut conn = db.pool().acquire().await.unwrap();
            assert_eq!(SequenceRepository::next_value(&mut conn, "2026-10-16", Utc::now()).await.unwrap(), 1);
            assert_eq!(SequenceRepository::next_value(&mut conn, "2026-10-16", Utc::now()).await.unwrap(), 2);
            assert_eq!(SequenceRepository::next_value(&mut conn, "2026-10-17", Utc::now()).await.unwrap(), 1);
        }

        assert_eq!(db.sequences().current("2026-10-16").await.unwrap(), Some(2));
        assert_eq!(db.sequences().current("global").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_rollback_returns_the_number() {
        let db = test_support::database().await;

        {
            let mut tx = db.begin().await.unwrap();
            assert_eq!(SequenceRepository::next_value(&mut tx, "global", Utc::now()).await.unwrap(), 1);
            tx.rollback().await.unwrap();
        }

        let mut tx = db.begin().await.unwrap();
        assert_eq!(SequenceRepository::next_value(&mut tx, "global", Utc::now()).await.unwrap(), 1);
        tx.commit().await.unwrap();
    }
}
