//! # Schema Migrations
//!
//! SQL files under `migrations/sqlite/` at the workspace root, compiled into
//! the binary and applied when [`crate::Database`] opens.
//!
//! ```text
//! 001_initial_schema.sql   users (cashiers), products, orders, order_lines,
//!                          payments, shifts, invoice_sequences
//! ```
//!
//! Applied files are recorded in `_sqlx_migrations` with their checksum;
//! editing one after release makes startup fail, so changes go in a new
//! `NNN_description.sql`.

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;

static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations/sqlite");

/// Applies every migration not yet recorded.
pub async fn run_migrations(pool: &SqlitePool) -> DbResult<()> {
    MIGRATOR.run(pool).await?;
    debug!(migrations = MIGRATOR.migrations.len(), "Schema up to date");
    Ok(())
}

/// `(embedded, applied)` migration counts.
pub async fn migration_status(pool: &SqlitePool) -> DbResult<(usize, usize)> {
    let applied: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM _sqlx_migrations")
        .fetch_one(pool)
        .await?;

    Ok((MIGRATOR.migrations.len(), applied as usize))
}
