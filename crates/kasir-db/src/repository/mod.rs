//! # Repository Module
//!
//! Database repository implementations for Kasir.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern                                   │
//! │                                                                         │
//! │  kasir-engine                                                          │
//! │       │                                                                 │
//! │       │  db.orders().list_holds(user_id, 50)        (pool, read)       │
//! │       │  ProductRepository::reserve(&mut tx, ...)   (in transaction)   │
//! │       ▼                                                                 │
//! │  Repository                                                            │
//! │       │  SQL Query                                                      │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`cashier::CashierRepository`] - Cashier (user) rows
//! - [`product::ProductRepository`] - Catalog lookup and stock reservation
//! - [`order::OrderRepository`] - Orders, lines and holds
//! - [`payment::PaymentRepository`] - Gateway payment attempts
//! - [`shift::ShiftRepository`] - Shifts and their paid-order aggregates
//! - [`sequence::SequenceRepository`] - Invoice number counters

pub mod cashier;
pub mod order;
pub mod payment;
pub mod product;
pub mod sequence;
pub mod shift;

#[cfg(test)]
pub(crate) mod test_support {
    use chrono::Utc;
    use kasir_core::{Cashier, Product};

    use crate::{new_id, Database, DbConfig};

    pub async fn database() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    pub async fn cashier(db: &Database, name: &str) -> Cashier {
        let cashier = Cashier {
            id: new_id(),
            name: name.to_string(),
            created_at: Utc::now(),
        };
        db.cashiers().insert(&cashier).await.unwrap();
        cashier
    }

    pub async fn product(db: &Database, sku: &str, price: i64, stock: i64) -> Product {
        let now = Utc::now();
        let product = Product {
            id: new_id(),
            sku: sku.to_string(),
            name: format!("Product {}", sku),
            price,
            stock,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        db.products().insert(&product).await.unwrap()
    }
}
