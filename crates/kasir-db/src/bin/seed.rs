//! # Seed Data Generator
//!
//! Populates a database with a demo cashier and a small warung catalog.
//!
//! ## Usage
//! ```bash
//! # Seed ./kasir_dev.db
//! cargo run -p kasir-db --bin seed
//!
//! # Specify database path
//! cargo run -p kasir-db --bin seed -- --db ./data/kasir.db
//! ```
//!
//! The cashier id is printed at the end; send it as `x-cashier-id`.

use chrono::Utc;
use kasir_core::{Cashier, Product};
use kasir_db::{new_id, Database, DbConfig};
use std::env;

/// (sku, name, price in IDR, stock)
const CATALOG: &[(&str, &str, i64, i64)] = &[
    ("KOPI-SUSU", "Kopi Susu Gula Aren", 18_000, 40),
    ("KOPI-HITAM", "Kopi Hitam", 12_000, 40),
    ("TEH-MANIS", "Es Teh Manis", 6_000, 60),
    ("JERUK", "Es Jeruk", 8_000, 30),
    ("NASGOR", "Nasi Goreng Spesial", 25_000, 20),
    ("MIEGOR", "Mie Goreng", 22_000, 20),
    ("ROTI-BKR", "Roti Bakar Cokelat", 15_000, 15),
    ("PISGOR", "Pisang Goreng (5 pcs)", 10_000, 25),
    ("AIR-600", "Air Mineral 600ml", 5_000, 100),
    ("KERUPUK", "Kerupuk", 2_000, 200),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut db_path = String::from("./kasir_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Kasir Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./kasir_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Kasir Seed Data Generator");
    println!("============================");
    println!("Database: {}", db_path);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;
    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.products().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} products", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    let now = Utc::now();
    let cashier = Cashier {
        id: new_id(),
        name: "Kasir Demo".to_string(),
        created_at: now,
    };
    db.cashiers().insert(&cashier).await?;

    let mut generated = 0;
    for (sku, name, price, stock) in CATALOG {
        let product = Product {
            id: new_id(),
            sku: sku.to_string(),
            name: name.to_string(),
            price: *price,
            stock: *stock,
            is_active: true,
            created_at: now,
            updated_at: now,
        };

        if let Err(e) = db.products().insert(&product).await {
            eprintln!("Failed to insert {}: {}", product.sku, e);
            continue;
        }
        generated += 1;
    }

    println!();
    println!("✓ Inserted {} products", generated);
    println!("✓ Cashier: {} ({})", cashier.name, cashier.id);
    println!();
    println!("✓ Seed complete!");

    Ok(())
}
