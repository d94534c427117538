//! # Seed Data Generator
//!
//! Populates the database with inventory and credit accounts for development.
//!
//! ## Usage
//! ```bash
//! # Seed the default database
//! cargo run -p carton-db --bin seed
//!
//! # Specify database path
//! cargo run -p carton-db --bin seed -- --db ./data/carton.db
//! ```
//!
//! ## Generated Data
//! - Wholesale items across a few categories, each with a carton size,
//!   some full cartons and a handful of loose pieces
//! - A few pieces-only items (no carton size)
//! - Credit accounts for regular customers

use chrono::Utc;
use std::env;

use carton_core::{CreditAccount, InventoryItem, Money};
use carton_db::{Database, DbConfig};

/// (category, [(name, pieces per carton)])
const CATALOG: &[(&str, &[(&str, u32)])] = &[
    (
        "Drinks",
        &[
            ("Green Tea 250ml", 24),
            ("Mango Juice 1L", 12),
            ("Mineral Water 1.5L", 6),
            ("Cola Can 330ml", 24),
            ("Lassi 500ml", 12),
        ],
    ),
    (
        "Snacks",
        &[
            ("Salted Chips 50g", 48),
            ("Nimko Mix 200g", 20),
            ("Chocolate Biscuits", 36),
            ("Peanut Bar", 60),
        ],
    ),
    (
        "Grocery",
        &[
            ("Basmati Rice 5kg", 4),
            ("Cooking Oil 3L", 6),
            ("Red Lentils 1kg", 10),
            ("Sugar 1kg", 10),
            ("Loose Spices", 0),
        ],
    ),
    (
        "Household",
        &[
            ("Dish Soap 500ml", 12),
            ("Laundry Powder 1kg", 10),
            ("Matchbox", 0),
        ],
    ),
];

const CUSTOMERS: &[(&str, i64)] = &[
    ("Bilal Traders", 500_000),
    ("Al-Noor Kiryana", 250_000),
    ("Hamza General Store", 100_000),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Parse command line arguments
    let args: Vec<String> = env::args().collect();

    let mut db_path = String::from("./carton_dev.db");

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
                println!("Carton POS Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./carton_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Carton POS Seed Data Generator");
    println!("=================================");
    println!("Database: {}", db_path);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.items().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} items", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    println!();
    println!("Generating items...");

    let start = std::time::Instant::now();
    let mut generated = 0usize;

    for (category, products) in CATALOG {
        for (name, pieces_per_carton) in products.iter() {
            let item = generate_item(category, name, *pieces_per_carton, generated);

            if let Err(e) = db.items().insert(&item).await {
                eprintln!("Failed to insert {}: {}", item.name, e);
                continue;
            }
            generated += 1;
        }
    }

    println!("✓ Generated {} items in {:?}", generated, start.elapsed());

    println!();
    println!("Generating credit accounts...");
    for (name, credit) in CUSTOMERS {
        let account = CreditAccount {
            id: String::new(),
            name: name.to_string(),
            credit: Money::from_cents(*credit),
            timestamp: Utc::now(),
        };
        db.credits().insert(&account).await?;
        println!("  {} ({})", account.name, account.credit);
    }

    let low = db.items().low_stock().await?;
    println!();
    println!("Low stock items: {}", low.len());
    for item in &low {
        println!("  {} ({} pieces)", item.name, item.total_pieces);
    }

    println!();
    println!("✓ Seed complete!");

    Ok(())
}

/// Builds one item with deterministic counts and prices.
fn generate_item(category: &str, name: &str, pieces_per_carton: u32, seed: usize) -> InventoryItem {
    // Unit cost 0.40 - 8.39, sold at a 20-40% markup
    let actual_cents = 40 + ((seed * 37) % 800) as i64;
    let markup_pct = 120 + (seed % 3) as i64 * 10;
    let selling_cents = actual_cents * markup_pct / 100;

    let (cartons, pieces) = if pieces_per_carton == 0 {
        (0, 20 + (seed % 30) as u32)
    } else {
        ((seed % 7) as u32, (seed % pieces_per_carton as usize) as u32)
    };

    let mut item = InventoryItem {
        id: String::new(),
        name: name.to_string(),
        category: category.to_string(),
        actual_price: Money::from_cents(actual_cents),
        selling_price: Money::from_cents(selling_cents),
        cartons,
        pieces,
        pieces_per_carton,
        total_pieces: 0,
        danger_level: pieces_per_carton.max(10) as u64,
    };
    item.total_pieces = item.computed_total_pieces();
    item
}
