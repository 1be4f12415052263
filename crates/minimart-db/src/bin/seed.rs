//! # Seed Data Generator
//!
//! Populates the database with development data: categories, suppliers,
//! a small catalog, and a demo discount.
//!
//! ## Usage
//! ```bash
//! cargo run -p minimart-db --bin seed
//! cargo run -p minimart-db --bin seed -- --db ./data/minimart.db
//! ```
//!
//! Products are created with zero stock; bring inventory in with a
//! purchase order so the ledger stays truthful. Users are not seeded here;
//! the server bootstraps the initial admin account on first start.

use chrono::{Duration, Utc};
use std::env;

use minimart_core::{DiscountType, Money};
use minimart_db::repository::category::NewCategory;
use minimart_db::repository::discount::NewDiscount;
use minimart_db::repository::product::NewProduct;
use minimart_db::repository::supplier::NewSupplier;
use minimart_db::{Database, DbConfig};

const CATALOG: &[(&str, &[(&str, i64, i64)])] = &[
    (
        "Beverages",
        &[
            ("Bottled Water 500ml", 3_000, 5_000),
            ("Green Tea 450ml", 7_000, 10_000),
            ("Cola 330ml", 6_000, 9_000),
            ("Orange Juice 1L", 18_000, 25_000),
        ],
    ),
    (
        "Snacks",
        &[
            ("Potato Chips 60g", 8_000, 12_000),
            ("Chocolate Bar", 10_000, 15_000),
            ("Instant Noodles", 4_000, 6_000),
        ],
    ),
    (
        "Household",
        &[
            ("Dish Soap 750ml", 22_000, 30_000),
            ("Paper Towels", 15_000, 21_000),
        ],
    ),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let db_path = parse_db_path().unwrap_or_else(|| "./minimart.db".to_string());

    println!("Seeding database at {db_path}");
    let db = Database::new(DbConfig::new(&db_path)).await?;

    let mut barcode_seq: i64 = 8_930_000_000_001;
    let mut product_count = 0;

    for (category_name, products) in CATALOG {
        let category = db
            .categories()
            .insert(NewCategory {
                category_name: category_name.to_string(),
                description: None,
            })
            .await?;

        for (name, purchase_price, sale_price) in *products {
            db.products()
                .insert(NewProduct {
                    product_name: name.to_string(),
                    barcode: Some(barcode_seq.to_string()),
                    category_id: Some(category.category_id.clone()),
                    purchase_price: Money::new(*purchase_price),
                    sale_price: Money::new(*sale_price),
                    unit: None,
                    min_stock: 5,
                })
                .await?;
            barcode_seq += 1;
            product_count += 1;
        }
    }

    for name in ["Golden Field Distribution", "City Wholesale"] {
        db.suppliers()
            .insert(NewSupplier {
                supplier_name: name.to_string(),
                contact_person: None,
                phone: None,
                email: None,
                address: None,
            })
            .await?;
    }

    let today = Utc::now().date_naive();
    db.discounts()
        .insert(NewDiscount {
            discount_name: "Opening Week 10%".to_string(),
            discount_type: DiscountType::Percentage,
            discount_value: 10,
            start_date: today,
            end_date: today + Duration::days(7),
            is_active: true,
        })
        .await?;

    println!(
        "Seeded {} categories, {product_count} products, 2 suppliers, 1 discount",
        CATALOG.len()
    );

    db.close().await;
    Ok(())
}

fn parse_db_path() -> Option<String> {
    let args: Vec<String> = env::args().collect();
    args.iter()
        .position(|a| a == "--db")
        .and_then(|i| args.get(i + 1).cloned())
}
