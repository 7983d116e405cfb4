//! # Seed Data Generator
//!
//! Populates the database with demo products for development.
//!
//! ## Usage
//! ```bash
//! # Generate 200 products (default)
//! cargo run -p catalog-db --bin seed
//!
//! # Generate custom amount
//! cargo run -p catalog-db --bin seed -- --count 60
//!
//! # Specify database path
//! cargo run -p catalog-db --bin seed -- --db ./data/catalog.db
//! ```
//!
//! ## Generated Products
//! Each product has:
//! - Unique name: `{base} {variant}`
//! - A category from the table below
//! - Price between 10.00 and 100.00
//! - Roughly two thirds marked available
//! - A handful of rating submissions

use std::env;

use catalog_core::{Product, RatingSubmission, MAX_PRICE, MIN_PRICE};
use catalog_db::{Database, DbConfig};

/// Product categories for realistic demo data
const CATEGORIES: &[(&str, &[&str])] = &[
    (
        "lighting",
        &["Desk Lamp", "Floor Lamp", "Pendant Light", "LED Strip", "Night Light"],
    ),
    (
        "kitchen",
        &["Chef Knife", "Cast Iron Pan", "Kettle", "Cutting Board", "French Press"],
    ),
    (
        "office",
        &["Notebook", "Fountain Pen", "Desk Organizer", "Monitor Stand", "Stapler"],
    ),
    (
        "garden",
        &["Watering Can", "Pruning Shears", "Planter", "Hose Reel", "Bird Feeder"],
    ),
    (
        "outdoor",
        &["Camping Chair", "Lantern", "Cooler Bag", "Hammock", "Picnic Blanket"],
    ),
];

/// Variant suffixes that make names unique
const VARIANTS: &[&str] = &[
    "Classic", "Pro", "Mini", "XL", "Black", "White", "Oak", "Steel",
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut count: usize = 200;
    let mut db_path = String::from("./catalog_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--count" | "-c" => {
                if let Some(value) = args.get(i + 1) {
                    count = value.parse().unwrap_or(count);
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if let Some(value) = args.get(i + 1) {
                    db_path = value.clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Product Catalog Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --count <N>    Number of products to generate (default: 200)");
                println!("  -d, --db <PATH>    Database file path (default: ./catalog_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("Product Catalog Seed Data Generator");
    println!("===================================");
    println!("Database: {}", db_path);
    println!("Products: {}", count);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;
    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.products().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} products", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        db.close().await;
        return Ok(());
    }

    println!();
    println!("Generating products...");

    let start = std::time::Instant::now();
    let mut generated = 0;

    let combinations = CATEGORIES.iter().flat_map(|(category, bases)| {
        bases.iter().flat_map(move |base| {
            VARIANTS
                .iter()
                .map(move |variant| (*category, format!("{} {}", base, variant)))
        })
    });

    for (seed, (category, name)) in combinations.take(count).enumerate() {
        let product = generate_product(category, name, seed);

        let created = match db.products().create(&product).await {
            Ok(created) => created,
            Err(e) => {
                eprintln!("Failed to insert {}: {}", product, e);
                continue;
            }
        };

        if let Some(id) = created.id {
            for value in ratings_for(seed) {
                db.products().rate(id, value).await?;
            }
        }

        generated += 1;
        if generated % 50 == 0 {
            println!("  Generated {} products...", generated);
        }
    }

    let elapsed = start.elapsed();
    println!();
    println!("✓ Generated {} products in {:?}", generated, elapsed);

    let available = db.products().find_by_availability().await?;
    let well_rated = db.products().find_by_rating(4.0).await?;
    println!("  Available: {}", available.len());
    println!("  Rated 4+:  {}", well_rated.len());

    db.close().await;

    println!();
    println!("✓ Seed complete!");

    Ok(())
}

/// Generates a single product with deterministic pseudo-random data.
fn generate_product(category: &str, name: String, seed: usize) -> Product {
    // Spread prices over the allowed range in cents, then back to a float
    let span_cents = ((MAX_PRICE - MIN_PRICE) * 100.0) as usize;
    let price = MIN_PRICE + ((seed * 1_237) % (span_cents + 1)) as f64 / 100.0;

    Product {
        name: Some(name),
        description: format!("{} item #{:04}", category, seed),
        category: Some(category.to_string()),
        price: Some(price),
        available: seed % 3 != 0,
        ..Product::default()
    }
}

/// Zero to four rating submissions per product.
fn ratings_for(seed: usize) -> Vec<RatingSubmission> {
    (0..seed % 5)
        .filter_map(|n| RatingSubmission::new(((seed + n * 3) % 5 + 1) as i64).ok())
        .collect()
}
