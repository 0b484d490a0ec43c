//! # Seed Data Generator
//!
//! Populates the database with a sample catalog for development.
//!
//! ## Usage
//! ```bash
//! # Generate the default sample (60 products)
//! cargo run -p vitrina-db --bin seed
//!
//! # Generate custom amount
//! cargo run -p vitrina-db --bin seed -- --count 200
//!
//! # Specify database path
//! cargo run -p vitrina-db --bin seed -- --db ./data/vitrina.db
//! ```
//!
//! Every generated product has a USDT cost between 0.50 and 25.00 and a
//! profit between 15% and 60%. One in eight uses a fixed sale price, one in
//! ten is inactive.

use std::env;
use vitrina_core::{PriceMode, Product};
use vitrina_db::{Database, DbConfig};

/// Sample categories and product names.
const CATALOG: &[(&str, &[&str])] = &[
    (
        "Víveres",
        &[
            "Harina de maíz",
            "Arroz blanco",
            "Pasta larga",
            "Azúcar refinada",
            "Aceite vegetal",
            "Caraotas negras",
            "Café molido",
            "Sal marina",
        ],
    ),
    (
        "Charcutería",
        &[
            "Queso blanco",
            "Jamón de pierna",
            "Mortadela",
            "Queso amarillo",
            "Salchichas",
        ],
    ),
    (
        "Limpieza",
        &[
            "Detergente en polvo",
            "Cloro",
            "Jabón de panela",
            "Lavaplatos",
            "Suavizante",
        ],
    ),
    (
        "Cuidado personal",
        &[
            "Champú",
            "Crema dental",
            "Desodorante",
            "Papel higiénico",
        ],
    ),
];

/// Presentation variants.
const SIZES: &[&str] = &["500 g", "1 kg", "2 kg"];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut count: usize = 60;
    let mut db_path = String::from("./vitrina_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--count" | "-c" => {
                if i + 1 < args.len() {
                    count = args[i + 1].parse().unwrap_or(count);
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Vitrina Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --count <N>    Number of products to generate (default: 60)");
                println!("  -d, --db <PATH>    Database file path (default: ./vitrina_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("Vitrina Seed Data Generator");
    println!("===========================");
    println!("Database: {}", db_path);
    println!("Products: {}", count);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;
    println!("✓ Connected, migrations applied");

    let existing = db.products().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} products", existing);
        println!("  Skipping seed to avoid duplicates.");
        return Ok(());
    }

    let samples = CATALOG
        .iter()
        .flat_map(|(category, names)| {
            names.iter().flat_map(move |name| {
                SIZES.iter().map(move |size| (*category, *name, *size))
            })
        })
        .cycle()
        .take(count)
        .enumerate();

    let mut generated = 0;
    for (seed, (category, name, size)) in samples {
        let product = generate_product(category, name, size, seed);
        match db.products().insert(&product).await {
            Ok(_) => generated += 1,
            Err(e) => eprintln!("Failed to insert {}: {}", product.name, e),
        }
    }

    let active = db.products().list_active().await?.len();
    println!("✓ Generated {} products ({} active)", generated, active);

    db.close().await;
    Ok(())
}

/// Generates a single product with plausible data.
fn generate_product(category: &str, name: &str, size: &str, seed: usize) -> Product {
    // Draft id placeholder; the table assigns the real one
    let mut product = Product::new_draft(-(seed as i64) - 1);

    product.name = format!("{} {}", name, size);
    product.category = Some(category.to_string());
    product.cost_usdt = 0.5 + ((seed * 37) % 2450) as f64 / 100.0;
    product.profit_percent = 15.0 + ((seed * 7) % 46) as f64;
    product.active = seed % 10 != 9;

    if seed % 8 == 7 {
        product.price_mode = PriceMode::Fixed;
        product.fixed_price_usd = (product.cost_usdt * 1.5 * 100.0).round() / 100.0;
    }

    product
}
