//! # Seed Data Generator
//!
//! Populates the database with demo data for development.
//!
//! ## Usage
//! ```bash
//! # Seed the default development database
//! cargo run -p paws-db --bin seed
//!
//! # Specify database path
//! cargo run -p paws-db --bin seed -- --db ./data/paws.db
//! ```
//!
//! ## Seeded Data
//! Categories and service types come from the reference-data migration;
//! this binary adds the demo shop on top:
//! - 16 products across the five categories, with barcodes, brands and
//!   opening stock (which means opening entry movements too)
//! - 8 customers with CPF and contact details
//! - 12 pets spread across those customers
//!
//! Runs once: if the database already has products, seeding is skipped.

use std::env;

use paws_db::{Database, DbConfig};
use tracing_subscriber::EnvFilter;

/// One demo product row.
struct SeedProduct {
    name: &'static str,
    category: &'static str,
    price_cents: i64,
    stock: i64,
    min_stock: i64,
    barcode: &'static str,
    description: &'static str,
    brand: &'static str,
    weight_kg: f64,
    unit: &'static str,
}

const PRODUCTS: &[SeedProduct] = &[
    SeedProduct {
        name: "Premium Adult Dog Food 15kg",
        category: "Food & Treats",
        price_cents: 8990,
        stock: 25,
        min_stock: 5,
        barcode: "7891000001234",
        description: "Super premium food for adult dogs",
        brand: "Royal Canin",
        weight_kg: 15.0,
        unit: "kg",
    },
    SeedProduct {
        name: "Kitten Food 3kg",
        category: "Food & Treats",
        price_cents: 4550,
        stock: 18,
        min_stock: 3,
        barcode: "7891000001235",
        description: "Special food for kittens",
        brand: "Whiskas",
        weight_kg: 3.0,
        unit: "kg",
    },
    SeedProduct {
        name: "Small Breed Dog Food 7.5kg",
        category: "Food & Treats",
        price_cents: 6780,
        stock: 15,
        min_stock: 5,
        barcode: "7891000001236",
        description: "Food for small breed dogs",
        brand: "Pedigree",
        weight_kg: 7.5,
        unit: "kg",
    },
    SeedProduct {
        name: "Natural Dog Treats 500g",
        category: "Food & Treats",
        price_cents: 2490,
        stock: 30,
        min_stock: 8,
        barcode: "7891000001237",
        description: "Natural treats with no preservatives",
        brand: "Bassar",
        weight_kg: 0.5,
        unit: "kg",
    },
    SeedProduct {
        name: "Dog & Cat Dewormer",
        category: "Medication",
        price_cents: 3500,
        stock: 12,
        min_stock: 3,
        barcode: "7891000002234",
        description: "Broad-spectrum dewormer",
        brand: "Bayer",
        weight_kg: 0.1,
        unit: "unit",
    },
    SeedProduct {
        name: "Spot-On Flea Treatment",
        category: "Medication",
        price_cents: 2850,
        stock: 20,
        min_stock: 5,
        barcode: "7891000002235",
        description: "Flea and tick treatment",
        brand: "Frontline",
        weight_kg: 0.05,
        unit: "unit",
    },
    SeedProduct {
        name: "Pet Vitamins",
        category: "Medication",
        price_cents: 4200,
        stock: 8,
        min_stock: 2,
        barcode: "7891000002236",
        description: "Vitamin complex for dogs and cats",
        brand: "Vetnil",
        weight_kg: 0.15,
        unit: "unit",
    },
    SeedProduct {
        name: "Adjustable Collar M",
        category: "Accessories",
        price_cents: 1990,
        stock: 15,
        min_stock: 5,
        barcode: "7891000003234",
        description: "Adjustable nylon collar",
        brand: "Furacao Pet",
        weight_kg: 0.1,
        unit: "unit",
    },
    SeedProduct {
        name: "Retractable Leash 5m",
        category: "Accessories",
        price_cents: 4500,
        stock: 8,
        min_stock: 2,
        barcode: "7891000003235",
        description: "Retractable leash for medium dogs",
        brand: "Flexi",
        weight_kg: 0.3,
        unit: "unit",
    },
    SeedProduct {
        name: "Rope Dog Toy",
        category: "Accessories",
        price_cents: 1550,
        stock: 25,
        min_stock: 8,
        barcode: "7891000003236",
        description: "Natural rope toy",
        brand: "Jambo",
        weight_kg: 0.2,
        unit: "unit",
    },
    SeedProduct {
        name: "Double Steel Bowl",
        category: "Accessories",
        price_cents: 3290,
        stock: 12,
        min_stock: 3,
        barcode: "7891000003237",
        description: "Stainless bowl with two compartments",
        brand: "Chalesco",
        weight_kg: 0.5,
        unit: "unit",
    },
    SeedProduct {
        name: "Long Coat Dog Shampoo",
        category: "Hygiene",
        price_cents: 1890,
        stock: 20,
        min_stock: 5,
        barcode: "7891000004234",
        description: "Shampoo for long-coated dogs",
        brand: "Sanol",
        weight_kg: 0.5,
        unit: "unit",
    },
    SeedProduct {
        name: "Pet Toothbrush",
        category: "Hygiene",
        price_cents: 1250,
        stock: 15,
        min_stock: 5,
        barcode: "7891000004235",
        description: "Toothbrush for dogs and cats",
        brand: "Kelco",
        weight_kg: 0.05,
        unit: "unit",
    },
    SeedProduct {
        name: "Pet Cleaning Wipes",
        category: "Hygiene",
        price_cents: 890,
        stock: 30,
        min_stock: 10,
        barcode: "7891000004236",
        description: "Wipes for quick cleanups",
        brand: "Petix",
        weight_kg: 0.1,
        unit: "unit",
    },
    SeedProduct {
        name: "Soft Pet Bed M",
        category: "Beds & Houses",
        price_cents: 7800,
        stock: 6,
        min_stock: 2,
        barcode: "7891000005234",
        description: "Soft and comfortable bed",
        brand: "Furacao Pet",
        weight_kg: 1.2,
        unit: "unit",
    },
    SeedProduct {
        name: "Plastic Dog House L",
        category: "Beds & Houses",
        price_cents: 15600,
        stock: 4,
        min_stock: 1,
        barcode: "7891000005235",
        description: "Weather-resistant outdoor house",
        brand: "Igloo",
        weight_kg: 3.5,
        unit: "unit",
    },
];

/// One demo customer row.
struct SeedCustomer {
    name: &'static str,
    cpf: &'static str,
    phone: &'static str,
    email: &'static str,
    address: &'static str,
    city: &'static str,
    postal_code: &'static str,
}

const CUSTOMERS: &[SeedCustomer] = &[
    SeedCustomer {
        name: "Maria Silva Santos",
        cpf: "123.456.789-01",
        phone: "(11) 99999-1111",
        email: "maria.silva@email.com",
        address: "Rua das Flores, 123",
        city: "São Paulo",
        postal_code: "01234-567",
    },
    SeedCustomer {
        name: "João Pedro Oliveira",
        cpf: "987.654.321-02",
        phone: "(11) 88888-2222",
        email: "joao.pedro@email.com",
        address: "Av. Principal, 456",
        city: "São Paulo",
        postal_code: "01234-568",
    },
    SeedCustomer {
        name: "Ana Carolina Lima",
        cpf: "456.789.123-03",
        phone: "(11) 77777-3333",
        email: "ana.lima@email.com",
        address: "Rua do Parque, 789",
        city: "São Paulo",
        postal_code: "01234-569",
    },
    SeedCustomer {
        name: "Carlos Eduardo Costa",
        cpf: "321.654.987-04",
        phone: "(11) 66666-4444",
        email: "carlos.costa@email.com",
        address: "Rua das Palmeiras, 321",
        city: "São Paulo",
        postal_code: "01234-570",
    },
    SeedCustomer {
        name: "Fernanda Alves Rocha",
        cpf: "789.123.456-05",
        phone: "(11) 55555-5555",
        email: "fernanda.rocha@email.com",
        address: "Av. Central, 654",
        city: "São Paulo",
        postal_code: "01234-571",
    },
    SeedCustomer {
        name: "Ricardo Mendes Silva",
        cpf: "147.258.369-06",
        phone: "(11) 44444-6666",
        email: "ricardo.mendes@email.com",
        address: "Rua do Sol, 987",
        city: "São Paulo",
        postal_code: "01234-572",
    },
    SeedCustomer {
        name: "Juliana Santos Costa",
        cpf: "258.369.147-07",
        phone: "(11) 33333-7777",
        email: "juliana.santos@email.com",
        address: "Rua da Lua, 159",
        city: "São Paulo",
        postal_code: "01234-573",
    },
    SeedCustomer {
        name: "Bruno Ferreira Lima",
        cpf: "369.147.258-08",
        phone: "(11) 22222-8888",
        email: "bruno.ferreira@email.com",
        address: "Av. das Estrelas, 753",
        city: "São Paulo",
        postal_code: "01234-574",
    },
];

/// One demo pet row. `owner` indexes into [`CUSTOMERS`].
struct SeedPet {
    name: &'static str,
    owner: usize,
    species: &'static str,
    breed: &'static str,
    age_years: i64,
    weight_kg: f64,
    color: &'static str,
    notes: &'static str,
}

const PETS: &[SeedPet] = &[
    SeedPet {
        name: "Rex",
        owner: 0,
        species: "Dog",
        breed: "Golden Retriever",
        age_years: 3,
        weight_kg: 28.5,
        color: "Golden",
        notes: "Very gentle and playful",
    },
    SeedPet {
        name: "Mimi",
        owner: 0,
        species: "Cat",
        breed: "Persian",
        age_years: 2,
        weight_kg: 4.2,
        color: "White",
        notes: "Loves lying in the sun",
    },
    SeedPet {
        name: "Bolt",
        owner: 1,
        species: "Dog",
        breed: "Border Collie",
        age_years: 5,
        weight_kg: 22.0,
        color: "Black and white",
        notes: "Very smart",
    },
    SeedPet {
        name: "Luna",
        owner: 2,
        species: "Cat",
        breed: "Siamese",
        age_years: 1,
        weight_kg: 3.8,
        color: "Gray",
        notes: "Still a kitten, very active",
    },
    SeedPet {
        name: "Thor",
        owner: 2,
        species: "Dog",
        breed: "Rottweiler",
        age_years: 4,
        weight_kg: 45.0,
        color: "Black",
        notes: "Big and protective",
    },
    SeedPet {
        name: "Princesa",
        owner: 3,
        species: "Dog",
        breed: "Poodle",
        age_years: 6,
        weight_kg: 8.5,
        color: "White",
        notes: "Very affectionate",
    },
    SeedPet {
        name: "Simba",
        owner: 4,
        species: "Cat",
        breed: "Maine Coon",
        age_years: 3,
        weight_kg: 6.8,
        color: "Orange",
        notes: "Huge for a cat",
    },
    SeedPet {
        name: "Mel",
        owner: 4,
        species: "Dog",
        breed: "Beagle",
        age_years: 2,
        weight_kg: 15.2,
        color: "Tricolor",
        notes: "Loves to eat",
    },
    SeedPet {
        name: "Zeus",
        owner: 5,
        species: "Dog",
        breed: "German Shepherd",
        age_years: 7,
        weight_kg: 35.0,
        color: "Black and tan",
        notes: "Experienced guard dog",
    },
    SeedPet {
        name: "Lola",
        owner: 6,
        species: "Dog",
        breed: "Shih Tzu",
        age_years: 4,
        weight_kg: 6.0,
        color: "Golden and white",
        notes: "Very vain",
    },
    SeedPet {
        name: "Garfield",
        owner: 7,
        species: "Cat",
        breed: "Persian",
        age_years: 5,
        weight_kg: 5.5,
        color: "Orange",
        notes: "Lazy like the character",
    },
    SeedPet {
        name: "Max",
        owner: 7,
        species: "Dog",
        breed: "Labrador",
        age_years: 1,
        weight_kg: 12.0,
        color: "Yellow",
        notes: "Still a puppy, full of energy",
    },
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    // Parse command line arguments
    let args: Vec<String> = env::args().collect();

    let mut db_path = String::from("./paws_dev.db");

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
                println!("Paws Pet Shop Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./paws_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Paws Pet Shop Seed Data Generator");
    println!("====================================");
    println!("Database: {}", db_path);
    println!();

    // Connect to database
    let config = DbConfig::new(&db_path);
    let db = Database::new(config).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    // Check existing data
    let existing = db.products().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} products", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    let start = std::time::Instant::now();

    // Resolve the migrated categories by name
    let category_ids: std::collections::HashMap<String, String> = db
        .categories()
        .list()
        .await?
        .into_iter()
        .map(|c| (c.name, c.id))
        .collect();

    println!();
    println!("Seeding products...");

    let mut products = 0;
    for entry in PRODUCTS {
        let category_id = category_ids
            .get(entry.category)
            .ok_or_else(|| format!("unknown category: {}", entry.category))?;

        let input = paws_core::NewProduct {
            name: entry.name.to_string(),
            category_id: Some(category_id.clone()),
            price_cents: entry.price_cents,
            initial_stock: entry.stock,
            min_stock: entry.min_stock,
            barcode: Some(entry.barcode.to_string()),
            description: Some(entry.description.to_string()),
            brand: Some(entry.brand.to_string()),
            weight_kg: Some(entry.weight_kg),
            unit: Some(entry.unit.to_string()),
        };

        if let Err(e) = db.products().insert(&input).await {
            eprintln!("Failed to insert {}: {}", entry.name, e);
            continue;
        }
        products += 1;
    }

    println!("Seeding customers and pets...");

    let mut customer_ids = Vec::with_capacity(CUSTOMERS.len());
    for entry in CUSTOMERS {
        let input = paws_core::NewCustomer {
            name: entry.name.to_string(),
            cpf: Some(entry.cpf.to_string()),
            phone: Some(entry.phone.to_string()),
            email: Some(entry.email.to_string()),
            address: Some(entry.address.to_string()),
            city: Some(entry.city.to_string()),
            postal_code: Some(entry.postal_code.to_string()),
        };

        let customer = db.customers().insert(&input).await?;
        customer_ids.push(customer.id);
    }

    let mut pets = 0;
    for entry in PETS {
        let input = paws_core::NewPet {
            customer_id: customer_ids[entry.owner].clone(),
            name: entry.name.to_string(),
            species: entry.species.to_string(),
            breed: Some(entry.breed.to_string()),
            age_years: Some(entry.age_years),
            weight_kg: Some(entry.weight_kg),
            color: Some(entry.color.to_string()),
            notes: Some(entry.notes.to_string()),
        };

        if let Err(e) = db.pets().insert(&input).await {
            eprintln!("Failed to insert pet {}: {}", entry.name, e);
            continue;
        }
        pets += 1;
    }

    let elapsed = start.elapsed();
    println!();
    println!(
        "✓ Seeded {} products, {} customers, {} pets in {:?}",
        products,
        customer_ids.len(),
        pets,
        elapsed
    );

    // Quick sanity pass over what just landed
    println!();
    println!("Verifying...");
    let hits = db.products().search("food", 20).await?;
    println!("  Search 'food': {} results", hits.len());
    let low = db.reports().low_stock_count().await?;
    println!("  Low stock alerts: {}", low);
    let valuation = db.reports().inventory_valuation().await?;
    println!(
        "  Inventory valuation: {}",
        paws_core::Money::from_cents(valuation)
    );

    println!();
    println!("✓ Seed complete!");

    Ok(())
}

/// Initializes the tracing subscriber for structured logging.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=paws=trace` - Show trace for paws crates only
/// - Default: INFO level
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,paws=debug,sqlx=warn"));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}
