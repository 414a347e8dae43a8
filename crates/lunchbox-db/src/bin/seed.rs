//! # Seed Data Generator
//!
//! Populates the database with a development catalog, schools, children
//! and coupons.
//!
//! ## Usage
//! ```bash
//! # Seed ./lunchbox_dev.db (default)
//! cargo run -p lunchbox-db --bin seed
//!
//! # Specify database path
//! cargo run -p lunchbox-db --bin seed -- --db ./data/lunchbox.db
//!
//! # Parent that owns the seeded children
//! cargo run -p lunchbox-db --bin seed -- --parent user-42
//! ```
//!
//! ## Generated Data
//! - Mains with compatible add-ons, one of them a promo with fixed days
//! - Add-ons, including a negative-priced "main only" option
//! - Sides and fruits with label codes (first active one is the default)
//! - Drinks and a platter
//! - Two schools, one with its own delivery calendar
//! - Three children across both schools
//! - Coupons: percentage, fixed, single-use, expired and inactive

use chrono::{Datelike, Duration, NaiveDate, Utc, Weekday};
use rust_decimal::Decimal;
use std::collections::BTreeSet;
use std::env;

use lunchbox_core::{
    AddOn, Child, Coupon, DiscountType, Drink, Fruit, Main, MenuItem, Money, Platter, School, Side,
};
use lunchbox_db::{Database, DbConfig};

/// (id, name, price_cents, excludes_sides_and_fruit)
const ADD_ONS: &[(&str, &str, i64, bool)] = &[
    ("addon-cheese", "Extra Cheese", 150, false),
    ("addon-bacon", "Bacon", 250, false),
    ("addon-avocado", "Avocado", 200, false),
    ("addon-gf-bread", "Gluten Free Bread", 100, false),
    ("addon-main-only", "Main Only (no side or fruit)", -200, true),
];

/// (id, name, price_cents, allergens, vegetarian, add-on ids)
const MAINS: &[(&str, &str, i64, &[&str], bool, &[&str])] = &[
    (
        "main-chicken-wrap",
        "Chicken Caesar Wrap",
        1250,
        &["gluten", "dairy", "egg"],
        false,
        &["addon-cheese", "addon-bacon", "addon-main-only"],
    ),
    (
        "main-beef-burger",
        "Beef Burger",
        1350,
        &["gluten", "sesame"],
        false,
        &["addon-cheese", "addon-bacon", "addon-gf-bread", "addon-main-only"],
    ),
    (
        "main-veggie-pasta",
        "Veggie Pasta Bake",
        1150,
        &["gluten", "dairy"],
        true,
        &["addon-cheese", "addon-main-only"],
    ),
    (
        "main-sushi",
        "Sushi Box",
        1400,
        &["soy", "fish"],
        false,
        &["addon-avocado"],
    ),
];

/// (id, name, short_code)
const SIDES: &[(&str, &str, &str)] = &[
    ("side-garden-salad", "Garden Salad", "GS"),
    ("side-veggie-sticks", "Veggie Sticks", "VS"),
    ("side-popcorn", "Popcorn", "PC"),
];

const FRUITS: &[(&str, &str, &str)] = &[
    ("fruit-apple", "Apple", "AP"),
    ("fruit-banana", "Banana", "BN"),
    ("fruit-orange", "Orange Wedges", "OR"),
];

const DRINKS: &[(&str, &str, i64)] = &[
    ("drink-water", "Spring Water", 250),
    ("drink-apple-juice", "Apple Juice", 350),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Parse command line arguments
    let args: Vec<String> = env::args().collect();

    let mut db_path = String::from("./lunchbox_dev.db");
    let mut parent_id = String::from("parent-dev");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--parent" | "-p" => {
                if i + 1 < args.len() {
                    parent_id = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Lunchbox Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>      Database file path (default: ./lunchbox_dev.db)");
                println!("  -p, --parent <ID>    Parent user owning the children (default: parent-dev)");
                println!("  -h, --help           Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Lunchbox Seed Data Generator");
    println!("==============================");
    println!("Database: {}", db_path);
    println!("Parent:   {}", parent_id);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.catalog().list_items().await?.len();
    if existing > 0 {
        println!("⚠ Database already has {} menu items", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    let today = Utc::now().date_naive();

    // -------------------------------------------------------------------------
    // Catalog
    // -------------------------------------------------------------------------
    println!();
    println!("Seeding catalog...");

    let mut items = Vec::new();
    for (id, name, cents, main_only) in ADD_ONS {
        items.push(MenuItem::AddOn(AddOn {
            id: id.to_string(),
            name: name.to_string(),
            price: Money::from_cents(*cents),
            excludes_sides_and_fruit: *main_only,
            is_active: true,
        }));
    }
    for (id, name, cents, allergens, vegetarian, add_ons) in MAINS {
        items.push(MenuItem::Main(main_item(id, name, *cents, allergens, *vegetarian, add_ons)));
    }

    let mut promo = main_item(
        "main-pancake-day",
        "Pancake Day Stack",
        950,
        &["gluten", "dairy", "egg"],
        true,
        &[],
    );
    promo.is_promo = true;
    promo.is_featured = true;
    promo.disable_sides_selection = true;
    promo.valid_dates = Some(next_weekdays(today, 2, Weekday::Tue));
    items.push(MenuItem::Main(promo));

    for (id, name, code) in SIDES {
        items.push(MenuItem::Side(Side {
            id: id.to_string(),
            name: name.to_string(),
            short_code: Some(code.to_string()),
            is_active: true,
        }));
    }
    for (id, name, code) in FRUITS {
        items.push(MenuItem::Fruit(Fruit {
            id: id.to_string(),
            name: name.to_string(),
            short_code: Some(code.to_string()),
            is_active: true,
        }));
    }
    for (id, name, cents) in DRINKS {
        items.push(MenuItem::Drink(Drink {
            id: id.to_string(),
            name: name.to_string(),
            price: Money::from_cents(*cents),
            is_active: true,
        }));
    }
    items.push(MenuItem::Platter(Platter {
        id: "platter-sandwich".to_string(),
        name: "Staff Room Sandwich Platter".to_string(),
        image: Some("/images/platter-sandwich.jpg".to_string()),
        description: Some("Serves 8".to_string()),
        price: Money::from_cents(6500),
        is_active: true,
    }));

    // Add-ons first: mains link to them
    items.sort_by_key(|item| !matches!(item, MenuItem::AddOn(_)));
    for (position, item) in items.iter().enumerate() {
        db.catalog().upsert_item(item, position as i64).await?;
    }
    println!("  ✓ {} menu items", items.len());

    // -------------------------------------------------------------------------
    // Schools & children
    // -------------------------------------------------------------------------
    println!("Seeding schools and children...");

    let northside = School {
        id: "school-northside".to_string(),
        name: "Northside Primary".to_string(),
        is_active: true,
        valid_dates: None,
    };
    let acorn = School {
        id: "school-acorn".to_string(),
        name: "Acorn Grammar".to_string(),
        is_active: true,
        // Mondays to Thursdays only for the next four weeks
        valid_dates: Some(
            (1..=28)
                .map(|offset| today + Duration::days(offset))
                .filter(|d| !matches!(d.weekday(), Weekday::Fri | Weekday::Sat | Weekday::Sun))
                .collect(),
        ),
    };
    db.schools().upsert(&northside).await?;
    db.schools().upsert(&acorn).await?;

    let children = [
        ("child-zoe", "Zoe", &northside, "3B"),
        ("child-adam", "Adam", &northside, "1A"),
        ("child-mia", "Mia", &acorn, "Year 5"),
    ];
    for (id, name, school, class_name) in children {
        db.schools()
            .insert_child(&Child {
                id: id.to_string(),
                parent_id: parent_id.clone(),
                name: name.to_string(),
                school_id: school.id.clone(),
                class_name: Some(class_name.to_string()),
            })
            .await?;
    }
    println!("  ✓ 2 schools, {} children", children.len());

    // -------------------------------------------------------------------------
    // Coupons
    // -------------------------------------------------------------------------
    println!("Seeding coupons...");

    let now = Utc::now();
    let coupons = [
        ("WELCOME10", DiscountType::Percentage, Decimal::from(10), true, true, 180),
        ("TAKE5", DiscountType::Fixed, Decimal::from(5), false, true, 90),
        ("HALFTERM", DiscountType::Percentage, Decimal::new(125, 1), false, true, 30),
        ("SUMMER24", DiscountType::Percentage, Decimal::from(20), false, true, -30),
        ("RETIRED", DiscountType::Fixed, Decimal::from(3), false, false, 365),
    ];
    for (code, discount_type, amount, single_use, active, days) in coupons {
        db.coupons()
            .insert(&Coupon {
                id: format!("coupon-{}", code.to_lowercase()),
                code: code.to_string(),
                discount_type,
                discount_amount: amount,
                expiry_date: now + Duration::days(days),
                is_single_use: single_use,
                is_active: active,
                use_count: 0,
            })
            .await?;
    }
    println!("  ✓ {} coupons", coupons.len());

    // -------------------------------------------------------------------------
    // Blocked dates
    // -------------------------------------------------------------------------
    let closure = next_weekdays(today, 1, Weekday::Fri);
    for date in &closure {
        db.blocked_dates()
            .add(*date, Some("Kitchen maintenance"))
            .await?;
    }
    println!("  ✓ {} blocked date(s)", closure.len());

    println!();
    let catalog = db.catalog().load_catalog().await?;
    println!(
        "Catalog check: {} mains, {} add-ons, default side {:?}",
        catalog.mains().count(),
        catalog.add_ons().count(),
        catalog.default_side().map(|s| s.name.as_str())
    );

    println!();
    println!("✓ Seed complete!");

    Ok(())
}

fn main_item(
    id: &str,
    name: &str,
    cents: i64,
    allergens: &[&str],
    vegetarian: bool,
    add_ons: &[&str],
) -> Main {
    Main {
        id: id.to_string(),
        name: name.to_string(),
        image: Some(format!("/images/{}.jpg", id)),
        description: None,
        allergens: allergens.iter().map(|a| a.to_string()).collect(),
        is_new: false,
        is_active: true,
        is_featured: false,
        is_vegetarian: vegetarian,
        is_promo: false,
        disable_sides_selection: false,
        add_on_ids: add_ons.iter().map(|a| a.to_string()).collect(),
        price: Money::from_cents(cents),
        valid_dates: None,
    }
}

/// The next `count` occurrences of `weekday` strictly after `from`.
fn next_weekdays(from: NaiveDate, count: usize, weekday: Weekday) -> BTreeSet<NaiveDate> {
    from.iter_days()
        .skip(1)
        .filter(|d| d.weekday() == weekday)
        .take(count)
        .collect()
}
