//! # Domain Types
//!
//! Catalog, school and coupon types used throughout Lunchbox.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  MenuItem (tagged by `kind`)                                            │
//! │  ├── Main     priced · imaged · allergens · add-on refs · promo dates  │
//! │  ├── AddOn    priced (may be negative) · excludes_sides_and_fruit      │
//! │  ├── Side     short code for labels                                    │
//! │  ├── Fruit    short code for labels                                    │
//! │  ├── Drink    priced                                                   │
//! │  └── Platter  priced · imaged                                          │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │     School      │   │      Child      │   │     Coupon      │       │
//! │  │  valid_dates?   │◄──│  school_id      │   │  code (key)     │       │
//! │  └─────────────────┘   └─────────────────┘   │  percent|fixed  │       │
//! │                                              └─────────────────┘       │
//! │  ┌─────────────────────────────────────────┐                           │
//! │  │  Catalog: items in catalog order,       │                           │
//! │  │  schools, blocked delivery dates        │                           │
//! │  └─────────────────────────────────────────┘                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::BTreeSet;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;

// =============================================================================
// Menu Items
// =============================================================================

/// A main dish. Every meal line has exactly one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Main {
    pub id: String,
    pub name: String,
    pub image: Option<String>,
    pub description: Option<String>,
    pub allergens: BTreeSet<String>,
    pub is_new: bool,
    pub is_active: bool,
    pub is_featured: bool,
    pub is_vegetarian: bool,
    /// Promo mains are only delivered on their own `valid_dates`.
    pub is_promo: bool,
    /// No side or fruit is offered with this main.
    pub disable_sides_selection: bool,
    /// Ids of the add-ons offered with this main, in display order.
    pub add_on_ids: Vec<String>,
    pub price: Money,
    /// Only meaningful when `is_promo` is set.
    #[ts(as = "Option<Vec<String>>")]
    pub valid_dates: Option<BTreeSet<NaiveDate>>,
}

impl Main {
    /// Checks whether `add_on` may be ordered with this main.
    pub fn offers_add_on(&self, add_on_id: &str) -> bool {
        self.add_on_ids.iter().any(|id| id == add_on_id)
    }
}

/// An optional extra on a main. Negative prices are discounts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct AddOn {
    pub id: String,
    pub name: String,
    pub price: Money,
    /// Selecting this add-on removes the side and fruit ("main only").
    pub excludes_sides_and_fruit: bool,
    pub is_active: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Side {
    pub id: String,
    pub name: String,
    /// Short code printed on kitchen labels.
    pub short_code: Option<String>,
    pub is_active: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Fruit {
    pub id: String,
    pub name: String,
    pub short_code: Option<String>,
    pub is_active: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Drink {
    pub id: String,
    pub name: String,
    pub price: Money,
    pub is_active: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Platter {
    pub id: String,
    pub name: String,
    pub image: Option<String>,
    pub description: Option<String>,
    pub price: Money,
    pub is_active: bool,
}

/// Discriminant of [`MenuItem`], stored in the `kind` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum MenuItemKind {
    Main,
    AddOn,
    Side,
    Fruit,
    Drink,
    Platter,
}

/// Any catalog entry, tagged by `kind`.
///
/// ## Serialization
/// ```json
/// { "kind": "side", "id": "s1", "name": "Garden Salad", "short_code": "GS", "is_active": true }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MenuItem {
    Main(Main),
    AddOn(AddOn),
    Side(Side),
    Fruit(Fruit),
    Drink(Drink),
    Platter(Platter),
}

impl MenuItem {
    pub fn kind(&self) -> MenuItemKind {
        match self {
            MenuItem::Main(_) => MenuItemKind::Main,
            MenuItem::AddOn(_) => MenuItemKind::AddOn,
            MenuItem::Side(_) => MenuItemKind::Side,
            MenuItem::Fruit(_) => MenuItemKind::Fruit,
            MenuItem::Drink(_) => MenuItemKind::Drink,
            MenuItem::Platter(_) => MenuItemKind::Platter,
        }
    }

    pub fn id(&self) -> &str {
        match self {
            MenuItem::Main(m) => &m.id,
            MenuItem::AddOn(a) => &a.id,
            MenuItem::Side(s) => &s.id,
            MenuItem::Fruit(f) => &f.id,
            MenuItem::Drink(d) => &d.id,
            MenuItem::Platter(p) => &p.id,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            MenuItem::Main(m) => &m.name,
            MenuItem::AddOn(a) => &a.name,
            MenuItem::Side(s) => &s.name,
            MenuItem::Fruit(f) => &f.name,
            MenuItem::Drink(d) => &d.name,
            MenuItem::Platter(p) => &p.name,
        }
    }

    pub fn is_active(&self) -> bool {
        match self {
            MenuItem::Main(m) => m.is_active,
            MenuItem::AddOn(a) => a.is_active,
            MenuItem::Side(s) => s.is_active,
            MenuItem::Fruit(f) => f.is_active,
            MenuItem::Drink(d) => d.is_active,
            MenuItem::Platter(p) => p.is_active,
        }
    }

    /// Price, for the kinds that carry one.
    pub fn price(&self) -> Option<Money> {
        match self {
            MenuItem::Main(m) => Some(m.price),
            MenuItem::AddOn(a) => Some(a.price),
            MenuItem::Drink(d) => Some(d.price),
            MenuItem::Platter(p) => Some(p.price),
            MenuItem::Side(_) | MenuItem::Fruit(_) => None,
        }
    }

    pub fn image(&self) -> Option<&str> {
        match self {
            MenuItem::Main(m) => m.image.as_deref(),
            MenuItem::Platter(p) => p.image.as_deref(),
            MenuItem::AddOn(_) | MenuItem::Side(_) | MenuItem::Fruit(_) | MenuItem::Drink(_) => {
                None
            }
        }
    }

    /// Allergens; empty for kinds that do not declare any.
    pub fn allergens(&self) -> Option<&BTreeSet<String>> {
        match self {
            MenuItem::Main(m) => Some(&m.allergens),
            _ => None,
        }
    }
}

// =============================================================================
// Schools and Children
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct School {
    pub id: String,
    pub name: String,
    pub is_active: bool,
    /// Delivery days for this school. `None` means every weekday.
    #[ts(as = "Option<Vec<String>>")]
    pub valid_dates: Option<BTreeSet<NaiveDate>>,
}

/// A meal recipient, enrolled at one school.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Child {
    pub id: String,
    /// The parent account that registered the child.
    pub parent_id: String,
    pub name: String,
    pub school_id: String,
    pub class_name: Option<String>,
}

// =============================================================================
// Coupons
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum DiscountType {
    /// `discount_amount` is a percentage, 0-100.
    Percentage,
    /// `discount_amount` is in currency units.
    Fixed,
}

/// A redeemable discount code.
///
/// The pricing engine only reads coupons. `use_count` is maintained by
/// order finalization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Coupon {
    pub id: String,
    /// Case-sensitive lookup key.
    pub code: String,
    pub discount_type: DiscountType,
    #[ts(as = "String")]
    pub discount_amount: Decimal,
    #[ts(as = "String")]
    pub expiry_date: DateTime<Utc>,
    pub is_single_use: bool,
    pub is_active: bool,
    pub use_count: i64,
}

// =============================================================================
// Catalog
// =============================================================================

/// The in-memory catalog an order is built against.
///
/// Item order is catalog order: the first active side and fruit are the
/// defaults offered in the order dialog.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Catalog {
    pub items: Vec<MenuItem>,
    pub schools: Vec<School>,
    #[ts(as = "Vec<String>")]
    pub blocked_dates: BTreeSet<NaiveDate>,
}

impl Catalog {
    pub fn new(items: Vec<MenuItem>, schools: Vec<School>) -> Self {
        Catalog {
            items,
            schools,
            blocked_dates: BTreeSet::new(),
        }
    }

    pub fn with_blocked_dates(mut self, dates: impl IntoIterator<Item = NaiveDate>) -> Self {
        self.blocked_dates.extend(dates);
        self
    }

    pub fn mains(&self) -> impl Iterator<Item = &Main> {
        self.items.iter().filter_map(|item| match item {
            MenuItem::Main(m) => Some(m),
            _ => None,
        })
    }

    pub fn add_ons(&self) -> impl Iterator<Item = &AddOn> {
        self.items.iter().filter_map(|item| match item {
            MenuItem::AddOn(a) => Some(a),
            _ => None,
        })
    }

    pub fn sides(&self) -> impl Iterator<Item = &Side> {
        self.items.iter().filter_map(|item| match item {
            MenuItem::Side(s) => Some(s),
            _ => None,
        })
    }

    pub fn fruits(&self) -> impl Iterator<Item = &Fruit> {
        self.items.iter().filter_map(|item| match item {
            MenuItem::Fruit(f) => Some(f),
            _ => None,
        })
    }

    pub fn active_sides(&self) -> impl Iterator<Item = &Side> {
        self.sides().filter(|s| s.is_active)
    }

    pub fn active_fruits(&self) -> impl Iterator<Item = &Fruit> {
        self.fruits().filter(|f| f.is_active)
    }

    /// First active side in catalog order.
    pub fn default_side(&self) -> Option<&Side> {
        self.active_sides().next()
    }

    /// First active fruit in catalog order.
    pub fn default_fruit(&self) -> Option<&Fruit> {
        self.active_fruits().next()
    }

    pub fn item(&self, id: &str) -> Option<&MenuItem> {
        self.items.iter().find(|item| item.id() == id)
    }

    pub fn main(&self, id: &str) -> Option<&Main> {
        self.mains().find(|m| m.id == id)
    }

    pub fn add_on(&self, id: &str) -> Option<&AddOn> {
        self.add_ons().find(|a| a.id == id)
    }

    pub fn side(&self, id: &str) -> Option<&Side> {
        self.sides().find(|s| s.id == id)
    }

    pub fn fruit(&self, id: &str) -> Option<&Fruit> {
        self.fruits().find(|f| f.id == id)
    }

    pub fn school(&self, id: &str) -> Option<&School> {
        self.schools.iter().find(|s| s.id == id)
    }

    /// Active add-ons offered with `main`, in the main's order.
    pub fn compatible_add_ons<'a>(&'a self, main: &'a Main) -> impl Iterator<Item = &'a AddOn> {
        main.add_on_ids
            .iter()
            .filter_map(move |id| self.add_on(id))
            .filter(|a| a.is_active)
    }

    /// Catalog restricted to active items.
    pub fn active(&self) -> Catalog {
        Catalog {
            items: self.items.iter().filter(|i| i.is_active()).cloned().collect(),
            schools: self.schools.iter().filter(|s| s.is_active).cloned().collect(),
            blocked_dates: self.blocked_dates.clone(),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn main(id: &str, price_cents: i64, add_on_ids: &[&str]) -> Main {
        Main {
            id: id.to_string(),
            name: format!("Main {}", id),
            image: None,
            description: None,
            allergens: BTreeSet::new(),
            is_new: false,
            is_active: true,
            is_featured: false,
            is_vegetarian: false,
            is_promo: false,
            disable_sides_selection: false,
            add_on_ids: add_on_ids.iter().map(|s| s.to_string()).collect(),
            price: Money::from_cents(price_cents),
            valid_dates: None,
        }
    }

    pub(crate) fn add_on(id: &str, price_cents: i64, main_only: bool) -> AddOn {
        AddOn {
            id: id.to_string(),
            name: format!("Add-on {}", id),
            price: Money::from_cents(price_cents),
            excludes_sides_and_fruit: main_only,
            is_active: true,
        }
    }

    pub(crate) fn side(id: &str, active: bool) -> Side {
        Side {
            id: id.to_string(),
            name: format!("Side {}", id),
            short_code: Some(id.to_uppercase()),
            is_active: active,
        }
    }

    pub(crate) fn fruit(id: &str, active: bool) -> Fruit {
        Fruit {
            id: id.to_string(),
            name: format!("Fruit {}", id),
            short_code: Some(id.to_uppercase()),
            is_active: active,
        }
    }

    pub(crate) fn school(id: &str) -> School {
        School {
            id: id.to_string(),
            name: format!("School {}", id),
            is_active: true,
            valid_dates: None,
        }
    }

    pub(crate) fn child(id: &str, school_id: &str) -> Child {
        Child {
            id: id.to_string(),
            parent_id: "parent-1".to_string(),
            name: format!("Child {}", id),
            school_id: school_id.to_string(),
            class_name: None,
        }
    }

    pub(crate) fn catalog() -> Catalog {
        Catalog::new(
            vec![
                MenuItem::Main(main("m1", 1200, &["a1", "a2"])),
                MenuItem::Main(main("m2", 1500, &[])),
                MenuItem::AddOn(add_on("a1", 150, false)),
                MenuItem::AddOn(add_on("a2", -200, true)),
                MenuItem::Side(side("s0", false)),
                MenuItem::Side(side("s1", true)),
                MenuItem::Side(side("s2", true)),
                MenuItem::Fruit(fruit("f1", true)),
            ],
            vec![school("sch1")],
        )
    }

    #[test]
    fn test_catalog_defaults_skip_inactive() {
        let catalog = catalog();
        assert_eq!(catalog.default_side().map(|s| s.id.as_str()), Some("s1"));
        assert_eq!(catalog.default_fruit().map(|f| f.id.as_str()), Some("f1"));
    }

    #[test]
    fn test_compatible_add_ons() {
        let catalog = catalog();
        let m1 = catalog.main("m1").unwrap();
        let ids: Vec<_> = catalog.compatible_add_ons(m1).map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["a1", "a2"]);

        let m2 = catalog.main("m2").unwrap();
        assert_eq!(catalog.compatible_add_ons(m2).count(), 0);
    }

    #[test]
    fn test_menu_item_capabilities() {
        let item = MenuItem::Side(side("s1", true));
        assert_eq!(item.kind(), MenuItemKind::Side);
        assert_eq!(item.price(), None);
        assert!(item.allergens().is_none());

        let item = MenuItem::AddOn(add_on("a2", -200, true));
        assert_eq!(item.price(), Some(Money::from_cents(-200)));
    }

    #[test]
    fn test_menu_item_tagged_serialization() {
        let item = MenuItem::Side(side("s1", true));
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["kind"], "side");
        assert_eq!(json["short_code"], "S1");

        let back: MenuItem = serde_json::from_value(json).unwrap();
        assert_eq!(back, item);
    }

    #[test]
    fn test_active_catalog() {
        let active = catalog().active();
        assert!(active.side("s0").is_none());
        assert!(active.side("s1").is_some());
    }
}
