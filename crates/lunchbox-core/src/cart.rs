//! # Cart
//!
//! Meal lines and the cart that accumulates them.
//!
//! ## Total Invariants
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   MealLine.total  ==  main.price + Σ add_on.price                       │
//! │   Cart.total      ==  Σ line.total                                      │
//! │                                                                         │
//! │   Both totals are private. They are written only by                     │
//! │   calculate_line_total / Cart::recompute, on every mutation and on      │
//! │   deserialization, so a stored or hand-edited total is never trusted.  │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::dates::check_against_calendar;
use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::types::{AddOn, Catalog, Child, Fruit, Main, School, Side};
use crate::MAX_CART_LINES;

// =============================================================================
// Line Total
// =============================================================================

/// Price of one meal: the main plus its add-ons.
///
/// Callers pass only add-ons compatible with `main`; no compatibility check
/// happens here. Used both when a line is created and for edit previews, so
/// the two always agree.
pub fn calculate_line_total(main: &Main, add_ons: &[AddOn]) -> Money {
    main.price + add_ons.iter().map(|a| a.price).sum::<Money>()
}

// =============================================================================
// Meal Line
// =============================================================================

/// One ordered meal: a main for one child on one delivery date.
///
/// Catalog entries are copied in when the line is built, so the cart keeps
/// showing what the parent chose even if the catalog changes later.
#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export)]
pub struct MealLine {
    pub id: String,
    pub main: Main,
    pub add_ons: Vec<AddOn>,
    pub side: Option<Side>,
    pub fruit: Option<Fruit>,
    pub child: Child,
    pub school: School,
    #[ts(as = "String")]
    pub delivery_date: NaiveDate,
    total: Money,
}

impl MealLine {
    /// Creates a line with a fresh id and its total computed.
    pub fn new(
        main: Main,
        add_ons: Vec<AddOn>,
        side: Option<Side>,
        fruit: Option<Fruit>,
        child: Child,
        school: School,
        delivery_date: NaiveDate,
    ) -> Self {
        let total = calculate_line_total(&main, &add_ons);
        MealLine {
            id: Uuid::new_v4().to_string(),
            main,
            add_ons,
            side,
            fruit,
            child,
            school,
            delivery_date,
            total,
        }
    }

    #[inline]
    pub fn total(&self) -> Money {
        self.total
    }

    /// True when an add-on on this line removes the side and fruit.
    pub fn is_main_only(&self) -> bool {
        self.add_ons.iter().any(|a| a.excludes_sides_and_fruit)
    }

    /// Swaps the main and add-ons, keeping child, school and date.
    ///
    /// The kept date must still be deliverable for the new main. A line that
    /// stops being main-only gets the catalog's default side and fruit back.
    /// Nothing changes on error.
    fn reprice(
        &mut self,
        main: Main,
        add_ons: Vec<AddOn>,
        catalog: &Catalog,
        today: NaiveDate,
    ) -> Result<(), ValidationError> {
        if let Some(bad) = add_ons.iter().find(|a| !main.offers_add_on(&a.id)) {
            return Err(ValidationError::IncompatibleAddOn {
                main: main.name.clone(),
                add_on: bad.name.clone(),
            });
        }

        let calendar = catalog
            .school(&self.school.id)
            .unwrap_or(&self.school)
            .valid_dates
            .as_ref();
        let date = self.delivery_date;
        if check_against_calendar(date, today, &main, calendar, &catalog.blocked_dates).is_err() {
            return Err(ValidationError::IneligibleDate { date });
        }

        self.total = calculate_line_total(&main, &add_ons);
        self.main = main;
        self.add_ons = add_ons;

        if self.main.disable_sides_selection || self.is_main_only() {
            self.side = None;
            self.fruit = None;
        } else {
            if self.side.is_none() {
                self.side = catalog.default_side().cloned();
            }
            if self.fruit.is_none() {
                self.fruit = catalog.default_fruit().cloned();
            }
        }
        Ok(())
    }
}

/// Wire form of a meal line. Any `total` in the input is ignored.
#[derive(Deserialize)]
struct MealLineRecord {
    id: String,
    main: Main,
    #[serde(default)]
    add_ons: Vec<AddOn>,
    side: Option<Side>,
    fruit: Option<Fruit>,
    child: Child,
    school: School,
    delivery_date: NaiveDate,
}

impl<'de> Deserialize<'de> for MealLine {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let record = MealLineRecord::deserialize(deserializer)?;
        let total = calculate_line_total(&record.main, &record.add_ons);
        Ok(MealLine {
            id: record.id,
            main: record.main,
            add_ons: record.add_ons,
            side: record.side,
            fruit: record.fruit,
            child: record.child,
            school: record.school,
            delivery_date: record.delivery_date,
            total,
        })
    }
}

// =============================================================================
// Cart
// =============================================================================

/// Meal lines in insertion order, with their running total.
///
/// ## Invariants
/// - `total() == Σ line.total()` after every operation
/// - At most [`MAX_CART_LINES`] lines
/// - Lines are not merged: two identical meals are two lines
#[derive(Debug, Clone, Default, PartialEq, Serialize, TS)]
#[ts(export)]
pub struct Cart {
    lines: Vec<MealLine>,
    total: Money,
}

impl Cart {
    pub fn new() -> Self {
        Cart::default()
    }

    /// Appends a line.
    pub fn add_line(&mut self, line: MealLine) -> CoreResult<()> {
        if self.lines.len() >= MAX_CART_LINES {
            return Err(CoreError::CartTooLarge {
                max: MAX_CART_LINES,
            });
        }
        self.lines.push(line);
        self.recompute();
        Ok(())
    }

    /// Appends every line, or none if they would not all fit.
    pub fn add_lines(&mut self, lines: Vec<MealLine>) -> CoreResult<()> {
        if self.lines.len() + lines.len() > MAX_CART_LINES {
            return Err(CoreError::CartTooLarge {
                max: MAX_CART_LINES,
            });
        }
        self.lines.extend(lines);
        self.recompute();
        Ok(())
    }

    /// Removes a line by id, returning it.
    pub fn remove_line(&mut self, line_id: &str) -> CoreResult<MealLine> {
        let index = self
            .lines
            .iter()
            .position(|l| l.id == line_id)
            .ok_or_else(|| CoreError::LineNotFound(line_id.to_string()))?;

        let removed = self.lines.remove(index);
        self.recompute();
        Ok(removed)
    }

    /// Edits the main and add-ons of a line, repricing it.
    ///
    /// Add-ons must be offered with the new main, and the line's delivery
    /// date must pass the date rules for it. Side and fruit are dropped when
    /// the new selection does not include them and restored from `catalog`
    /// defaults when it does again.
    pub fn update_line(
        &mut self,
        line_id: &str,
        main: Main,
        add_ons: Vec<AddOn>,
        catalog: &Catalog,
        today: NaiveDate,
    ) -> CoreResult<()> {
        let line = self
            .lines
            .iter_mut()
            .find(|l| l.id == line_id)
            .ok_or_else(|| CoreError::LineNotFound(line_id.to_string()))?;

        line.reprice(main, add_ons, catalog, today)?;
        self.recompute();
        Ok(())
    }

    pub fn clear(&mut self) {
        self.lines.clear();
        self.recompute();
    }

    #[inline]
    pub fn lines(&self) -> &[MealLine] {
        &self.lines
    }

    pub fn line(&self, line_id: &str) -> Option<&MealLine> {
        self.lines.iter().find(|l| l.id == line_id)
    }

    /// Sum of all line totals.
    #[inline]
    pub fn total(&self) -> Money {
        self.total
    }

    /// Number of meals; every line is one meal.
    #[inline]
    pub fn meal_count(&self) -> usize {
        self.lines.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    fn recompute(&mut self) {
        self.total = self.lines.iter().map(MealLine::total).sum();
    }
}

#[derive(Deserialize)]
struct CartRecord {
    #[serde(default)]
    lines: Vec<MealLine>,
}

impl<'de> Deserialize<'de> for Cart {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let record = CartRecord::deserialize(deserializer)?;
        let mut cart = Cart {
            lines: record.lines,
            total: Money::zero(),
        };
        cart.recompute();
        Ok(cart)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::types::tests::{add_on, catalog, child, main, school};
    use std::collections::BTreeSet;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, day).unwrap()
    }

    fn today() -> NaiveDate {
        d(3)
    }

    pub(crate) fn line(main_cents: i64) -> MealLine {
        MealLine::new(
            main("m1", main_cents, &["a1", "a2"]),
            Vec::new(),
            None,
            None,
            child("c1", "sch1"),
            school("sch1"),
            NaiveDate::from_ymd_opt(2025, 3, 10).unwrap(),
        )
    }

    #[test]
    fn test_calculate_line_total() {
        let m = main("m1", 1200, &["a1", "a2"]);
        let add_ons = vec![add_on("a1", 150, false), add_on("a2", -200, true)];
        assert_eq!(calculate_line_total(&m, &add_ons), Money::from_cents(1150));
        assert_eq!(calculate_line_total(&m, &[]), Money::from_cents(1200));
    }

    #[test]
    fn test_line_total_matches_preview() {
        let m = main("m1", 1299, &["a1"]);
        let add_ons = vec![add_on("a1", 150, false)];
        let line = MealLine::new(
            m.clone(),
            add_ons.clone(),
            None,
            None,
            child("c1", "sch1"),
            school("sch1"),
            NaiveDate::from_ymd_opt(2025, 3, 10).unwrap(),
        );
        assert_eq!(line.total(), calculate_line_total(&m, &add_ons));
    }

    #[test]
    fn test_cart_total_tracks_mutations() {
        let mut cart = Cart::new();
        cart.add_line(line(1200)).unwrap();
        cart.add_line(line(1500)).unwrap();
        assert_eq!(cart.total(), Money::from_cents(2700));
        assert_eq!(cart.meal_count(), 2);

        let id = cart.lines()[0].id.clone();
        cart.remove_line(&id).unwrap();
        assert_eq!(cart.total(), Money::from_cents(1500));

        cart.clear();
        assert!(cart.is_empty());
        assert_eq!(cart.total(), Money::zero());
    }

    #[test]
    fn test_update_line_reprices() {
        let mut cart = Cart::new();
        cart.add_line(line(1200)).unwrap();
        let id = cart.lines()[0].id.clone();

        let m = main("m1", 1200, &["a1", "a2"]);
        cart.update_line(&id, m, vec![add_on("a1", 150, false)], &catalog(), today())
            .unwrap();
        assert_eq!(cart.total(), Money::from_cents(1350));
        assert_eq!(cart.lines()[0].total(), Money::from_cents(1350));
    }

    #[test]
    fn test_update_line_rejects_incompatible_add_on() {
        let mut cart = Cart::new();
        cart.add_line(line(1200)).unwrap();
        let id = cart.lines()[0].id.clone();

        let m = main("m2", 1500, &[]);
        let err = cart
            .update_line(&id, m, vec![add_on("a1", 150, false)], &catalog(), today())
            .unwrap_err();
        assert!(matches!(
            err,
            CoreError::Validation(ValidationError::IncompatibleAddOn { .. })
        ));
        assert_eq!(cart.total(), Money::from_cents(1200));
    }

    #[test]
    fn test_update_line_rejects_promo_outside_window() {
        let mut cart = Cart::new();
        cart.add_line(line(1200)).unwrap();
        let id = cart.lines()[0].id.clone();

        let mut promo = main("p1", 900, &[]);
        promo.is_promo = true;
        promo.valid_dates = Some(BTreeSet::from([d(11)]));

        let err = cart
            .update_line(&id, promo, Vec::new(), &catalog(), today())
            .unwrap_err();
        assert!(matches!(
            err,
            CoreError::Validation(ValidationError::IneligibleDate { date }) if date == d(10)
        ));
        assert_eq!(cart.lines()[0].main.id, "m1");
        assert!(!cart.lines()[0].main.is_promo);
        assert_eq!(cart.total(), Money::from_cents(1200));
    }

    #[test]
    fn test_update_line_promo_to_regular_uses_school_calendar() {
        let mut promo = main("p1", 900, &[]);
        promo.is_promo = true;
        promo.valid_dates = Some(BTreeSet::from([d(10)]));

        let mut closed = school("sch1");
        closed.valid_dates = Some(BTreeSet::from([d(11)]));
        let catalog = Catalog::new(catalog().items, vec![closed]);

        let mut cart = Cart::new();
        cart.add_line(MealLine::new(
            promo,
            Vec::new(),
            None,
            None,
            child("c1", "sch1"),
            school("sch1"),
            d(10),
        ))
        .unwrap();
        let id = cart.lines()[0].id.clone();

        let err = cart
            .update_line(&id, main("m1", 1200, &["a1", "a2"]), Vec::new(), &catalog, today())
            .unwrap_err();
        assert!(matches!(
            err,
            CoreError::Validation(ValidationError::IneligibleDate { .. })
        ));
        assert_eq!(cart.lines()[0].main.id, "p1");
    }

    #[test]
    fn test_update_line_rejects_blocked_date() {
        let mut cart = Cart::new();
        cart.add_line(line(1200)).unwrap();
        let id = cart.lines()[0].id.clone();

        let blocked = catalog().with_blocked_dates([d(10)]);
        let err = cart
            .update_line(&id, main("m2", 1500, &[]), Vec::new(), &blocked, today())
            .unwrap_err();
        assert!(matches!(
            err,
            CoreError::Validation(ValidationError::IneligibleDate { .. })
        ));
    }

    #[test]
    fn test_update_line_restores_sides_after_main_only() {
        let catalog = catalog();
        let m1 = main("m1", 1200, &["a1", "a2"]);
        let mut cart = Cart::new();
        cart.add_line(MealLine::new(
            m1.clone(),
            vec![add_on("a2", -200, true)],
            None,
            None,
            child("c1", "sch1"),
            school("sch1"),
            d(10),
        ))
        .unwrap();
        let id = cart.lines()[0].id.clone();

        cart.update_line(&id, m1.clone(), Vec::new(), &catalog, today())
            .unwrap();
        let line = &cart.lines()[0];
        assert_eq!(line.side.as_ref().map(|s| s.id.as_str()), Some("s1"));
        assert_eq!(line.fruit.as_ref().map(|f| f.id.as_str()), Some("f1"));
        assert_eq!(line.total(), Money::from_cents(1200));

        // Back to main-only drops them again
        cart.update_line(&id, m1, vec![add_on("a2", -200, true)], &catalog, today())
            .unwrap();
        assert!(cart.lines()[0].side.is_none());
        assert!(cart.lines()[0].fruit.is_none());
    }

    #[test]
    fn test_update_line_restores_sides_after_sideless_main() {
        let mut sideless = main("m3", 1000, &[]);
        sideless.disable_sides_selection = true;
        let catalog = catalog();

        let mut cart = Cart::new();
        cart.add_line(MealLine::new(
            sideless,
            Vec::new(),
            None,
            None,
            child("c1", "sch1"),
            school("sch1"),
            d(10),
        ))
        .unwrap();
        let id = cart.lines()[0].id.clone();

        cart.update_line(&id, main("m2", 1500, &[]), Vec::new(), &catalog, today())
            .unwrap();
        assert_eq!(cart.lines()[0].side.as_ref().map(|s| s.id.as_str()), Some("s1"));
        assert_eq!(cart.lines()[0].fruit.as_ref().map(|f| f.id.as_str()), Some("f1"));
    }

    #[test]
    fn test_update_line_keeps_chosen_side() {
        let catalog = catalog();
        let mut line = line(1200);
        line.side = catalog.side("s2").cloned();
        line.fruit = catalog.default_fruit().cloned();
        let id = line.id.clone();

        let mut cart = Cart::new();
        cart.add_line(line).unwrap();
        cart.update_line(&id, main("m2", 1500, &[]), Vec::new(), &catalog, today())
            .unwrap();
        assert_eq!(cart.lines()[0].side.as_ref().map(|s| s.id.as_str()), Some("s2"));
    }

    #[test]
    fn test_remove_unknown_line() {
        let mut cart = Cart::new();
        assert!(matches!(
            cart.remove_line("nope"),
            Err(CoreError::LineNotFound(_))
        ));
    }

    #[test]
    fn test_cart_limit() {
        let mut cart = Cart::new();
        let lines: Vec<_> = (0..MAX_CART_LINES).map(|_| line(100)).collect();
        cart.add_lines(lines).unwrap();

        assert!(matches!(
            cart.add_line(line(100)),
            Err(CoreError::CartTooLarge { max: 100 })
        ));
        assert_eq!(cart.meal_count(), MAX_CART_LINES);
    }

    #[test]
    fn test_add_lines_is_all_or_nothing() {
        let mut cart = Cart::new();
        let lines: Vec<_> = (0..MAX_CART_LINES + 1).map(|_| line(100)).collect();
        assert!(cart.add_lines(lines).is_err());
        assert!(cart.is_empty());
    }

    #[test]
    fn test_deserialize_recomputes_totals() {
        let mut cart = Cart::new();
        cart.add_line(line(1200)).unwrap();

        let mut json = serde_json::to_value(&cart).unwrap();
        json["total"] = serde_json::json!("999.00");
        json["lines"][0]["total"] = serde_json::json!("999.00");

        let back: Cart = serde_json::from_value(json).unwrap();
        assert_eq!(back.total(), Money::from_cents(1200));
        assert_eq!(back.lines()[0].total(), Money::from_cents(1200));
    }

    #[test]
    fn test_adding_line_never_decreases_total() {
        let mut cart = Cart::new();
        let mut previous = cart.total();
        for cents in [1200, 0, 800, 1500] {
            cart.add_line(line(cents)).unwrap();
            assert!(cart.total() >= previous);
            previous = cart.total();
        }
    }
}
