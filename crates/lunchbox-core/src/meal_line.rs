//! # Meal Line Builder
//!
//! Backs the order dialog: holds the parent's selections and turns them
//! into meal lines once every rule is met.
//!
//! ## Selection State
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  select_main ──► clears add-ons, restores default side/fruit          │
//! │                  promo ⇄ non-promo switch clears dates                 │
//! │                                                                         │
//! │  toggle_add_on ─► main-only add-on on:  side/fruit cleared             │
//! │                   main-only add-on off: defaults restored              │
//! │                                                                         │
//! │  toggle_child / toggle_date ─► recipients × delivery days              │
//! │                                                                         │
//! │  build() ──► one MealLine per (child, date)                             │
//! │              MissingMain → MissingChild → MissingDate →                │
//! │              MissingSchool → MissingSide → MissingFruit →              │
//! │              IneligibleDate                                             │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The builder never reads the clock. "Today" is injected.

use std::collections::BTreeSet;

use chrono::NaiveDate;

use crate::cart::{calculate_line_total, MealLine};
use crate::dates::check_against_calendar;
use crate::error::ValidationError;
use crate::money::Money;
use crate::types::{AddOn, Catalog, Child, Fruit, Main, Side};

/// Collects one order dialog's selections against a catalog.
#[derive(Debug, Clone)]
pub struct MealLineBuilder<'a> {
    catalog: &'a Catalog,
    today: NaiveDate,
    main: Option<&'a Main>,
    add_ons: Vec<&'a AddOn>,
    side: Option<&'a Side>,
    fruit: Option<&'a Fruit>,
    children: Vec<Child>,
    dates: BTreeSet<NaiveDate>,
}

impl<'a> MealLineBuilder<'a> {
    /// Starts an empty selection with the catalog's default side and fruit.
    pub fn new(catalog: &'a Catalog, today: NaiveDate) -> Self {
        MealLineBuilder {
            catalog,
            today,
            main: None,
            add_ons: Vec::new(),
            side: catalog.default_side(),
            fruit: catalog.default_fruit(),
            children: Vec::new(),
            dates: BTreeSet::new(),
        }
    }

    // =========================================================================
    // Selections
    // =========================================================================

    /// Selects the main dish.
    ///
    /// Switching mains drops every add-on. Switching between a promo and a
    /// regular main also drops the chosen dates.
    pub fn select_main(&mut self, main: &'a Main) {
        if self.main.is_some_and(|current| current.id == main.id) {
            return;
        }

        let was_main_only = self.is_main_only();
        if self.main.is_some_and(|current| current.is_promo != main.is_promo) {
            self.dates.clear();
        }

        self.main = Some(main);
        self.add_ons.clear();
        if was_main_only {
            self.restore_default_sides();
        }
    }

    /// Adds or removes an add-on. Returns whether it is now selected.
    pub fn toggle_add_on(&mut self, add_on: &'a AddOn) -> Result<bool, ValidationError> {
        let main = self.main.ok_or(ValidationError::MissingMain)?;
        if !main.offers_add_on(&add_on.id) {
            return Err(ValidationError::IncompatibleAddOn {
                main: main.name.clone(),
                add_on: add_on.name.clone(),
            });
        }

        let was_main_only = self.is_main_only();
        let selected = if let Some(pos) = self.add_ons.iter().position(|a| a.id == add_on.id) {
            self.add_ons.remove(pos);
            false
        } else {
            self.add_ons.push(add_on);
            true
        };

        match (was_main_only, self.is_main_only()) {
            (false, true) => {
                self.side = None;
                self.fruit = None;
            }
            (true, false) => self.restore_default_sides(),
            _ => {}
        }

        Ok(selected)
    }

    pub fn select_side(&mut self, side: &'a Side) -> Result<(), ValidationError> {
        if self.is_main_only() {
            return Err(ValidationError::SidesExcluded);
        }
        self.side = Some(side);
        Ok(())
    }

    pub fn select_fruit(&mut self, fruit: &'a Fruit) -> Result<(), ValidationError> {
        if self.is_main_only() {
            return Err(ValidationError::SidesExcluded);
        }
        self.fruit = Some(fruit);
        Ok(())
    }

    pub fn clear_side(&mut self) {
        self.side = None;
    }

    pub fn clear_fruit(&mut self) {
        self.fruit = None;
    }

    /// Adds or removes a recipient. Returns whether the child is now selected.
    pub fn toggle_child(&mut self, child: &Child) -> bool {
        if let Some(pos) = self.children.iter().position(|c| c.id == child.id) {
            self.children.remove(pos);
            false
        } else {
            self.children.push(child.clone());
            true
        }
    }

    /// Adds or removes a delivery date.
    ///
    /// Returns `false`, leaving the selection unchanged, when the date is
    /// not selectable for the current main and every selected child's
    /// school. Deselecting always succeeds.
    pub fn toggle_date(&mut self, date: NaiveDate) -> bool {
        if self.dates.remove(&date) {
            return true;
        }
        if !self.is_date_selectable(date) {
            return false;
        }
        self.dates.insert(date);
        true
    }

    /// Whether `date` could be selected right now.
    pub fn is_date_selectable(&self, date: NaiveDate) -> bool {
        let Some(main) = self.main else {
            return false;
        };
        let blocked = &self.catalog.blocked_dates;

        if self.children.is_empty() {
            return check_against_calendar(date, self.today, main, None, blocked).is_ok();
        }

        self.children.iter().all(|child| {
            let calendar = self
                .catalog
                .school(&child.school_id)
                .and_then(|s| s.valid_dates.as_ref());
            check_against_calendar(date, self.today, main, calendar, blocked).is_ok()
        })
    }

    // =========================================================================
    // Read Access
    // =========================================================================

    pub fn main(&self) -> Option<&'a Main> {
        self.main
    }

    pub fn add_ons(&self) -> &[&'a AddOn] {
        &self.add_ons
    }

    pub fn side(&self) -> Option<&'a Side> {
        self.side
    }

    pub fn fruit(&self) -> Option<&'a Fruit> {
        self.fruit
    }

    pub fn children(&self) -> &[Child] {
        &self.children
    }

    pub fn dates(&self) -> &BTreeSet<NaiveDate> {
        &self.dates
    }

    /// True while a selected add-on removes the side and fruit.
    pub fn is_main_only(&self) -> bool {
        self.add_ons.iter().any(|a| a.excludes_sides_and_fruit)
    }

    /// Price of one meal with the current selection.
    pub fn line_total_preview(&self) -> Option<Money> {
        self.main
            .map(|main| calculate_line_total(main, &self.owned_add_ons()))
    }

    /// Number of lines `build` would produce.
    pub fn meal_count(&self) -> usize {
        self.children.len() * self.dates.len()
    }

    // =========================================================================
    // Build
    // =========================================================================

    /// Produces one line per (child, date), children in selection order and
    /// dates ascending.
    pub fn build(&self) -> Result<Vec<MealLine>, ValidationError> {
        let main = self.main.ok_or(ValidationError::MissingMain)?;
        if self.children.is_empty() {
            return Err(ValidationError::MissingChild);
        }
        if self.dates.is_empty() {
            return Err(ValidationError::MissingDate);
        }

        let mut schools = Vec::with_capacity(self.children.len());
        for child in &self.children {
            let school = self.catalog.school(&child.school_id).ok_or_else(|| {
                ValidationError::MissingSchool {
                    child_name: child.name.clone(),
                }
            })?;
            schools.push(school);
        }

        let sides_required = !main.disable_sides_selection && !self.is_main_only();
        if sides_required {
            if self.side.is_none() && self.catalog.active_sides().next().is_some() {
                return Err(ValidationError::MissingSide);
            }
            if self.fruit.is_none() && self.catalog.active_fruits().next().is_some() {
                return Err(ValidationError::MissingFruit);
            }
        }

        for school in &schools {
            let calendar = school.valid_dates.as_ref();
            for &date in &self.dates {
                if check_against_calendar(date, self.today, main, calendar, &self.catalog.blocked_dates)
                    .is_err()
                {
                    return Err(ValidationError::IneligibleDate { date });
                }
            }
        }

        let add_ons = self.owned_add_ons();
        let (side, fruit) = if sides_required {
            (self.side.cloned(), self.fruit.cloned())
        } else {
            (None, None)
        };
        let (add_ons, side, fruit) = (&add_ons, &side, &fruit);

        let lines = self
            .children
            .iter()
            .zip(schools)
            .flat_map(move |(child, school)| {
                self.dates.iter().map(move |&date| {
                    MealLine::new(
                        main.clone(),
                        add_ons.clone(),
                        side.clone(),
                        fruit.clone(),
                        child.clone(),
                        school.clone(),
                        date,
                    )
                })
            })
            .collect();

        Ok(lines)
    }

    fn restore_default_sides(&mut self) {
        self.side = self.catalog.default_side();
        self.fruit = self.catalog.default_fruit();
    }

    fn owned_add_ons(&self) -> Vec<AddOn> {
        self.add_ons.iter().map(|a| (*a).clone()).collect()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
