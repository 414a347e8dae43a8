//! # Run Sheets
//!
//! Kitchen run sheets and label records for one delivery day.
//!
//! ```text
//! paid orders ──► lines for `date` ──► grouped by school (name order)
//!                                         ├── entries (child name order)
//!                                         └── per-main counts
//!                                                   │
//!                                       labels() ──►└── one label per meal
//! ```
//!
//! Only data is produced here. Printing is done elsewhere.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::order::{Order, OrderStatus};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct RunSheetEntry {
    pub order_id: String,
    pub line_id: String,
    pub child_name: String,
    pub class_name: Option<String>,
    pub main_name: String,
    pub add_on_names: Vec<String>,
    pub side_code: Option<String>,
    pub fruit_code: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct MainCount {
    pub main_name: String,
    pub count: usize,
}

/// Everything going to one school.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SchoolRun {
    pub school_id: String,
    pub school_name: String,
    pub entries: Vec<RunSheetEntry>,
    /// Sorted by main name.
    pub main_counts: Vec<MainCount>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct RunSheet {
    #[ts(as = "String")]
    pub date: NaiveDate,
    pub schools: Vec<SchoolRun>,
    pub total_meals: usize,
}

/// One sticker for one meal box.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Label {
    #[ts(as = "String")]
    pub date: NaiveDate,
    pub school_name: String,
    pub child_name: String,
    pub class_name: Option<String>,
    pub main_name: String,
    pub add_ons: String,
    pub side_code: Option<String>,
    pub fruit_code: Option<String>,
}

/// Collects the meals of paid orders delivered on `date`.
pub fn build_run_sheet(date: NaiveDate, orders: &[Order]) -> RunSheet {
    // school_id -> (school_name, entries)
    let mut by_school: BTreeMap<&str, (&str, Vec<RunSheetEntry>)> = BTreeMap::new();

    let paid = orders.iter().filter(|o| o.status == OrderStatus::Paid);
    for order in paid {
        for line in order.lines.iter().filter(|l| l.delivery_date == date) {
            let (_, entries) = by_school
                .entry(line.school_id.as_str())
                .or_insert_with(|| (line.school_name.as_str(), Vec::new()));
            entries.push(RunSheetEntry {
                order_id: order.id.clone(),
                line_id: line.id.clone(),
                child_name: line.child_name.clone(),
                class_name: line.class_name.clone(),
                main_name: line.main_name.clone(),
                add_on_names: line.add_on_names.clone(),
                side_code: line.side_code.clone(),
                fruit_code: line.fruit_code.clone(),
            });
        }
    }

    let mut schools: Vec<SchoolRun> = by_school
        .into_iter()
        .map(|(school_id, (school_name, mut entries))| {
            entries.sort_by(|a, b| {
                a.child_name
                    .cmp(&b.child_name)
                    .then_with(|| a.main_name.cmp(&b.main_name))
            });

            let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
            for entry in &entries {
                *counts.entry(entry.main_name.as_str()).or_default() += 1;
            }
            let main_counts = counts
                .into_iter()
                .map(|(main_name, count)| MainCount {
                    main_name: main_name.to_string(),
                    count,
                })
                .collect();

            SchoolRun {
                school_id: school_id.to_string(),
                school_name: school_name.to_string(),
                entries,
                main_counts,
            }
        })
        .collect();

    schools.sort_by(|a, b| {
        a.school_name
            .cmp(&b.school_name)
            .then_with(|| a.school_id.cmp(&b.school_id))
    });

    let total_meals = schools.iter().map(|s| s.entries.len()).sum();
    RunSheet {
        date,
        schools,
        total_meals,
    }
}

/// Flattens a run sheet into labels, in run-sheet order.
pub fn labels(run_sheet: &RunSheet) -> Vec<Label> {
    run_sheet
        .schools
        .iter()
        .flat_map(|school| {
            school.entries.iter().map(move |entry| Label {
                date: run_sheet.date,
                school_name: school.school_name.clone(),
                child_name: entry.child_name.clone(),
                class_name: entry.class_name.clone(),
                main_name: entry.main_name.clone(),
                add_ons: entry.add_on_names.join(", "),
                side_code: entry.side_code.clone(),
                fruit_code: entry.fruit_code.clone(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order::OrderLine;
    use chrono::Utc;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, day).unwrap()
    }

    fn order_line(child: &str, school: (&str, &str), main: &str, date: NaiveDate) -> OrderLine {
        OrderLine {
            id: format!("{}-{}-{}", child, main, date),
            main_id: main.to_lowercase(),
            main_name: main.to_string(),
            add_on_names: vec!["Extra Cheese".to_string()],
            side_name: Some("Garden Salad".to_string()),
            side_code: Some("GS".to_string()),
            fruit_name: Some("Apple".to_string()),
            fruit_code: Some("AP".to_string()),
            child_id: child.to_lowercase(),
            child_name: child.to_string(),
            class_name: Some("3B".to_string()),
            school_id: school.0.to_string(),
            school_name: school.1.to_string(),
            delivery_date: date,
            line_total_cents: 1200,
        }
    }

    fn order(id: &str, status: OrderStatus, lines: Vec<OrderLine>) -> Order {
        Order {
            id: id.to_string(),
            user_id: "user-1".to_string(),
            status,
            lines,
            subtotal_cents: 0,
            bundle_discount_bps: 0,
            bundle_discount_cents: 0,
            coupon_discount_cents: 0,
            final_total_cents: 0,
            coupon_id: None,
            coupon_code: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            paid_at: None,
        }
    }

    const NORTH: (&str, &str) = ("s1", "Northside Primary");
    const ACORN: (&str, &str) = ("s2", "Acorn Grammar");

    fn orders() -> Vec<Order> {
        vec![
            order(
                "o1",
                OrderStatus::Paid,
                vec![
                    order_line("Zoe", NORTH, "Burger", d(10)),
                    order_line("Adam", NORTH, "Wrap", d(10)),
                    order_line("Adam", NORTH, "Wrap", d(11)),
                ],
            ),
            order(
                "o2",
                OrderStatus::Paid,
                vec![
                    order_line("Mia", ACORN, "Burger", d(10)),
                    order_line("Ben", NORTH, "Burger", d(10)),
                ],
            ),
            order(
                "o3",
                OrderStatus::PendingPayment,
                vec![order_line("Ivy", NORTH, "Burger", d(10))],
            ),
            order(
                "o4",
                OrderStatus::Cancelled,
                vec![order_line("Jay", ACORN, "Burger", d(10))],
            ),
        ]
    }

    #[test]
    fn test_run_sheet_groups_and_sorts() {
        let sheet = build_run_sheet(d(10), &orders());
        assert_eq!(sheet.total_meals, 4);

        let names: Vec<_> = sheet.schools.iter().map(|s| s.school_name.as_str()).collect();
        assert_eq!(names, vec!["Acorn Grammar", "Northside Primary"]);

        let north = &sheet.schools[1];
        let children: Vec<_> = north.entries.iter().map(|e| e.child_name.as_str()).collect();
        assert_eq!(children, vec!["Adam", "Ben", "Zoe"]);
        assert_eq!(
            north.main_counts,
            vec![
                MainCount {
                    main_name: "Burger".to_string(),
                    count: 2
                },
                MainCount {
                    main_name: "Wrap".to_string(),
                    count: 1
                },
            ]
        );
    }

    #[test]
    fn test_run_sheet_skips_unpaid_orders() {
        let sheet = build_run_sheet(d(10), &orders());
        let all: Vec<_> = sheet
            .schools
            .iter()
            .flat_map(|s| s.entries.iter().map(|e| e.order_id.as_str()))
            .collect();
        assert!(!all.contains(&"o3"));
        assert!(!all.contains(&"o4"));
    }

    #[test]
    fn test_empty_day() {
        let sheet = build_run_sheet(d(12), &orders());
        assert!(sheet.schools.is_empty());
        assert_eq!(sheet.total_meals, 0);
        assert!(labels(&sheet).is_empty());
    }

    #[test]
    fn test_labels() {
        let sheet = build_run_sheet(d(10), &orders());
        let labels = labels(&sheet);
        assert_eq!(labels.len(), 4);
        assert_eq!(labels[0].school_name, "Acorn Grammar");
        assert_eq!(labels[0].child_name, "Mia");
        assert_eq!(labels[0].add_ons, "Extra Cheese");
        assert_eq!(labels[0].side_code.as_deref(), Some("GS"));
        assert_eq!(labels[1].child_name, "Adam");
    }
}
