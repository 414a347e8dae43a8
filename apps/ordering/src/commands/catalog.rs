//! # Catalog Commands
//!
//! Read-side commands backing the menu grid and the order dialog.

use chrono::NaiveDate;
use tracing::debug;

use lunchbox_core::{Catalog, Child, MealLineBuilder};

use crate::error::ApiError;
use crate::state::{ConfigState, DbState};

/// Loads the orderable catalog: active items and schools only.
pub async fn get_catalog(db: &DbState) -> Result<Catalog, ApiError> {
    debug!("get_catalog command");

    let catalog = db.inner().catalog().load_catalog().await?;
    Ok(catalog.active())
}

/// Lists the dates the order dialog offers for `main_id` and the selected
/// children, starting at today and spanning the configured window.
///
/// With no children selected, only the main's own rules apply.
pub async fn get_selectable_dates(
    db: &DbState,
    config: &ConfigState,
    main_id: &str,
    child_ids: &[String],
) -> Result<Vec<NaiveDate>, ApiError> {
    debug!(main_id = %main_id, children = child_ids.len(), "get_selectable_dates command");

    let catalog = get_catalog(db).await?;
    let main = catalog
        .main(main_id)
        .ok_or_else(|| ApiError::not_found("Main", main_id))?;
    let children = super::cart::resolve_children(db, child_ids).await?;

    let today = config.today();
    let mut builder = MealLineBuilder::new(&catalog, today);
    builder.select_main(main);
    for child in &children {
        builder.toggle_child(child);
    }

    Ok(today
        .iter_days()
        .take(config.order_window_days as usize)
        .filter(|date| builder.is_date_selectable(*date))
        .collect())
}

/// Lists a parent's children, sorted by name.
pub async fn list_children(db: &DbState, parent_id: &str) -> Result<Vec<Child>, ApiError> {
    debug!(parent_id = %parent_id, "list_children command");

    Ok(db.inner().schools().children_of(parent_id).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::fixtures::{day, seeded, PARENT};
    use crate::error::ErrorCode;

    #[tokio::test]
    async fn test_catalog_hides_inactive_items() {
        let (db, _, _) = seeded().await;
        let catalog = get_catalog(&db).await.unwrap();

        let mains: Vec<_> = catalog.mains().map(|m| m.id.as_str()).collect();
        assert_eq!(mains, vec!["wrap", "burger"]);
        assert_eq!(catalog.default_side().map(|s| s.id.as_str()), Some("salad"));
        assert!(catalog.blocked_dates.contains(&day(4)));
    }

    #[tokio::test]
    async fn test_selectable_dates_skip_weekend_today_and_blocked() {
        let (db, _, config) = seeded().await;
        let children = vec!["zoe".to_string()];

        let dates = get_selectable_dates(&db, &config, "wrap", &children).await.unwrap();

        assert_eq!(
            dates,
            vec![day(1), day(2), day(3), day(7), day(8), day(9), day(10), day(11)]
        );
    }

    #[tokio::test]
    async fn test_selectable_dates_unknown_main() {
        let (db, _, config) = seeded().await;

        let err = get_selectable_dates(&db, &config, "retired", &[]).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn test_list_children() {
        let (db, _, _) = seeded().await;

        let names: Vec<_> = list_children(&db, PARENT)
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, vec!["Adam", "Zoe"]);
        assert!(list_children(&db, "someone-else").await.unwrap().is_empty());
    }
}
