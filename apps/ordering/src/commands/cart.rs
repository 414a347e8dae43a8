//! # Cart Commands
//!
//! Commands for building and editing the parent's cart.
//!
//! ## Add Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  MealRequest { mainId, addOnIds, sideId, fruitId, childIds, dates }    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Resolve children (db) + load active catalog (db)                      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  MealLineBuilder: main → add-ons → side/fruit → children → dates       │
//! │       │            (each step validated, first failure returned)        │
//! │       ▼                                                                 │
//! │  build() ──► one MealLine per (child, date)                            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Cart::add_lines (all or nothing) ──► CartResponse with pricing        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use lunchbox_core::{
    bundle_hint, BundleHint, Catalog, Child, MealLine, MealLineBuilder, PricingResult,
    ValidationError,
};

use crate::error::ApiError;
use crate::state::{CartSession, CartState, ConfigState, DbState};

/// One order-dialog submission.
///
/// `sideId`/`fruitId` left out keep the catalog defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MealRequest {
    pub main_id: String,
    #[serde(default)]
    pub add_on_ids: Vec<String>,
    #[serde(default)]
    pub side_id: Option<String>,
    #[serde(default)]
    pub fruit_id: Option<String>,
    #[serde(default)]
    pub child_ids: Vec<String>,
    #[serde(default)]
    pub dates: Vec<NaiveDate>,
}

/// Cart snapshot returned by every cart command.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartResponse {
    pub lines: Vec<MealLine>,
    pub pricing: PricingResult,
    pub coupon_code: Option<String>,
    pub hint: BundleHint,
    /// Cart drawer savings message; empty when there is nothing to say.
    pub hint_message: String,
    pub final_total_display: String,
}

impl CartResponse {
    pub(crate) fn from_session(session: &CartSession, config: &ConfigState) -> Self {
        let pricing = session.pricing();
        let hint = bundle_hint(pricing.meal_count);

        CartResponse {
            lines: session.cart.lines().to_vec(),
            final_total_display: config.format_money(pricing.final_total),
            pricing,
            coupon_code: session.coupon.as_ref().map(|c| c.code.clone()),
            hint_message: hint.message(),
            hint,
        }
    }
}

/// Fetches children by id, keeping request order and dropping repeats.
pub(crate) async fn resolve_children(db: &DbState, ids: &[String]) -> Result<Vec<Child>, ApiError> {
    let mut seen = BTreeSet::new();
    let mut children = Vec::with_capacity(ids.len());

    for id in ids {
        if !seen.insert(id.as_str()) {
            continue;
        }
        let child = db
            .inner()
            .schools()
            .get_child(id)
            .await?
            .ok_or_else(|| ApiError::not_found("Child", id))?;
        children.push(child);
    }

    Ok(children)
}

/// Runs a request through the meal-line builder.
///
/// `catalog` should be the active view. Unknown ids are `NOT_FOUND`; rule
/// violations surface as the builder's `ValidationError`.
pub fn build_meal_lines(
    catalog: &Catalog,
    children: &[Child],
    request: &MealRequest,
    today: NaiveDate,
) -> Result<Vec<MealLine>, ApiError> {
    let main = catalog
        .main(&request.main_id)
        .ok_or_else(|| ApiError::not_found("Main", &request.main_id))?;

    let mut builder = MealLineBuilder::new(catalog, today);
    builder.select_main(main);

    let mut add_on_ids = BTreeSet::new();
    for id in &request.add_on_ids {
        if !add_on_ids.insert(id.as_str()) {
            continue;
        }
        let add_on = catalog
            .add_on(id)
            .ok_or_else(|| ApiError::not_found("Add-on", id))?;
        builder.toggle_add_on(add_on)?;
    }

    if let Some(id) = &request.side_id {
        let side = catalog.side(id).ok_or_else(|| ApiError::not_found("Side", id))?;
        builder.select_side(side)?;
    }
    if let Some(id) = &request.fruit_id {
        let fruit = catalog.fruit(id).ok_or_else(|| ApiError::not_found("Fruit", id))?;
        builder.select_fruit(fruit)?;
    }

    for child in children {
        builder.toggle_child(child);
    }

    let dates: BTreeSet<NaiveDate> = request.dates.iter().copied().collect();
    for date in dates {
        if !builder.toggle_date(date) {
            return Err(ValidationError::IneligibleDate { date }.into());
        }
    }

    Ok(builder.build()?)
}

/// Returns the current cart with pricing.
pub fn get_cart(cart: &CartState, config: &ConfigState) -> CartResponse {
    debug!("get_cart command");
    cart.with_session(|session| CartResponse::from_session(session, config))
}

/// Builds the requested meals and adds them all to the cart.
pub async fn add_meal_lines(
    db: &DbState,
    cart: &CartState,
    config: &ConfigState,
    request: &MealRequest,
) -> Result<CartResponse, ApiError> {
    debug!(main_id = %request.main_id, "add_meal_lines command");

    let catalog = db.inner().catalog().load_catalog().await?.active();
    let children = resolve_children(db, &request.child_ids).await?;
    let lines = build_meal_lines(&catalog, &children, request, config.today())?;
    let added = lines.len();

    cart.with_session_mut(|session| -> Result<CartResponse, ApiError> {
        session.cart.add_lines(lines)?;
        info!(added, meal_count = session.cart.meal_count(), "Meals added to cart");
        Ok(CartResponse::from_session(session, config))
    })
}

/// Changes a line's main and add-ons; child, school and date stay.
///
/// Fails with a validation error when the kept date is not deliverable
/// for the new main.
pub async fn update_cart_line(
    db: &DbState,
    cart: &CartState,
    config: &ConfigState,
    line_id: &str,
    main_id: &str,
    add_on_ids: &[String],
) -> Result<CartResponse, ApiError> {
    debug!(line_id = %line_id, main_id = %main_id, "update_cart_line command");

    let catalog = db.inner().catalog().load_catalog().await?.active();
    let main = catalog
        .main(main_id)
        .cloned()
        .ok_or_else(|| ApiError::not_found("Main", main_id))?;
    let add_ons = add_on_ids
        .iter()
        .map(|id| {
            catalog
                .add_on(id)
                .cloned()
                .ok_or_else(|| ApiError::not_found("Add-on", id))
        })
        .collect::<Result<Vec<_>, _>>()?;

    cart.with_session_mut(|session| -> Result<CartResponse, ApiError> {
        session
            .cart
            .update_line(line_id, main, add_ons, &catalog, config.today())?;
        Ok(CartResponse::from_session(session, config))
    })
}

pub fn remove_cart_line(
    cart: &CartState,
    config: &ConfigState,
    line_id: &str,
) -> Result<CartResponse, ApiError> {
    debug!(line_id = %line_id, "remove_cart_line command");

    cart.with_session_mut(|session| -> Result<CartResponse, ApiError> {
        session.cart.remove_line(line_id)?;
        Ok(CartResponse::from_session(session, config))
    })
}

/// Empties the cart and drops any applied coupon.
pub fn clear_cart(cart: &CartState, config: &ConfigState) -> CartResponse {
    debug!("clear_cart command");

    cart.with_session_mut(|session| {
        session.reset();
        CartResponse::from_session(session, config)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::fixtures::{day, main, seeded};
    use crate::error::ErrorCode;
    use lunchbox_core::{Main, MenuItem};

    fn request(main_id: &str, children: &[&str], dates: &[NaiveDate]) -> MealRequest {
        MealRequest {
            main_id: main_id.to_string(),
            add_on_ids: Vec::new(),
            side_id: None,
            fruit_id: None,
            child_ids: children.iter().map(|c| c.to_string()).collect(),
            dates: dates.to_vec(),
        }
    }

    #[tokio::test]
    async fn test_add_one_line_per_child_and_date() {
        let (db, cart, config) = seeded().await;
        let req = request("wrap", &["zoe", "adam"], &[day(2), day(1)]);

        let resp = add_meal_lines(&db, &cart, &config, &req).await.unwrap();

        assert_eq!(resp.lines.len(), 4);
        let order: Vec<_> = resp
            .lines
            .iter()
            .map(|l| (l.child.id.as_str(), l.delivery_date))
            .collect();
        assert_eq!(
            order,
            vec![("zoe", day(1)), ("zoe", day(2)), ("adam", day(1)), ("adam", day(2))]
        );
        assert!(resp.lines.iter().all(|l| l.side.as_ref().map(|s| s.id.as_str()) == Some("salad")));

        // 4 x $10.00 = $40.00, 10% bundle → $36.00
        assert_eq!(resp.pricing.subtotal.cents(), 4000);
        assert_eq!(resp.pricing.bundle_discount_rate.bps(), 1000);
        assert_eq!(resp.pricing.final_total.cents(), 3600);
        assert_eq!(resp.final_total_display, "$36.00");
        assert_eq!(resp.hint_message, "You're saving 10%. Add 1 more meal to save 20%");
    }

    #[tokio::test]
    async fn test_main_only_add_on_drops_side_and_fruit() {
        let (db, cart, config) = seeded().await;
        let mut req = request("wrap", &["zoe"], &[day(1)]);
        req.add_on_ids = vec!["cheese".into(), "main-only".into()];

        let resp = add_meal_lines(&db, &cart, &config, &req).await.unwrap();
        let line = &resp.lines[0];

        assert!(line.side.is_none() && line.fruit.is_none());
        // $10.00 + $1.50 - $2.00
        assert_eq!(line.total().cents(), 950);
    }

    #[tokio::test]
    async fn test_side_with_main_only_rejected() {
        let (db, cart, config) = seeded().await;
        let mut req = request("wrap", &["zoe"], &[day(1)]);
        req.add_on_ids = vec!["main-only".into()];
        req.side_id = Some("salad".into());

        let err = add_meal_lines(&db, &cart, &config, &req).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
        assert!(cart.with_session(|s| s.cart.is_empty()));
    }

    #[tokio::test]
    async fn test_validation_failures() {
        let (db, cart, config) = seeded().await;

        let err = add_meal_lines(&db, &cart, &config, &request("wrap", &[], &[day(1)]))
            .await
            .unwrap_err();
        assert_eq!(err.message, ValidationError::MissingChild.to_string());

        let err = add_meal_lines(&db, &cart, &config, &request("wrap", &["zoe"], &[]))
            .await
            .unwrap_err();
        assert_eq!(err.message, ValidationError::MissingDate.to_string());

        // Blocked Friday
        let err = add_meal_lines(&db, &cart, &config, &request("wrap", &["zoe"], &[day(4)]))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);

        let mut req = request("burger", &["zoe"], &[day(1)]);
        req.add_on_ids = vec!["cheese".into()];
        let err = add_meal_lines(&db, &cart, &config, &req).await.unwrap_err();
        assert_eq!(err.message, "Cheese is not available with Main burger");

        let err = add_meal_lines(&db, &cart, &config, &request("wrap", &["ghost"], &[day(1)]))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);

        assert!(cart.with_session(|s| s.cart.is_empty()));
    }

    #[tokio::test]
    async fn test_update_remove_and_clear() {
        let (db, cart, config) = seeded().await;
        let resp = add_meal_lines(&db, &cart, &config, &request("wrap", &["zoe"], &[day(1), day(2)]))
            .await
            .unwrap();
        let first = resp.lines[0].id.clone();

        let resp = update_cart_line(&db, &cart, &config, &first, "burger", &[]).await.unwrap();
        assert_eq!(resp.lines[0].main.id, "burger");
        assert_eq!(resp.pricing.subtotal.cents(), 2200);

        let err = update_cart_line(&db, &cart, &config, &first, "burger", &["cheese".into()])
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);

        let resp = remove_cart_line(&cart, &config, &first).unwrap();
        assert_eq!(resp.lines.len(), 1);
        assert_eq!(resp.hint_message, "Add 1 more meal to save 5%");

        let err = remove_cart_line(&cart, &config, &first).unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);

        let resp = clear_cart(&cart, &config);
        assert!(resp.lines.is_empty());
        assert!(get_cart(&cart, &config).pricing.final_total.is_zero());
    }

    #[tokio::test]
    async fn test_update_to_promo_checks_kept_date() {
        let (db, cart, config) = seeded().await;
        let special = Main {
            is_promo: true,
            valid_dates: Some([day(2)].into_iter().collect()),
            ..main("special", 800, &[])
        };
        db.inner()
            .catalog()
            .upsert_item(&MenuItem::Main(special), 20)
            .await
            .unwrap();

        let resp = add_meal_lines(&db, &cart, &config, &request("wrap", &["zoe"], &[day(1), day(2)]))
            .await
            .unwrap();
        let (monday_line, tuesday_line) = (resp.lines[0].id.clone(), resp.lines[1].id.clone());

        let err = update_cart_line(&db, &cart, &config, &monday_line, "special", &[])
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
        let kept = cart.with_session(|s| s.cart.line(&monday_line).map(|l| l.main.id.clone()));
        assert_eq!(kept.as_deref(), Some("wrap"));

        let resp = update_cart_line(&db, &cart, &config, &tuesday_line, "special", &[])
            .await
            .unwrap();
        assert_eq!(resp.lines[1].main.id, "special");
        assert_eq!(resp.pricing.subtotal.cents(), 1800);
    }

    #[tokio::test]
    async fn test_update_dropping_main_only_restores_sides() {
        let (db, cart, config) = seeded().await;
        let mut req = request("wrap", &["zoe"], &[day(1)]);
        req.add_on_ids = vec!["main-only".into()];
        let resp = add_meal_lines(&db, &cart, &config, &req).await.unwrap();
        let id = resp.lines[0].id.clone();
        assert!(resp.lines[0].side.is_none());

        let resp = update_cart_line(&db, &cart, &config, &id, "wrap", &[]).await.unwrap();
        let line = &resp.lines[0];
        assert_eq!(line.side.as_ref().map(|s| s.id.as_str()), Some("salad"));
        assert_eq!(line.fruit.as_ref().map(|f| f.id.as_str()), Some("apple"));
        assert_eq!(line.total().cents(), 1000);
    }

    #[test]
    fn test_request_json_defaults() {
        let req: MealRequest =
            serde_json::from_str(r#"{"mainId":"wrap","childIds":["zoe"],"dates":["2025-03-04"]}"#)
                .unwrap();

        assert!(req.add_on_ids.is_empty());
        assert_eq!(req.side_id, None);
        assert_eq!(req.dates, vec![NaiveDate::from_ymd_opt(2025, 3, 4).unwrap()]);
    }
}
