//! # Quote Command
//!
//! Prices a batch of meal requests against the stored catalog without
//! touching the session cart. Backs `lunchbox quote`.
//!
//! ```json
//! {
//!   "meals": [
//!     { "mainId": "main-beef-burger", "childIds": ["child-zoe"], "dates": ["2025-03-04"] }
//!   ],
//!   "coupon": "WELCOME10"
//! }
//! ```

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use lunchbox_core::{bundle_hint, compute_totals, Cart, MealLine, PricingResult};

use crate::commands::cart::{build_meal_lines, resolve_children, MealRequest};
use crate::commands::coupon::lookup_valid_coupon;
use crate::error::ApiError;
use crate::state::{ConfigState, DbState};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteRequest {
    pub meals: Vec<MealRequest>,
    #[serde(default)]
    pub coupon: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteResponse {
    pub lines: Vec<MealLine>,
    pub pricing: PricingResult,
    /// The coupon actually priced in.
    pub coupon_code: Option<String>,
    /// Why the requested coupon was left out, if it was.
    pub coupon_error: Option<ApiError>,
    pub hint_message: String,
    pub final_total_display: String,
}

/// Builds every requested meal and prices the lot.
///
/// Meal errors fail the whole quote. A coupon error does not: the quote
/// falls back to bundle-only pricing and reports the reason.
pub async fn quote(
    db: &DbState,
    config: &ConfigState,
    request: &QuoteRequest,
) -> Result<QuoteResponse, ApiError> {
    debug!(meals = request.meals.len(), coupon = ?request.coupon, "quote command");

    let catalog = db.inner().catalog().load_catalog().await?.active();
    let today = config.today();

    let mut cart = Cart::new();
    for meal in &request.meals {
        let children = resolve_children(db, &meal.child_ids).await?;
        cart.add_lines(build_meal_lines(&catalog, &children, meal, today)?)?;
    }

    let (coupon, coupon_error) = match &request.coupon {
        Some(code) => match lookup_valid_coupon(db, code).await {
            Ok(coupon) => (Some(coupon), None),
            Err(err) => (None, Some(err)),
        },
        None => (None, None),
    };

    let pricing = compute_totals(&cart, coupon.as_ref());
    info!(
        meals = pricing.meal_count,
        final_cents = pricing.final_total.cents(),
        "Quote priced"
    );

    Ok(QuoteResponse {
        lines: cart.lines().to_vec(),
        hint_message: bundle_hint(pricing.meal_count).message(),
        final_total_display: config.format_money(pricing.final_total),
        pricing,
        coupon_code: coupon.map(|c| c.code),
        coupon_error,
    })
}
