//! # Catalog Repository
//!
//! Menu items of every kind share the `menu_items` table, discriminated by
//! `kind`. Mains keep their compatible add-ons in `main_add_ons` and their
//! promo delivery days in `main_valid_dates`.
//!
//! ## Loading
//! ```text
//! menu_items ─────┐
//! main_add_ons ───┼──► Vec<MenuItem> ──┐
//! main_valid_dates┘                    ├──► Catalog
//! schools (SchoolRepository) ──────────┤
//! blocked_dates ───────────────────────┘
//! ```

use std::collections::{BTreeSet, HashMap};

use chrono::{NaiveDate, Utc};
use sqlx::{Sqlite, SqlitePool, Transaction};
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::repository::blocked_dates::BlockedDateRepository;
use crate::repository::school::SchoolRepository;
use lunchbox_core::{
    AddOn, Catalog, Drink, Fruit, Main, MenuItem, MenuItemKind, Money, Platter, Side,
};

/// Repository for catalog database operations.
#[derive(Debug, Clone)]
pub struct CatalogRepository {
    pool: SqlitePool,
}

#[derive(Debug, sqlx::FromRow)]
struct MenuItemRow {
    id: String,
    kind: MenuItemKind,
    name: String,
    description: Option<String>,
    image: Option<String>,
    price_cents: Option<i64>,
    short_code: Option<String>,
    allergens: String,
    is_new: bool,
    is_active: bool,
    is_featured: bool,
    is_vegetarian: bool,
    is_promo: bool,
    disable_sides_selection: bool,
    excludes_sides_and_fruit: bool,
}

impl MenuItemRow {
    fn price(&self) -> DbResult<Money> {
        self.price_cents
            .map(Money::from_cents)
            .ok_or_else(|| DbError::invalid_data("price_cents", format!("missing for {}", self.id)))
    }

    fn into_item(
        self,
        add_on_ids: Vec<String>,
        valid_dates: Option<BTreeSet<NaiveDate>>,
    ) -> DbResult<MenuItem> {
        let item = match self.kind {
            MenuItemKind::Main => MenuItem::Main(Main {
                price: self.price()?,
                allergens: serde_json::from_str(&self.allergens)?,
                id: self.id,
                name: self.name,
                image: self.image,
                description: self.description,
                is_new: self.is_new,
                is_active: self.is_active,
                is_featured: self.is_featured,
                is_vegetarian: self.is_vegetarian,
                is_promo: self.is_promo,
                disable_sides_selection: self.disable_sides_selection,
                add_on_ids,
                valid_dates,
            }),
            MenuItemKind::AddOn => MenuItem::AddOn(AddOn {
                price: self.price()?,
                id: self.id,
                name: self.name,
                excludes_sides_and_fruit: self.excludes_sides_and_fruit,
                is_active: self.is_active,
            }),
            MenuItemKind::Side => MenuItem::Side(Side {
                id: self.id,
                name: self.name,
                short_code: self.short_code,
                is_active: self.is_active,
            }),
            MenuItemKind::Fruit => MenuItem::Fruit(Fruit {
                id: self.id,
                name: self.name,
                short_code: self.short_code,
                is_active: self.is_active,
            }),
            MenuItemKind::Drink => MenuItem::Drink(Drink {
                price: self.price()?,
                id: self.id,
                name: self.name,
                is_active: self.is_active,
            }),
            MenuItemKind::Platter => MenuItem::Platter(Platter {
                price: self.price()?,
                id: self.id,
                name: self.name,
                image: self.image,
                description: self.description,
                is_active: self.is_active,
            }),
        };
        Ok(item)
    }
}

#[derive(Debug, sqlx::FromRow)]
struct AddOnLinkRow {
    main_id: String,
    add_on_id: String,
}

#[derive(Debug, sqlx::FromRow)]
struct PromoDateRow {
    main_id: String,
    date: NaiveDate,
}

const SELECT_ITEMS: &str = r#"
    SELECT
        id, kind, name, description, image, price_cents, short_code,
        allergens, is_new, is_active, is_featured, is_vegetarian, is_promo,
        disable_sides_selection, excludes_sides_and_fruit
    FROM menu_items
"#;

impl CatalogRepository {
    /// Creates a new CatalogRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CatalogRepository { pool }
    }

    /// Loads the full catalog: items, schools and blocked dates.
    ///
    /// Inactive items are included; call [`Catalog::active`] for the
    /// parent-facing view.
    pub async fn load_catalog(&self) -> DbResult<Catalog> {
        let items = self.list_items().await?;
        let schools = SchoolRepository::new(self.pool.clone()).list().await?;
        let blocked = BlockedDateRepository::new(self.pool.clone()).dates().await?;

        debug!(
            items = items.len(),
            schools = schools.len(),
            blocked_dates = blocked.len(),
            "Catalog loaded"
        );

        Ok(Catalog::new(items, schools).with_blocked_dates(blocked))
    }

    /// Lists every item in catalog order.
    pub async fn list_items(&self) -> DbResult<Vec<MenuItem>> {
        let rows: Vec<MenuItemRow> =
            sqlx::query_as(&format!("{} ORDER BY sort_order, rowid", SELECT_ITEMS))
                .fetch_all(&self.pool)
                .await?;

        let links: Vec<AddOnLinkRow> = sqlx::query_as(
            "SELECT main_id, add_on_id FROM main_add_ons ORDER BY main_id, position",
        )
        .fetch_all(&self.pool)
        .await?;

        let dates: Vec<PromoDateRow> =
            sqlx::query_as("SELECT main_id, date FROM main_valid_dates ORDER BY main_id, date")
                .fetch_all(&self.pool)
                .await?;

        let mut add_ons: HashMap<String, Vec<String>> = HashMap::new();
        for link in links {
            add_ons.entry(link.main_id).or_default().push(link.add_on_id);
        }

        let mut promo_dates: HashMap<String, BTreeSet<NaiveDate>> = HashMap::new();
        for row in dates {
            promo_dates.entry(row.main_id).or_default().insert(row.date);
        }

        rows.into_iter()
            .map(|row| {
                let add_on_ids = add_ons.remove(&row.id).unwrap_or_default();
                let valid_dates = promo_dates.remove(&row.id);
                row.into_item(add_on_ids, valid_dates)
            })
            .collect()
    }

    /// Gets one item by ID.
    pub async fn get_item(&self, id: &str) -> DbResult<Option<MenuItem>> {
        let row: Option<MenuItemRow> = sqlx::query_as(&format!("{} WHERE id = ?1", SELECT_ITEMS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        if row.kind != MenuItemKind::Main {
            return row.into_item(Vec::new(), None).map(Some);
        }

        let add_on_ids: Vec<String> = sqlx::query_scalar(
            "SELECT add_on_id FROM main_add_ons WHERE main_id = ?1 ORDER BY position",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        let dates: Vec<NaiveDate> =
            sqlx::query_scalar("SELECT date FROM main_valid_dates WHERE main_id = ?1")
                .bind(id)
                .fetch_all(&self.pool)
                .await?;
        let valid_dates = (!dates.is_empty()).then(|| dates.into_iter().collect());

        row.into_item(add_on_ids, valid_dates).map(Some)
    }

    /// Inserts or replaces an item at the given catalog position.
    ///
    /// For mains the add-on links and promo dates are rewritten in the same
    /// transaction. Links to add-ons that don't exist fail with a foreign
    /// key violation and nothing is written.
    pub async fn upsert_item(&self, item: &MenuItem, sort_order: i64) -> DbResult<()> {
        debug!(id = %item.id(), kind = ?item.kind(), "Upserting menu item");

        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let (description, image) = match item {
            MenuItem::Main(m) => (m.description.as_deref(), m.image.as_deref()),
            MenuItem::Platter(p) => (p.description.as_deref(), p.image.as_deref()),
            _ => (None, None),
        };
        let short_code = match item {
            MenuItem::Side(s) => s.short_code.as_deref(),
            MenuItem::Fruit(f) => f.short_code.as_deref(),
            _ => None,
        };
        let allergens = match item.allergens() {
            Some(set) => serde_json::to_string(set)?,
            None => "[]".to_string(),
        };
        let main = match item {
            MenuItem::Main(m) => Some(m),
            _ => None,
        };
        let excludes_sides_and_fruit = matches!(item, MenuItem::AddOn(a) if a.excludes_sides_and_fruit);

        sqlx::query(
            r#"
            INSERT INTO menu_items (
                id, kind, name, description, image, price_cents, short_code,
                allergens, is_new, is_active, is_featured, is_vegetarian, is_promo,
                disable_sides_selection, excludes_sides_and_fruit, sort_order,
                created_at, updated_at
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5, ?6, ?7,
                ?8, ?9, ?10, ?11, ?12, ?13,
                ?14, ?15, ?16,
                ?17, ?17
            )
            ON CONFLICT (id) DO UPDATE SET
                kind = excluded.kind,
                name = excluded.name,
                description = excluded.description,
                image = excluded.image,
                price_cents = excluded.price_cents,
                short_code = excluded.short_code,
                allergens = excluded.allergens,
                is_new = excluded.is_new,
                is_active = excluded.is_active,
                is_featured = excluded.is_featured,
                is_vegetarian = excluded.is_vegetarian,
                is_promo = excluded.is_promo,
                disable_sides_selection = excluded.disable_sides_selection,
                excludes_sides_and_fruit = excluded.excludes_sides_and_fruit,
                sort_order = excluded.sort_order,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(item.id())
        .bind(item.kind())
        .bind(item.name())
        .bind(description)
        .bind(image)
        .bind(item.price().map(|p| p.cents()))
        .bind(short_code)
        .bind(allergens)
        .bind(main.is_some_and(|m| m.is_new))
        .bind(item.is_active())
        .bind(main.is_some_and(|m| m.is_featured))
        .bind(main.is_some_and(|m| m.is_vegetarian))
        .bind(main.is_some_and(|m| m.is_promo))
        .bind(main.is_some_and(|m| m.disable_sides_selection))
        .bind(excludes_sides_and_fruit)
        .bind(sort_order)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        if let Some(main) = main {
            write_main_links(&mut tx, main).await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// Activates or deactivates an item. Inactive items stay referenced by
    /// past orders but are hidden from parents.
    pub async fn set_active(&self, id: &str, is_active: bool) -> DbResult<()> {
        debug!(id = %id, is_active, "Setting menu item active flag");

        let result = sqlx::query(
            "UPDATE menu_items SET is_active = ?2, updated_at = ?3 WHERE id = ?1",
        )
        .bind(id)
        .bind(is_active)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Menu item", id));
        }

        Ok(())
    }

    /// Deletes an item. Add-on links and promo dates cascade.
    pub async fn delete_item(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting menu item");

        let result = sqlx::query("DELETE FROM menu_items WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Menu item", id));
        }

        Ok(())
    }
}

async fn write_main_links(tx: &mut Transaction<'_, Sqlite>, main: &Main) -> DbResult<()> {
    sqlx::query("DELETE FROM main_add_ons WHERE main_id = ?1")
        .bind(&main.id)
        .execute(&mut **tx)
        .await?;

    for (position, add_on_id) in main.add_on_ids.iter().enumerate() {
        sqlx::query("INSERT INTO main_add_ons (main_id, add_on_id, position) VALUES (?1, ?2, ?3)")
            .bind(&main.id)
            .bind(add_on_id)
            .bind(position as i64)
            .execute(&mut **tx)
            .await?;
    }

    sqlx::query("DELETE FROM main_valid_dates WHERE main_id = ?1")
        .bind(&main.id)
        .execute(&mut **tx)
        .await?;

    for date in main.valid_dates.iter().flatten() {
        sqlx::query("INSERT INTO main_valid_dates (main_id, date) VALUES (?1, ?2)")
            .bind(&main.id)
            .bind(date)
            .execute(&mut **tx)
            .await?;
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
