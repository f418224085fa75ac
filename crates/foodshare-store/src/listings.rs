//! Listing lookups, entity browsing and filter options.

use chrono::{Days, NaiveDate};
use foodshare_core::error::FoodError;
use foodshare_core::models::{Claim, FoodListing, Provider, Receiver};
use rusqlite::types::{Type, Value};
use rusqlite::{params_from_iter, Row};
use serde::Serialize;
use std::str::FromStr;
use tracing::debug;

use crate::access::FoodStore;
use crate::error::{Result, StatementContext};

const LISTING_COLUMNS: &str = "Food_ID, Food_Name, Quantity, Expiry_Date, Provider_ID, \
     Provider_Type, Location, Food_Type, Meal_Type";

/// Last date SQLite's `date()` accepts; later dates read as NULL.
const LAST_SQL_DATE: NaiveDate = match NaiveDate::from_ymd_opt(9999, 12, 31) {
    Some(d) => d,
    None => NaiveDate::MAX,
};

// ── Filters ───────────────────────────────────────────────────────────────────

/// Optional value sets restricting a listing query.
///
/// Values within one field are alternatives; fields combine with AND. An
/// empty field places no restriction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListingFilter {
    pub locations: Vec<String>,
    pub provider_types: Vec<String>,
    pub food_types: Vec<String>,
    pub meal_types: Vec<String>,
}

impl ListingFilter {
    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
            && self.provider_types.is_empty()
            && self.food_types.is_empty()
            && self.meal_types.is_empty()
    }

    /// WHERE clause (possibly empty) and its positional parameters.
    fn where_clause(&self) -> (String, Vec<Value>) {
        let mut clauses = Vec::new();
        let mut params = Vec::new();
        for (column, values) in [
            ("Location", &self.locations),
            ("Provider_Type", &self.provider_types),
            ("Food_Type", &self.food_types),
            ("Meal_Type", &self.meal_types),
        ] {
            if values.is_empty() {
                continue;
            }
            let placeholders = vec!["?"; values.len()].join(", ");
            clauses.push(format!("{column} IN ({placeholders})"));
            params.extend(values.iter().cloned().map(Value::Text));
        }
        if clauses.is_empty() {
            (String::new(), params)
        } else {
            (format!(" WHERE {}", clauses.join(" AND ")), params)
        }
    }
}

/// Distinct values available to each listing filter, sorted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FilterOptions {
    /// Provider cities and listing locations combined.
    pub cities: Vec<String>,
    pub provider_types: Vec<String>,
    pub food_types: Vec<String>,
    pub meal_types: Vec<String>,
}

// ── FoodStore read API ────────────────────────────────────────────────────────

impl FoodStore {
    /// Listings matching `filter`, ordered by `Food_ID`.
    pub fn filtered_listings(&self, filter: &ListingFilter) -> Result<Vec<FoodListing>> {
        let (clause, params) = filter.where_clause();
        let sql = format!("SELECT {LISTING_COLUMNS} FROM food_listings{clause} ORDER BY Food_ID");
        self.fetch(&sql, params, listing_from_row)
    }

    /// Listings expiring between `today` and `today + days`, both inclusive,
    /// soonest first. Listings without an expiry date never match.
    pub fn expiring_within(&self, days: u32, today: NaiveDate) -> Result<Vec<FoodListing>> {
        let until = today
            .checked_add_days(Days::new(u64::from(days)))
            .map_or(LAST_SQL_DATE, |d| d.min(LAST_SQL_DATE))
            .max(today);
        let sql = format!(
            "SELECT {LISTING_COLUMNS} FROM food_listings \
             WHERE date(Expiry_Date) BETWEEN date(?1) AND date(?2) \
             ORDER BY Expiry_Date, Food_ID"
        );
        let params = vec![
            Value::Text(today.format("%Y-%m-%d").to_string()),
            Value::Text(until.format("%Y-%m-%d").to_string()),
        ];
        self.fetch(&sql, params, listing_from_row)
    }

    /// Every listing, by expiry date.
    pub fn all_listings(&self) -> Result<Vec<FoodListing>> {
        let sql = format!("SELECT {LISTING_COLUMNS} FROM food_listings ORDER BY Expiry_Date, Food_ID");
        self.fetch(&sql, Vec::new(), listing_from_row)
    }

    /// Every claim, newest first.
    pub fn all_claims(&self) -> Result<Vec<Claim>> {
        self.fetch(
            "SELECT Claim_ID, Food_ID, Receiver_ID, Status, Timestamp FROM claims \
             ORDER BY Timestamp DESC, Claim_ID",
            Vec::new(),
            |row| {
                Ok(Claim {
                    claim_id: row.get(0)?,
                    food_id: row.get(1)?,
                    receiver_id: row.get(2)?,
                    status: category(row, 3)?,
                    timestamp: row.get(4)?,
                })
            },
        )
    }

    /// Every provider, by city then name.
    pub fn all_providers(&self) -> Result<Vec<Provider>> {
        self.fetch(
            "SELECT Provider_ID, Name, Type, Address, City, Contact FROM providers \
             ORDER BY City, Name",
            Vec::new(),
            |row| {
                Ok(Provider {
                    provider_id: row.get(0)?,
                    name: row.get(1)?,
                    provider_type: category(row, 2)?,
                    address: row.get(3)?,
                    city: row.get(4)?,
                    contact: row.get(5)?,
                })
            },
        )
    }

    /// Every receiver, by city then name.
    pub fn all_receivers(&self) -> Result<Vec<Receiver>> {
        self.fetch(
            "SELECT Receiver_ID, Name, Type, City, Contact FROM receivers ORDER BY City, Name",
            Vec::new(),
            |row| {
                Ok(Receiver {
                    receiver_id: row.get(0)?,
                    name: row.get(1)?,
                    receiver_type: category(row, 2)?,
                    city: row.get(3)?,
                    contact: row.get(4)?,
                })
            },
        )
    }

    /// Values to offer in each listing filter.
    pub fn filter_options(&self) -> Result<FilterOptions> {
        Ok(FilterOptions {
            cities: self.fetch(
                "SELECT City FROM providers WHERE TRIM(City) <> '' \
                 UNION SELECT Location FROM food_listings WHERE TRIM(Location) <> '' \
                 ORDER BY 1",
                Vec::new(),
                text_column,
            )?,
            provider_types: self.fetch(
                "SELECT DISTINCT Type FROM providers ORDER BY 1",
                Vec::new(),
                text_column,
            )?,
            food_types: self.fetch(
                "SELECT DISTINCT Food_Type FROM food_listings ORDER BY 1",
                Vec::new(),
                text_column,
            )?,
            meal_types: self.fetch(
                "SELECT DISTINCT Meal_Type FROM food_listings ORDER BY 1",
                Vec::new(),
                text_column,
            )?,
        })
    }

    /// Run `sql` and map every row with `map`.
    pub(crate) fn fetch<T, F>(&self, sql: &str, params: Vec<Value>, map: F) -> Result<Vec<T>>
    where
        F: FnMut(&Row<'_>) -> rusqlite::Result<T>,
    {
        let conn = self.connect()?;
        let mut stmt = conn.prepare(sql).with_sql(sql)?;
        let rows = stmt
            .query_map(params_from_iter(params), map)
            .and_then(|mapped| mapped.collect::<rusqlite::Result<Vec<T>>>())
            .with_sql(sql)?;
        debug!(rows = rows.len(), "{}", sql);
        Ok(rows)
    }
}

// ── Row mapping ───────────────────────────────────────────────────────────────

fn listing_from_row(row: &Row<'_>) -> rusqlite::Result<FoodListing> {
    Ok(FoodListing {
        food_id: row.get(0)?,
        food_name: row.get(1)?,
        quantity: row.get(2)?,
        expiry_date: row.get(3)?,
        provider_id: row.get(4)?,
        provider_type: row.get(5)?,
        location: row.get(6)?,
        food_type: category(row, 7)?,
        meal_type: category(row, 8)?,
    })
}

fn text_column(row: &Row<'_>) -> rusqlite::Result<String> {
    row.get(0)
}

/// Read a categorical column, rejecting labels outside its value set.
fn category<T: FromStr<Err = FoodError>>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T> {
    let raw: String = row.get(idx)?;
    raw.parse()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
