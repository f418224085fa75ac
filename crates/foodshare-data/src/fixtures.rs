//! Minimal synthetic dataset written when a source CSV is absent.
//!
//! Two providers, two receivers, two listings and three claims covering every
//! claim status. Dates are derived from a caller-supplied reference instant so
//! the fixture is reproducible.

use std::path::{Path, PathBuf};

use chrono::{Duration, NaiveDateTime};
use foodshare_core::error::{FoodError, Result};
use serde::Serialize;
use tracing::info;

use crate::reader::{ClaimRecord, ListingRecord, ProviderRecord, ReceiverRecord, SourcePaths};

const DATE_FORMAT: &str = "%Y-%m-%d";
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

// ── Public API ────────────────────────────────────────────────────────────────

/// Write fixture CSVs for every source in `paths` that does not exist yet.
///
/// Existing files are never touched. Returns the paths that were written.
pub fn write_missing_sources(paths: &SourcePaths, reference: NaiveDateTime) -> Result<Vec<PathBuf>> {
    let mut written = Vec::new();

    if !paths.providers.exists() {
        write_records(&paths.providers, &providers())?;
        written.push(paths.providers.clone());
    }
    if !paths.receivers.exists() {
        write_records(&paths.receivers, &receivers())?;
        written.push(paths.receivers.clone());
    }
    if !paths.listings.exists() {
        write_records(&paths.listings, &listings(reference))?;
        written.push(paths.listings.clone());
    }
    if !paths.claims.exists() {
        write_records(&paths.claims, &claims(reference))?;
        written.push(paths.claims.clone());
    }

    for path in &written {
        info!("Synthesized fixture source {}", path.display());
    }

    Ok(written)
}

// ── Fixture rows ──────────────────────────────────────────────────────────────

fn providers() -> Vec<ProviderRecord> {
    vec![
        ProviderRecord {
            provider_id: cell(1),
            name: cell("Green Bites"),
            provider_type: cell("Restaurant"),
            address: cell("12 MG Road"),
            city: cell("Bengaluru"),
            contact: cell("99999-11111"),
        },
        ProviderRecord {
            provider_id: cell(2),
            name: cell("FreshMart"),
            provider_type: cell("Grocery Store"),
            address: cell("45 Anna Salai"),
            city: cell("Chennai"),
            contact: cell("99999-22222"),
        },
    ]
}

fn receivers() -> Vec<ReceiverRecord> {
    vec![
        ReceiverRecord {
            receiver_id: cell(1),
            name: cell("Helping Hands NGO"),
            receiver_type: cell("NGO"),
            city: cell("Bengaluru"),
            contact: cell("88888-11111"),
        },
        ReceiverRecord {
            receiver_id: cell(2),
            name: cell("City Shelter"),
            receiver_type: cell("Shelter"),
            city: cell("Chennai"),
            contact: cell("88888-22222"),
        },
    ]
}

fn listings(reference: NaiveDateTime) -> Vec<ListingRecord> {
    let today = reference.date();
    vec![
        ListingRecord {
            food_id: cell(101),
            food_name: cell("Veg Biryani"),
            quantity: cell(20),
            expiry_date: cell((today + Duration::days(1)).format(DATE_FORMAT)),
            provider_id: cell(1),
            provider_type: cell("Restaurant"),
            location: cell("Bengaluru"),
            food_type: cell("Vegetarian"),
            meal_type: cell("Lunch"),
        },
        ListingRecord {
            food_id: cell(102),
            food_name: cell("Bread Loaves"),
            quantity: cell(50),
            expiry_date: cell((today + Duration::days(2)).format(DATE_FORMAT)),
            provider_id: cell(2),
            provider_type: cell("Grocery Store"),
            location: cell("Chennai"),
            food_type: cell("Vegan"),
            meal_type: cell("Breakfast"),
        },
    ]
}

fn claims(reference: NaiveDateTime) -> Vec<ClaimRecord> {
    let ts = reference.format(TIMESTAMP_FORMAT).to_string();
    [
        (1001, 101, 1, "Completed"),
        (1002, 101, 1, "Pending"),
        (1003, 102, 2, "Cancelled"),
    ]
    .into_iter()
    .map(|(claim_id, food_id, receiver_id, status)| ClaimRecord {
        claim_id: cell(claim_id),
        food_id: cell(food_id),
        receiver_id: cell(receiver_id),
        status: cell(status),
        timestamp: cell(&ts),
    })
    .collect()
}

// ── Internal helpers ──────────────────────────────────────────────────────────

fn cell(value: impl ToString) -> Option<String> {
    Some(value.to_string())
}

/// Serialize `rows` (with a header row) to `path`, creating parent
/// directories. The file is written under a temporary name and renamed into
/// place so a concurrent reader never sees a half-written source.
fn write_records<R: Serialize>(path: &Path, rows: &[R]) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|source| FoodError::FileWrite {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    let tmp = path.with_extension("csv.tmp");
    let csv_err = |source: csv::Error| FoodError::Csv {
        path: path.to_path_buf(),
        source: Box::new(source),
    };

    let mut writer = csv::Writer::from_path(&tmp).map_err(csv_err)?;
    for row in rows {
        writer.serialize(row).map_err(csv_err)?;
    }
    writer.flush().map_err(|source| FoodError::FileWrite {
        path: tmp.clone(),
        source,
    })?;
    drop(writer);

    std::fs::rename(&tmp, path).map_err(|source| FoodError::FileWrite {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
