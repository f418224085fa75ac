//! CSV source loading for the four entity tables.
//!
//! Values are parsed permissively: malformed IDs, quantities, dates and
//! timestamps become `None` rather than failing the load, and rows the CSV
//! decoder cannot make sense of are skipped.

use std::fs::File;
use std::path::{Path, PathBuf};

use chrono::{NaiveDateTime, Utc};
use foodshare_core::data_processors::{DateProcessor, IdProcessor, TimestampProcessor};
use foodshare_core::error::{FoodError, Result};
use foodshare_core::models::{RawClaim, RawFoodListing, RawProvider, RawReceiver, TableCounts};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::fixtures;

// ── Source locations ──────────────────────────────────────────────────────────

pub const PROVIDERS_FILE: &str = "providers_data.csv";
pub const RECEIVERS_FILE: &str = "receivers_data.csv";
pub const LISTINGS_FILE: &str = "food_listings_data.csv";
pub const CLAIMS_FILE: &str = "claims_data.csv";

/// Paths of the four tabular sources.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourcePaths {
    pub providers: PathBuf,
    pub receivers: PathBuf,
    pub listings: PathBuf,
    pub claims: PathBuf,
}

impl SourcePaths {
    /// The conventional file names inside `data_dir`.
    pub fn in_dir(data_dir: &Path) -> Self {
        Self {
            providers: data_dir.join(PROVIDERS_FILE),
            receivers: data_dir.join(RECEIVERS_FILE),
            listings: data_dir.join(LISTINGS_FILE),
            claims: data_dir.join(CLAIMS_FILE),
        }
    }

    /// Paths in load order.
    pub fn all(&self) -> [&Path; 4] {
        [
            self.providers.as_path(),
            self.receivers.as_path(),
            self.listings.as_path(),
            self.claims.as_path(),
        ]
    }

    /// Sources that do not exist on disk.
    pub fn missing(&self) -> Vec<&Path> {
        self.all().into_iter().filter(|p| !p.exists()).collect()
    }
}

// ── Load options ──────────────────────────────────────────────────────────────

/// Controls how absent sources are handled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadOptions {
    /// When `true`, missing sources are replaced by a small fixture that is
    /// written to disk so later loads see the same data.
    pub allow_synthesized_fixture: bool,
    /// Instant the fixture's expiry dates and claim timestamps are derived from.
    pub fixture_reference: NaiveDateTime,
}

impl LoadOptions {
    pub fn new(allow_synthesized_fixture: bool) -> Self {
        Self {
            allow_synthesized_fixture,
            fixture_reference: Utc::now().naive_utc(),
        }
    }

    /// Pin the fixture reference instant (deterministic fixtures in tests).
    pub fn with_reference(mut self, reference: NaiveDateTime) -> Self {
        self.fixture_reference = reference;
        self
    }
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self::new(true)
    }
}

// ── Loaded tables ─────────────────────────────────────────────────────────────

/// The four tables exactly as read, in source order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTables {
    pub providers: Vec<RawProvider>,
    pub receivers: Vec<RawReceiver>,
    pub listings: Vec<RawFoodListing>,
    pub claims: Vec<RawClaim>,
}

impl RawTables {
    pub fn counts(&self) -> TableCounts {
        TableCounts {
            providers: self.providers.len(),
            receivers: self.receivers.len(),
            food_listings: self.listings.len(),
            claims: self.claims.len(),
        }
    }
}

/// Result of [`load_sources`].
#[derive(Debug, Clone, Default)]
pub struct LoadedSources {
    pub tables: RawTables,
    /// Sources that were absent and have now been written from the fixture.
    pub synthesized: Vec<PathBuf>,
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Load all four sources.
///
/// Missing sources are synthesized first when `options` allows it; otherwise
/// the first missing path is reported as [`FoodError::SourceMissing`].
pub fn load_sources(paths: &SourcePaths, options: &LoadOptions) -> Result<LoadedSources> {
    let synthesized = if options.allow_synthesized_fixture {
        fixtures::write_missing_sources(paths, options.fixture_reference)?
    } else {
        if let Some(missing) = paths.missing().first() {
            return Err(FoodError::SourceMissing(missing.to_path_buf()));
        }
        Vec::new()
    };

    let tables = RawTables {
        providers: read_records::<ProviderRecord>(&paths.providers)?
            .into_iter()
            .map(RawProvider::from)
            .collect(),
        receivers: read_records::<ReceiverRecord>(&paths.receivers)?
            .into_iter()
            .map(RawReceiver::from)
            .collect(),
        listings: read_records::<ListingRecord>(&paths.listings)?
            .into_iter()
            .map(RawFoodListing::from)
            .collect(),
        claims: read_records::<ClaimRecord>(&paths.claims)?
            .into_iter()
            .map(RawClaim::from)
            .collect(),
    };

    let counts = tables.counts();
    info!(
        providers = counts.providers,
        receivers = counts.receivers,
        food_listings = counts.food_listings,
        claims = counts.claims,
        "loaded source tables"
    );

    Ok(LoadedSources {
        tables,
        synthesized,
    })
}

// ── CSV records ───────────────────────────────────────────────────────────────
//
// Every column is read as optional text so that a bad value in one cell, a
// short row or a missing column never rejects the row; typed parsing happens
// in the `From` conversions below.

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct ProviderRecord {
    #[serde(rename = "Provider_ID")]
    pub provider_id: Option<String>,
    #[serde(rename = "Name")]
    pub name: Option<String>,
    #[serde(rename = "Type")]
    pub provider_type: Option<String>,
    #[serde(rename = "Address")]
    pub address: Option<String>,
    #[serde(rename = "City")]
    pub city: Option<String>,
    #[serde(rename = "Contact")]
    pub contact: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct ReceiverRecord {
    #[serde(rename = "Receiver_ID")]
    pub receiver_id: Option<String>,
    #[serde(rename = "Name")]
    pub name: Option<String>,
    #[serde(rename = "Type")]
    pub receiver_type: Option<String>,
    #[serde(rename = "City")]
    pub city: Option<String>,
    #[serde(rename = "Contact")]
    pub contact: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct ListingRecord {
    #[serde(rename = "Food_ID")]
    pub food_id: Option<String>,
    #[serde(rename = "Food_Name")]
    pub food_name: Option<String>,
    #[serde(rename = "Quantity")]
    pub quantity: Option<String>,
    #[serde(rename = "Expiry_Date")]
    pub expiry_date: Option<String>,
    #[serde(rename = "Provider_ID")]
    pub provider_id: Option<String>,
    #[serde(rename = "Provider_Type")]
    pub provider_type: Option<String>,
    #[serde(rename = "Location")]
    pub location: Option<String>,
    #[serde(rename = "Food_Type")]
    pub food_type: Option<String>,
    #[serde(rename = "Meal_Type")]
    pub meal_type: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct ClaimRecord {
    #[serde(rename = "Claim_ID")]
    pub claim_id: Option<String>,
    #[serde(rename = "Food_ID")]
    pub food_id: Option<String>,
    #[serde(rename = "Receiver_ID")]
    pub receiver_id: Option<String>,
    #[serde(rename = "Status")]
    pub status: Option<String>,
    #[serde(rename = "Timestamp")]
    pub timestamp: Option<String>,
}

impl From<ProviderRecord> for RawProvider {
    fn from(r: ProviderRecord) -> Self {
        RawProvider {
            provider_id: IdProcessor::parse(cell(&r.provider_id)),
            name: text(r.name),
            provider_type: text(r.provider_type),
            address: text(r.address),
            city: text(r.city),
            contact: text(r.contact),
        }
    }
}

impl From<ReceiverRecord> for RawReceiver {
    fn from(r: ReceiverRecord) -> Self {
        RawReceiver {
            receiver_id: IdProcessor::parse(cell(&r.receiver_id)),
            name: text(r.name),
            receiver_type: text(r.receiver_type),
            city: text(r.city),
            contact: text(r.contact),
        }
    }
}

impl From<ListingRecord> for RawFoodListing {
    fn from(r: ListingRecord) -> Self {
        RawFoodListing {
            food_id: IdProcessor::parse(cell(&r.food_id)),
            food_name: text(r.food_name),
            quantity: IdProcessor::parse_quantity(cell(&r.quantity)),
            expiry_date: DateProcessor::parse(cell(&r.expiry_date)),
            provider_id: IdProcessor::parse(cell(&r.provider_id)),
            provider_type: text(r.provider_type),
            location: text(r.location),
            food_type: text(r.food_type),
            meal_type: text(r.meal_type),
        }
    }
}

impl From<ClaimRecord> for RawClaim {
    fn from(r: ClaimRecord) -> Self {
        RawClaim {
            claim_id: IdProcessor::parse(cell(&r.claim_id)),
            food_id: IdProcessor::parse(cell(&r.food_id)),
            receiver_id: IdProcessor::parse(cell(&r.receiver_id)),
            status: text(r.status),
            timestamp: TimestampProcessor::parse(cell(&r.timestamp)),
        }
    }
}

// ── Internal helpers ──────────────────────────────────────────────────────────

fn cell(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or("")
}

fn text(value: Option<String>) -> String {
    value.unwrap_or_default()
}

/// Read every decodable row of a headed CSV file.
///
/// Missing columns read as blank; extra columns are ignored; ragged rows are
/// tolerated. Rows that still fail to decode are skipped.
fn read_records<R: DeserializeOwned>(path: &Path) -> Result<Vec<R>> {
    let file = File::open(path).map_err(|source| FoodError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(file);

    let mut rows = Vec::new();
    let mut skipped = 0usize;
    for result in reader.deserialize::<R>() {
        match result {
            Ok(row) => rows.push(row),
            Err(e) => {
                skipped += 1;
                debug!("Skipping undecodable row in {}: {}", path.display(), e);
            }
        }
    }

    if skipped > 0 {
        warn!("{}: skipped {} undecodable rows", path.display(), skipped);
    }
    debug!("{}: {} rows read", path.display(), rows.len());

    Ok(rows)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn write_csv(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    fn reference() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 6, 1)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    fn write_minimal_sources(dir: &Path) -> SourcePaths {
        write_csv(
            dir,
            PROVIDERS_FILE,
            "Provider_ID,Name,Type,Address,City,Contact\n1,Green Bites,Restaurant,12 MG Road,Bengaluru,999\n",
        );
        write_csv(
            dir,
            RECEIVERS_FILE,
            "Receiver_ID,Name,Type,City,Contact\n1,Helping Hands,NGO,Bengaluru,888\n",
        );
        write_csv(
            dir,
            LISTINGS_FILE,
            "Food_ID,Food_Name,Quantity,Expiry_Date,Provider_ID,Provider_Type,Location,Food_Type,Meal_Type\n\
             101,Veg Biryani,20,2025-06-02,1,Restaurant,Bengaluru,Vegetarian,Lunch\n",
        );
        write_csv(
            dir,
            CLAIMS_FILE,
            "Claim_ID,Food_ID,Receiver_ID,Status,Timestamp\n1001,101,1,Completed,2025-06-01 10:00:00\n",
        );
        SourcePaths::in_dir(dir)
    }

    // ── SourcePaths ───────────────────────────────────────────────────────────

    #[test]
    fn test_source_paths_in_dir() {
        let paths = SourcePaths::in_dir(Path::new("/data"));
        assert_eq!(paths.providers, PathBuf::from("/data/providers_data.csv"));
        assert_eq!(paths.claims, PathBuf::from("/data/claims_data.csv"));
    }

    #[test]
    fn test_source_paths_missing() {
        let dir = TempDir::new().unwrap();
        write_csv(dir.path(), PROVIDERS_FILE, "Provider_ID\n1\n");
        let paths = SourcePaths::in_dir(dir.path());
        assert_eq!(paths.missing().len(), 3);
    }

    // ── load_sources ──────────────────────────────────────────────────────────

    #[test]
    fn test_load_sources_typed_values() {
        let dir = TempDir::new().unwrap();
        let paths = write_minimal_sources(dir.path());

        let loaded = load_sources(&paths, &LoadOptions::new(false)).unwrap();
        let tables = loaded.tables;

        assert!(loaded.synthesized.is_empty());
        assert_eq!(tables.providers[0].provider_id, Some(1));
        assert_eq!(tables.providers[0].provider_type, "Restaurant");
        assert_eq!(tables.listings[0].quantity, Some(20));
        assert_eq!(
            tables.listings[0].expiry_date,
            NaiveDate::from_ymd_opt(2025, 6, 2)
        );
        assert_eq!(tables.claims[0].status, "Completed");
        assert!(tables.claims[0].timestamp.is_some());
    }

    #[test]
    fn test_load_sources_malformed_values_become_none() {
        let dir = TempDir::new().unwrap();
        let paths = write_minimal_sources(dir.path());
        write_csv(
            dir.path(),
            LISTINGS_FILE,
            "Food_ID,Food_Name,Quantity,Expiry_Date,Provider_ID,Provider_Type,Location,Food_Type,Meal_Type\n\
             abc,Soup,lots,someday,,Restaurant,Pune,Vegan,Dinner\n",
        );

        let tables = load_sources(&paths, &LoadOptions::new(false)).unwrap().tables;
        let listing = &tables.listings[0];

        assert_eq!(listing.food_id, None);
        assert_eq!(listing.quantity, None);
        assert_eq!(listing.expiry_date, None);
        assert_eq!(listing.provider_id, None);
        assert_eq!(listing.food_name, "Soup");
    }

    #[test]
    fn test_load_sources_missing_column_reads_blank() {
        let dir = TempDir::new().unwrap();
        let paths = write_minimal_sources(dir.path());
        write_csv(
            dir.path(),
            RECEIVERS_FILE,
            "Receiver_ID,Name,City\n5,Night Shelter,Chennai\n",
        );

        let tables = load_sources(&paths, &LoadOptions::new(false)).unwrap().tables;
        assert_eq!(tables.receivers[0].receiver_id, Some(5));
        assert_eq!(tables.receivers[0].receiver_type, "");
        assert_eq!(tables.receivers[0].contact, "");
    }

    #[test]
    fn test_load_sources_ragged_rows_tolerated() {
        let dir = TempDir::new().unwrap();
        let paths = write_minimal_sources(dir.path());
        write_csv(
            dir.path(),
            CLAIMS_FILE,
            "Claim_ID,Food_ID,Receiver_ID,Status,Timestamp\n1001,101,1\n1002,101,1,Pending,2025-06-01 11:00:00,extra\n",
        );

        let tables = load_sources(&paths, &LoadOptions::new(false)).unwrap().tables;
        assert_eq!(tables.claims.len(), 2);
        assert_eq!(tables.claims[0].status, "");
        assert_eq!(tables.claims[1].status, "Pending");
    }

    #[test]
    fn test_load_sources_header_whitespace_trimmed() {
        let dir = TempDir::new().unwrap();
        let paths = write_minimal_sources(dir.path());
        write_csv(
            dir.path(),
            PROVIDERS_FILE,
            " Provider_ID , Name ,Type,Address,City,Contact\n3,Daily Bread,Bakery,,Pune,\n",
        );

        let tables = load_sources(&paths, &LoadOptions::new(false)).unwrap().tables;
        assert_eq!(tables.providers[0].provider_id, Some(3));
        assert_eq!(tables.providers[0].name, "Daily Bread");
    }

    #[test]
    fn test_load_sources_missing_without_fixture_errors() {
        let dir = TempDir::new().unwrap();
        let paths = SourcePaths::in_dir(dir.path());

        let err = load_sources(&paths, &LoadOptions::new(false)).unwrap_err();
        assert!(matches!(err, FoodError::SourceMissing(p) if p == paths.providers));
        assert!(!paths.providers.exists());
    }

    #[test]
    fn test_load_sources_default_fixture() {
        let dir = TempDir::new().unwrap();
        let paths = SourcePaths::in_dir(&dir.path().join("data"));

        let options = LoadOptions::new(true).with_reference(reference());
        let loaded = load_sources(&paths, &options).unwrap();

        assert_eq!(loaded.tables.providers.len(), 2);
        assert_eq!(loaded.tables.receivers.len(), 2);
        assert_eq!(loaded.tables.listings.len(), 2);
        assert_eq!(loaded.tables.claims.len(), 3);
        assert_eq!(loaded.synthesized.len(), 4);
        assert!(paths.all().iter().all(|p| p.exists()));
    }

    #[test]
    fn test_load_sources_fixture_is_stable_across_loads() {
        let dir = TempDir::new().unwrap();
        let paths = SourcePaths::in_dir(dir.path());

        let first = load_sources(&paths, &LoadOptions::new(true).with_reference(reference()))
            .unwrap();
        // A later load with a different reference must read the persisted files.
        let later = reference() + chrono::Duration::days(30);
        let second =
            load_sources(&paths, &LoadOptions::new(true).with_reference(later)).unwrap();

        assert!(second.synthesized.is_empty());
        assert_eq!(first.tables, second.tables);
    }

    #[test]
    fn test_load_sources_only_missing_sources_synthesized() {
        let dir = TempDir::new().unwrap();
        write_csv(
            dir.path(),
            PROVIDERS_FILE,
            "Provider_ID,Name,Type,Address,City,Contact\n9,Solo Cafe,Caterer,,Delhi,\n",
        );
        let paths = SourcePaths::in_dir(dir.path());

        let loaded =
            load_sources(&paths, &LoadOptions::new(true).with_reference(reference())).unwrap();

        assert_eq!(loaded.synthesized.len(), 3);
        assert_eq!(loaded.tables.providers.len(), 1);
        assert_eq!(loaded.tables.providers[0].provider_id, Some(9));
    }

    #[test]
    fn test_load_sources_empty_file_yields_no_rows() {
        let dir = TempDir::new().unwrap();
        let paths = write_minimal_sources(dir.path());
        write_csv(dir.path(), CLAIMS_FILE, "");

        let tables = load_sources(&paths, &LoadOptions::new(false)).unwrap().tables;
        assert!(tables.claims.is_empty());
    }
}
