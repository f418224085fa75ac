//! Load pipeline: sources in, normalized tables out.
//!
//! Reads the sources and normalizes them back to back, returning the clean
//! tables with timing and row-count metadata for the store builder.

use std::path::PathBuf;
use std::time::Instant;

use chrono::Utc;
use foodshare_core::error::Result;
use foodshare_core::models::TableCounts;
use serde::Serialize;
use tracing::info;

use crate::normalizer::{normalize, CleanTables, NormalizeReport};
use crate::reader::{load_sources, LoadOptions, SourcePaths};

// ── Public types ──────────────────────────────────────────────────────────────

/// Metadata produced alongside the prepared tables.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineMetadata {
    /// ISO-8601 timestamp when this result was generated.
    pub generated_at: String,
    /// Sources that were absent and written from the fixture during this run.
    pub synthesized_sources: Vec<PathBuf>,
    /// Row counts as read.
    pub raw_counts: TableCounts,
    /// Row counts after normalization.
    pub clean_counts: TableCounts,
    /// Wall-clock seconds spent reading the CSV sources.
    pub load_time_seconds: f64,
    /// Wall-clock seconds spent normalizing.
    pub normalize_time_seconds: f64,
}

/// The complete output of [`prepare_tables`].
#[derive(Debug, Clone)]
pub struct PreparedData {
    pub tables: CleanTables,
    pub report: NormalizeReport,
    pub metadata: PipelineMetadata,
}

// ── Public function ───────────────────────────────────────────────────────────

/// Load and normalize the four sources.
///
/// 1. Read (and, if allowed, synthesize) the CSV sources.
/// 2. Deduplicate, resolve references and clamp categorical values.
/// 3. Return a [`PreparedData`] ready to be persisted.
pub fn prepare_tables(paths: &SourcePaths, options: &LoadOptions) -> Result<PreparedData> {
    // ── Step 1: Load ──────────────────────────────────────────────────────────
    let load_start = Instant::now();
    let loaded = load_sources(paths, options)?;
    let load_time = load_start.elapsed().as_secs_f64();
    let raw_counts = loaded.tables.counts();

    // ── Step 2: Normalize ─────────────────────────────────────────────────────
    let normalize_start = Instant::now();
    let (tables, report) = normalize(loaded.tables);
    let normalize_time = normalize_start.elapsed().as_secs_f64();

    // ── Step 3: Build result ──────────────────────────────────────────────────
    let metadata = PipelineMetadata {
        generated_at: Utc::now().to_rfc3339(),
        synthesized_sources: loaded.synthesized,
        raw_counts,
        clean_counts: tables.counts(),
        load_time_seconds: load_time,
        normalize_time_seconds: normalize_time,
    };

    info!(
        "Prepared {} rows ({} dropped) in {:.3}s",
        metadata.clean_counts.total(),
        report.rows_dropped(),
        load_time + normalize_time
    );

    Ok(PreparedData {
        tables,
        report,
        metadata,
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::{CLAIMS_FILE, LISTINGS_FILE, PROVIDERS_FILE, RECEIVERS_FILE};
    use chrono::NaiveDate;
    use foodshare_core::error::FoodError;
    use foodshare_core::models::ClaimStatus;
    use std::path::Path;
    use tempfile::TempDir;

    fn options() -> LoadOptions {
        let reference = NaiveDate::from_ymd_opt(2025, 3, 10)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap();
        LoadOptions::new(true).with_reference(reference)
    }

    fn write(dir: &Path, name: &str, content: &str) {
        std::fs::write(dir.join(name), content).unwrap();
    }

    #[test]
    fn test_prepare_tables_from_fixture() {
        let dir = TempDir::new().unwrap();
        let paths = SourcePaths::in_dir(dir.path());

        let prepared = prepare_tables(&paths, &options()).unwrap();

        assert_eq!(prepared.metadata.synthesized_sources.len(), 4);
        assert_eq!(prepared.metadata.raw_counts, prepared.metadata.clean_counts);
        assert_eq!(prepared.metadata.clean_counts.total(), 9);
        let statuses: Vec<ClaimStatus> = prepared.tables.claims.iter().map(|c| c.status).collect();
        assert_eq!(
            statuses,
            vec![
                ClaimStatus::Completed,
                ClaimStatus::Pending,
                ClaimStatus::Cancelled
            ]
        );
    }

    #[test]
    fn test_prepare_tables_drops_orphans() {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            PROVIDERS_FILE,
            "Provider_ID,Name,Type,Address,City,Contact\n1,Green Bites,Restaurant,,Bengaluru,\n",
        );
        write(
            dir.path(),
            RECEIVERS_FILE,
            "Receiver_ID,Name,Type,City,Contact\n1,Helping Hands,NGO,Bengaluru,\n",
        );
        write(
            dir.path(),
            LISTINGS_FILE,
            "Food_ID,Food_Name,Quantity,Expiry_Date,Provider_ID,Provider_Type,Location,Food_Type,Meal_Type\n\
             101,Rice,5,2025-03-11,1,Restaurant,Bengaluru,Vegan,Lunch\n\
             102,Dal,5,2025-03-11,999,Restaurant,Bengaluru,Vegan,Lunch\n",
        );
        write(
            dir.path(),
            CLAIMS_FILE,
            "Claim_ID,Food_ID,Receiver_ID,Status,Timestamp\n1,101,1,Pending,\n2,102,1,Pending,\n",
        );
        let paths = SourcePaths::in_dir(dir.path());

        let prepared = prepare_tables(&paths, &options()).unwrap();

        assert!(prepared.metadata.synthesized_sources.is_empty());
        assert_eq!(prepared.metadata.raw_counts.food_listings, 2);
        assert_eq!(prepared.metadata.clean_counts.food_listings, 1);
        assert_eq!(prepared.metadata.clean_counts.claims, 1);
        assert_eq!(prepared.report.rows_dropped(), 2);
    }

    #[test]
    fn test_prepare_tables_missing_source_without_fixture() {
        let dir = TempDir::new().unwrap();
        let paths = SourcePaths::in_dir(dir.path());

        let result = prepare_tables(&paths, &LoadOptions::new(false));
        assert!(matches!(result, Err(FoodError::SourceMissing(_))));
    }
}
