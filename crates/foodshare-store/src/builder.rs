//! Writes normalized tables into a fresh store file.
//!
//! The store is assembled in a staging file beside the target inside a single
//! transaction with foreign keys enforced. The staging file replaces the live
//! store only after the transaction commits, so a failed build leaves the
//! previous store untouched.

use std::path::{Path, PathBuf};

use foodshare_core::models::{TableCounts, ALL_TABLES};
use foodshare_data::normalizer::CleanTables;
use rusqlite::Connection;
use tracing::{debug, info, warn};

use crate::error::{Result, StatementContext, StoreError};
use crate::schema::Schema;
use crate::writes::{insert_claim_row, insert_listing_row, insert_provider_row, insert_receiver_row};

/// Build a store at `target` from `tables`, replacing any existing file.
///
/// Returns the number of rows persisted per table, counted from the new store.
pub fn build_store(target: &Path, schema: &Schema, tables: &CleanTables) -> Result<TableCounts> {
    if let Some(parent) = target.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|source| StoreError::Replace {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    let staging = staging_path(target);
    remove_if_exists(&staging)?;

    match populate(&staging, schema, tables) {
        Ok(counts) => {
            std::fs::rename(&staging, target).map_err(|source| StoreError::Replace {
                path: target.to_path_buf(),
                source,
            })?;
            info!("Store written to {}", target.display());
            Ok(counts)
        }
        Err(e) => {
            if let Err(cleanup) = remove_if_exists(&staging) {
                warn!("Could not remove staging store: {}", cleanup);
            }
            Err(e)
        }
    }
}

/// Staging file used while building `target` (`<name>.staging`).
pub fn staging_path(target: &Path) -> PathBuf {
    let mut name = target
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".staging");
    target.with_file_name(name)
}

// ── Private helpers ───────────────────────────────────────────────────────────

fn populate(staging: &Path, schema: &Schema, tables: &CleanTables) -> Result<TableCounts> {
    let mut conn = Connection::open(staging).map_err(|source| StoreError::Open {
        path: staging.to_path_buf(),
        source,
    })?;
    const PRAGMA: &str = "PRAGMA foreign_keys = ON";
    conn.execute_batch(PRAGMA).with_sql(PRAGMA)?;

    let tx = conn.transaction().with_sql("BEGIN")?;
    schema.apply(&tx)?;

    for provider in &tables.providers {
        insert_provider_row(&tx, provider)?;
    }
    for receiver in &tables.receivers {
        insert_receiver_row(&tx, receiver)?;
    }
    for listing in &tables.listings {
        insert_listing_row(&tx, listing)?;
    }
    for claim in &tables.claims {
        insert_claim_row(&tx, claim)?;
    }

    let counts = count_rows(&tx)?;
    tx.commit().with_sql("COMMIT")?;

    conn.close().map_err(|(_, source)| StoreError::Open {
        path: staging.to_path_buf(),
        source,
    })?;
    debug!("Staging store populated: {} rows", counts.total());
    Ok(counts)
}

/// Row counts for the four entity tables of an open store.
pub(crate) fn count_rows(conn: &Connection) -> Result<TableCounts> {
    let mut counts = [0usize; 4];
    for (slot, table) in counts.iter_mut().zip(ALL_TABLES) {
        let sql = format!("SELECT COUNT(*) FROM {table}");
        let n: i64 = conn.query_row(&sql, [], |row| row.get(0)).with_sql(&sql)?;
        *slot = usize::try_from(n).unwrap_or_default();
    }
    let [providers, receivers, food_listings, claims] = counts;
    Ok(TableCounts {
        providers,
        receivers,
        food_listings,
        claims,
    })
}

fn remove_if_exists(path: &Path) -> Result<()> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(source) => Err(StoreError::Replace {
            path: path.to_path_buf(),
            source,
        }),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
