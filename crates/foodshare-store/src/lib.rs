//! Relational store for foodshare.
//!
//! Builds the SQLite store from the normalized tables and serves the query
//! layer over it: filtered and expiring listings, aggregates, filter options,
//! the named analytical query library and per-entity writes.

pub mod access;
pub mod analytics;
pub mod builder;
pub mod error;
pub mod listings;
pub mod named_queries;
pub mod schema;
mod script;
pub mod table;
pub mod writes;

pub use access::{FoodStore, RebuildReport, StoreStatus};
pub use error::{Result, StoreError};
pub use foodshare_core as core;
pub use foodshare_data as data;
pub use rusqlite::types::Value as SqlValue;
pub use table::QueryTable;

#[cfg(test)]
pub(crate) mod test_support {
    use chrono::{NaiveDate, NaiveDateTime};
    use foodshare_core::models::{Claim, FoodListing, Provider, Receiver};
    use foodshare_data::normalizer::CleanTables;
    use foodshare_data::pipeline::prepare_tables;
    use foodshare_data::reader::{LoadOptions, SourcePaths};
    use tempfile::TempDir;

    use crate::access::FoodStore;

    pub fn reference_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 1).unwrap()
    }

    pub fn reference() -> NaiveDateTime {
        reference_date().and_hms_opt(12, 0, 0).unwrap()
    }

    /// Normalized tables of the default fixture.
    pub fn fixture_tables() -> CleanTables {
        let dir = TempDir::new().unwrap();
        let options = LoadOptions::new(true).with_reference(reference());
        prepare_tables(&SourcePaths::in_dir(dir.path()), &options)
            .unwrap()
            .tables
    }

    /// Every row of every table, in browse order.
    pub fn dump(store: &FoodStore) -> (Vec<Provider>, Vec<Receiver>, Vec<FoodListing>, Vec<Claim>) {
        (
            store.all_providers().unwrap(),
            store.all_receivers().unwrap(),
            store.all_listings().unwrap(),
            store.all_claims().unwrap(),
        )
    }

    /// A store built from the default fixture under a fresh temp dir
    /// (sources in `<dir>/data`).
    pub fn built_store() -> (TempDir, FoodStore) {
        let dir = TempDir::new().unwrap();
        let store = FoodStore::new(dir.path().join("foodwaste.db"));
        let options = LoadOptions::new(true).with_reference(reference());
        store
            .rebuild(&SourcePaths::in_dir(&dir.path().join("data")), &options)
            .unwrap();
        (dir, store)
    }
}
