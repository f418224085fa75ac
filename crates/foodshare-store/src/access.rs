//! Data-access interface over the SQLite store.
//!
//! [`FoodStore`] owns nothing but a path and a schema. Every operation opens
//! its own connection and drops it when the unit of work ends. Opening never
//! creates a missing store, so an absent file is reported as
//! [`StoreStatus::NotBuilt`] / [`StoreError::NotBuilt`] rather than as an
//! empty database.

use std::path::{Path, PathBuf};
use std::time::Instant;

use chrono::Utc;
use foodshare_core::models::TableCounts;
use foodshare_data::normalizer::NormalizeReport;
use foodshare_data::pipeline::prepare_tables;
use foodshare_data::reader::{LoadOptions, SourcePaths};
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection, OpenFlags};
use serde::Serialize;
use tracing::{debug, info};

use crate::builder::{build_store, count_rows};
use crate::error::{Result, StatementContext, StoreError};
use crate::schema::Schema;
use crate::table::QueryTable;

// ── Public types ──────────────────────────────────────────────────────────────

/// Whether the store exists, and its row counts when it does.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum StoreStatus {
    NotBuilt { path: PathBuf },
    Ready { path: PathBuf, counts: TableCounts },
}

impl StoreStatus {
    pub fn is_ready(&self) -> bool {
        matches!(self, StoreStatus::Ready { .. })
    }
}

/// Outcome of [`FoodStore::rebuild`].
#[derive(Debug, Clone, Serialize)]
pub struct RebuildReport {
    pub store_path: PathBuf,
    /// Rows persisted per table, counted from the new store.
    pub counts: TableCounts,
    /// Rows as read from the sources, before normalization.
    pub source_counts: TableCounts,
    pub normalize: NormalizeReport,
    /// Sources written from the fixture during this rebuild.
    pub synthesized_sources: Vec<PathBuf>,
    pub generated_at: String,
    pub load_time_seconds: f64,
    pub normalize_time_seconds: f64,
    pub build_time_seconds: f64,
}

// ── FoodStore ─────────────────────────────────────────────────────────────────

/// Handle on a store file.
#[derive(Debug, Clone)]
pub struct FoodStore {
    db_path: PathBuf,
    schema: Schema,
}

impl FoodStore {
    /// A handle on `db_path` using the bundled schema.
    pub fn new(db_path: impl Into<PathBuf>) -> Self {
        Self {
            db_path: db_path.into(),
            schema: Schema::bundled(),
        }
    }

    /// Use `schema` for future rebuilds.
    pub fn with_schema(mut self, schema: Schema) -> Self {
        self.schema = schema;
        self
    }

    pub fn path(&self) -> &Path {
        &self.db_path
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    // ── Lifecycle ─────────────────────────────────────────────────────────

    /// Report whether the store has been built.
    pub fn status(&self) -> Result<StoreStatus> {
        match self.connect() {
            Ok(conn) => Ok(StoreStatus::Ready {
                path: self.db_path.clone(),
                counts: count_rows(&conn)?,
            }),
            Err(StoreError::NotBuilt(path)) => Ok(StoreStatus::NotBuilt { path }),
            Err(e) => Err(e),
        }
    }

    /// Load, normalize and persist the sources, replacing the store.
    ///
    /// Rebuilding from the same sources yields the same row counts every time.
    pub fn rebuild(&self, sources: &SourcePaths, options: &LoadOptions) -> Result<RebuildReport> {
        match self.schema.origin() {
            Some(origin) => info!(
                "Rebuilding store at {} with schema {}",
                self.db_path.display(),
                origin.display()
            ),
            None => info!("Rebuilding store at {}", self.db_path.display()),
        }
        let prepared = prepare_tables(sources, options)?;

        let build_start = Instant::now();
        let counts = build_store(&self.db_path, &self.schema, &prepared.tables)?;
        let build_time = build_start.elapsed().as_secs_f64();

        for (table, n) in counts.as_pairs() {
            info!("  {:<14} {:>6} rows", table, n);
        }

        Ok(RebuildReport {
            store_path: self.db_path.clone(),
            counts,
            source_counts: prepared.metadata.raw_counts,
            normalize: prepared.report,
            synthesized_sources: prepared.metadata.synthesized_sources,
            generated_at: Utc::now().to_rfc3339(),
            load_time_seconds: prepared.metadata.load_time_seconds,
            normalize_time_seconds: prepared.metadata.normalize_time_seconds,
            build_time_seconds: build_time,
        })
    }

    // ── Ad-hoc statements ─────────────────────────────────────────────────

    /// Run a read statement with positional parameters.
    pub fn query(&self, sql: &str, params: &[Value]) -> Result<QueryTable> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare(sql).with_sql(sql)?;
        let columns = stmt.column_names().into_iter().map(String::from).collect();
        let rows = stmt.query(params_from_iter(params.iter())).with_sql(sql)?;
        let table = QueryTable::read(columns, rows).with_sql(sql)?;
        debug!(rows = table.len(), "query: {}", sql.trim());
        Ok(table)
    }

    /// Run a write statement with positional parameters; returns rows affected.
    pub fn execute(&self, sql: &str, params: &[Value]) -> Result<usize> {
        let conn = self.connect()?;
        let affected = conn
            .execute(sql, params_from_iter(params.iter()))
            .with_sql(sql)?;
        debug!(affected, "execute: {}", sql.trim());
        Ok(affected)
    }

    // ── Connections ───────────────────────────────────────────────────────

    /// Open the existing store with foreign keys enforced.
    pub(crate) fn connect(&self) -> Result<Connection> {
        if !self.db_path.is_file() {
            return Err(StoreError::NotBuilt(self.db_path.clone()));
        }
        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        let conn = Connection::open_with_flags(&self.db_path, flags).map_err(|source| {
            match source.sqlite_error_code() {
                Some(rusqlite::ErrorCode::CannotOpen) => StoreError::NotBuilt(self.db_path.clone()),
                _ => StoreError::Open {
                    path: self.db_path.clone(),
                    source,
                },
            }
        })?;
        const PRAGMA: &str = "PRAGMA foreign_keys = ON";
        conn.execute_batch(PRAGMA).with_sql(PRAGMA)?;
        Ok(conn)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
