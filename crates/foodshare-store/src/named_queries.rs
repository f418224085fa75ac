//! Library of predefined analytical queries.
//!
//! The library is a `.sql` file of `;`-separated statements. A comment line
//! of the form `-- name: <slug>` directly above a statement names it;
//! unnamed statements are called `query_<n>`. Only read statements (`SELECT`
//! or `WITH`) are kept.
//!
//! Statements may reference three named parameters, `:city`, `:days` and
//! `:today` (an ISO date), which are bound through SQLite's own parameter
//! binding. Each query runs on its
//! own: one failing query does not stop the others.

use std::path::Path;
use std::sync::OnceLock;

use chrono::{NaiveDate, Utc};
use regex::Regex;
use rusqlite::{Connection, OptionalExtension};
use serde::Serialize;
use tracing::{debug, warn};

use crate::access::FoodStore;
use crate::error::{Result, StatementContext, StoreError};
use crate::script::split_script;
use crate::table::QueryTable;

const BUNDLED_QUERIES: &str = include_str!("../assets/queries.sql");

/// City bound to `:city` when the store has no provider with a city.
pub const FALLBACK_CITY: &str = "Bengaluru";

/// Day count bound to `:days` when none is given.
pub const DEFAULT_DAYS: u32 = 7;

// ── Types ─────────────────────────────────────────────────────────────────────

/// One statement of the library.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NamedQuery {
    pub name: String,
    pub sql: String,
}

/// Caller-supplied parameter values; `None` selects the default.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InsightParams {
    pub city: Option<String>,
    pub days: Option<u32>,
    /// Reference date for `:today`; the current UTC date when `None`.
    pub today: Option<NaiveDate>,
}

/// Values actually bound for a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BoundParams {
    pub city: String,
    pub days: u32,
    pub today: NaiveDate,
}

/// Outcome of one query.
#[derive(Debug)]
pub struct NamedQueryResult {
    pub name: String,
    pub sql: String,
    pub outcome: std::result::Result<QueryTable, StoreError>,
}

/// Outcome of [`QueryLibrary::run_all`].
#[derive(Debug)]
pub struct InsightRun {
    pub params: BoundParams,
    pub results: Vec<NamedQueryResult>,
}

impl InsightRun {
    pub fn failures(&self) -> usize {
        self.results.iter().filter(|r| r.outcome.is_err()).count()
    }
}

// ── QueryLibrary ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryLibrary {
    queries: Vec<NamedQuery>,
}

impl QueryLibrary {
    /// The library shipped with the crate.
    pub fn bundled() -> Self {
        Self::parse(BUNDLED_QUERIES)
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| StoreError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::parse(&text))
    }

    /// `QueryLibrary::from_path` when `path` is given, the bundled one otherwise.
    pub fn resolve(path: Option<&Path>) -> Result<Self> {
        path.map_or_else(|| Ok(Self::bundled()), Self::from_path)
    }

    pub fn parse(text: &str) -> Self {
        let mut queries = Vec::new();
        for stmt in split_script(text) {
            if !is_read_statement(&stmt.sql) {
                debug!("Skipping non-query statement: {}", first_line(&stmt.sql));
                continue;
            }
            let name = stmt
                .comments
                .iter()
                .rev()
                .find_map(|c| header_name(c))
                .unwrap_or_else(|| format!("query_{}", queries.len() + 1));
            queries.push(NamedQuery {
                name,
                sql: stmt.sql,
            });
        }
        Self { queries }
    }

    pub fn queries(&self) -> &[NamedQuery] {
        &self.queries
    }

    pub fn len(&self) -> usize {
        self.queries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queries.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&NamedQuery> {
        self.queries.iter().find(|q| q.name == name)
    }

    /// Run every query against `store`.
    ///
    /// Only a missing store (or a failure resolving the default city) fails
    /// the whole run; per-query errors are reported in the results.
    pub fn run_all(&self, store: &FoodStore, params: &InsightParams) -> Result<InsightRun> {
        let conn = store.connect()?;
        let bound = BoundParams {
            city: match &params.city {
                Some(city) => city.clone(),
                None => default_city(&conn)?,
            },
            days: params.days.unwrap_or(DEFAULT_DAYS),
            today: params.today.unwrap_or_else(|| Utc::now().date_naive()),
        };
        debug!(city = %bound.city, days = bound.days, today = %bound.today, "running query library");

        let results = self
            .queries
            .iter()
            .map(|q| {
                let outcome = run_one(&conn, &q.sql, &bound);
                if let Err(e) = &outcome {
                    warn!("Query {} failed: {}", q.name, e);
                }
                NamedQueryResult {
                    name: q.name.clone(),
                    sql: q.sql.clone(),
                    outcome,
                }
            })
            .collect();

        Ok(InsightRun {
            params: bound,
            results,
        })
    }
}

// ── Private helpers ───────────────────────────────────────────────────────────

fn header_name(comment: &str) -> Option<String> {
    static NAME_RE: OnceLock<Regex> = OnceLock::new();
    let re = NAME_RE.get_or_init(|| Regex::new(r"^name:\s*(\S+)").expect("regex is valid"));
    re.captures(comment).map(|c| c[1].to_string())
}

fn is_read_statement(sql: &str) -> bool {
    let keyword: String = sql
        .chars()
        .take_while(|c| c.is_ascii_alphabetic())
        .collect::<String>()
        .to_ascii_lowercase();
    keyword == "select" || keyword == "with"
}

fn first_line(sql: &str) -> &str {
    sql.lines().next().unwrap_or_default()
}

/// City of the first provider in the store, or [`FALLBACK_CITY`].
fn default_city(conn: &Connection) -> Result<String> {
    const SQL: &str = "SELECT City FROM providers WHERE TRIM(City) <> '' \
         ORDER BY Provider_ID LIMIT 1";
    let city: Option<String> = conn
        .query_row(SQL, [], |row| row.get(0))
        .optional()
        .with_sql(SQL)?;
    Ok(city.unwrap_or_else(|| FALLBACK_CITY.to_string()))
}

fn run_one(conn: &Connection, sql: &str, params: &BoundParams) -> Result<QueryTable> {
    let mut stmt = conn.prepare(sql).with_sql(sql)?;

    for index in 1..=stmt.parameter_count() {
        let name = stmt.parameter_name(index).map(str::to_string);
        let bound = match name.as_deref() {
            Some(":city") => stmt.raw_bind_parameter(index, &params.city),
            Some(":days") => stmt.raw_bind_parameter(index, i64::from(params.days)),
            Some(":today") => {
                stmt.raw_bind_parameter(index, params.today.format("%Y-%m-%d").to_string())
            }
            other => {
                return Err(StoreError::UnboundParameter {
                    name: other.map_or_else(|| format!("?{index}"), str::to_string),
                    sql: sql.to_string(),
                })
            }
        };
        bound.with_sql(sql)?;
    }

    let columns = stmt.column_names().into_iter().map(String::from).collect();
    let rows = stmt.raw_query();
    let table = QueryTable::read(columns, rows).with_sql(sql)?;
    Ok(table)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{built_store, reference_date};
    use serde_json::json;
    use tempfile::TempDir;

    fn run(store: &FoodStore, text: &str, params: &InsightParams) -> InsightRun {
        QueryLibrary::parse(text).run_all(store, params).unwrap()
    }

    // ── parse ─────────────────────────────────────────────────────────────────

    #[test]
    fn test_parse_names_and_defaults() {
        let library = QueryLibrary::parse(
            "-- name: provider_count\nSELECT COUNT(*) FROM providers;\n\nSELECT 1;\n",
        );
        let names: Vec<&str> = library.queries().iter().map(|q| q.name.as_str()).collect();
        assert_eq!(names, vec!["provider_count", "query_2"]);
        assert_eq!(library.get("provider_count").unwrap().sql, "SELECT COUNT(*) FROM providers");
    }

    #[test]
    fn test_parse_keeps_only_read_statements() {
        let library = QueryLibrary::parse(
            "CREATE TABLE t (x);\nDELETE FROM claims;\n  with x AS (SELECT 1) SELECT * FROM x;\nselect 2;",
        );
        assert_eq!(library.len(), 2);
        assert!(library.queries()[0].sql.starts_with("with"));
    }

    #[test]
    fn test_bundled_library() {
        let library = QueryLibrary::bundled();
        assert!(library.len() >= 15);
        assert!(library.get("provider_contacts_in_city").is_some());
        assert!(library.get("listings_expiring_within_days").is_some());
        let mut names: Vec<&str> = library.queries().iter().map(|q| q.name.as_str()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), library.len());
    }

    #[test]
    fn test_from_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("queries.sql");
        std::fs::write(&path, "-- name: one\nSELECT 1;").unwrap();

        let library = QueryLibrary::resolve(Some(&path)).unwrap();
        assert_eq!(library.queries()[0].name, "one");
        assert!(QueryLibrary::from_path(&dir.path().join("missing.sql")).is_err());
    }

    // ── run_all ───────────────────────────────────────────────────────────────

    #[test]
    fn test_bundled_library_runs_cleanly() {
        let (_dir, store) = built_store();
        let run = QueryLibrary::bundled()
            .run_all(&store, &InsightParams::default())
            .unwrap();

        for result in &run.results {
            assert!(result.outcome.is_ok(), "{} failed: {:?}", result.name, result.outcome);
        }
        assert_eq!(run.failures(), 0);
    }

    #[test]
    fn test_default_city_is_first_provider_city() {
        let (_dir, store) = built_store();
        let params = InsightParams {
            today: Some(reference_date()),
            ..InsightParams::default()
        };
        let run = run(
            &store,
            "-- name: contacts\nSELECT Name FROM providers WHERE City = :city;",
            &params,
        );

        assert_eq!(
            run.params,
            BoundParams {
                city: "Bengaluru".to_string(),
                days: DEFAULT_DAYS,
                today: reference_date(),
            }
        );
        let table = run.results[0].outcome.as_ref().unwrap();
        assert_eq!(table.rows, vec![vec![json!("Green Bites")]]);
    }

    #[test]
    fn test_default_city_fallback_on_empty_store() {
        let (_dir, store) = built_store();
        store.execute("DELETE FROM providers", &[]).unwrap();

        let run = run(&store, "SELECT :city AS City;", &InsightParams::default());
        assert_eq!(run.params.city, FALLBACK_CITY);
    }

    #[test]
    fn test_explicit_params_bound_natively() {
        let (_dir, store) = built_store();
        let params = InsightParams {
            city: Some("O'Hare; DROP TABLE providers".to_string()),
            days: Some(30),
            today: None,
        };
        let run = run(&store, "SELECT :city AS City, :days AS Days, :days + 1 AS Next;", &params);

        let table = run.results[0].outcome.as_ref().unwrap();
        assert_eq!(
            table.rows[0],
            vec![json!("O'Hare; DROP TABLE providers"), json!(30), json!(31)]
        );
        assert_eq!(store.kpis().unwrap().providers, 2);
    }

    #[test]
    fn test_today_bound_from_caller_date() {
        let (_dir, store) = built_store();
        let library = QueryLibrary::bundled();
        let expiring = library.get("listings_expiring_within_days").unwrap();
        assert!(expiring.sql.contains(":today"));

        let text = format!("-- name: expiring\n{};", expiring.sql);
        let ids = |today: NaiveDate, days: u32| -> Vec<serde_json::Value> {
            let params = InsightParams {
                city: None,
                days: Some(days),
                today: Some(today),
            };
            let run = run(&store, &text, &params);
            let table = run.results[0].outcome.as_ref().unwrap();
            table.rows.iter().map(|row| row[0].clone()).collect()
        };

        // Fixture listings expire one and two days after the reference date.
        assert_eq!(ids(reference_date(), 1), vec![json!(101)]);
        assert_eq!(ids(reference_date(), 2), vec![json!(101), json!(102)]);
        let later = reference_date().checked_add_days(chrono::Days::new(2)).unwrap();
        assert_eq!(ids(later, 7), vec![json!(102)]);
    }

    #[test]
    fn test_failing_query_does_not_stop_others() {
        let (_dir, store) = built_store();
        let run = run(
            &store,
            "-- name: broken\nSELECT * FROM nowhere;\n-- name: fine\nSELECT COUNT(*) AS n FROM claims;",
            &InsightParams::default(),
        );

        assert_eq!(run.failures(), 1);
        match &run.results[0].outcome {
            Err(StoreError::Statement { sql, .. }) => assert_eq!(sql, "SELECT * FROM nowhere"),
            other => panic!("unexpected outcome: {other:?}"),
        }
        let table = run.results[1].outcome.as_ref().unwrap();
        assert_eq!(table.rows[0][0], json!(3));
    }

    #[test]
    fn test_unknown_parameter_reported() {
        let (_dir, store) = built_store();
        let run = run(&store, "SELECT :region;", &InsightParams::default());
        match &run.results[0].outcome {
            Err(StoreError::UnboundParameter { name, .. }) => assert_eq!(name, ":region"),
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn test_run_all_requires_built_store() {
        let dir = TempDir::new().unwrap();
        let store = FoodStore::new(dir.path().join("foodwaste.db"));
        let err = QueryLibrary::bundled()
            .run_all(&store, &InsightParams::default())
            .unwrap_err();
        assert!(err.is_not_built());
    }
}
