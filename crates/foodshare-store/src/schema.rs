//! Store schema: the bundled `schema.sql` or an override file.

use std::path::{Path, PathBuf};

use rusqlite::Connection;
use tracing::debug;

use crate::error::{Result, StatementContext, StoreError};
use crate::script::split_script;

const BUNDLED_SCHEMA: &str = include_str!("../assets/schema.sql");

/// DDL applied to a fresh store during rebuild.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    sql: String,
    origin: Option<PathBuf>,
}

impl Schema {
    /// The schema shipped with the crate.
    pub fn bundled() -> Self {
        Self {
            sql: BUNDLED_SCHEMA.to_string(),
            origin: None,
        }
    }

    /// Read a schema file from disk.
    pub fn from_path(path: &Path) -> Result<Self> {
        let sql = std::fs::read_to_string(path).map_err(|source| StoreError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self {
            sql,
            origin: Some(path.to_path_buf()),
        })
    }

    /// `Schema::from_path` when `path` is given, the bundled schema otherwise.
    pub fn resolve(path: Option<&Path>) -> Result<Self> {
        path.map_or_else(|| Ok(Self::bundled()), Self::from_path)
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// File the schema was read from, `None` for the bundled one.
    pub fn origin(&self) -> Option<&Path> {
        self.origin.as_deref()
    }

    /// Execute every statement in order. The first failure is returned with
    /// the statement that caused it.
    pub fn apply(&self, conn: &Connection) -> Result<()> {
        for stmt in split_script(&self.sql) {
            debug!("schema: {}", stmt.sql.lines().next().unwrap_or_default());
            conn.execute_batch(&stmt.sql).with_sql(&stmt.sql)?;
        }
        Ok(())
    }
}

impl Default for Schema {
    fn default() -> Self {
        Self::bundled()
    }
}
