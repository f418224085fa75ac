use std::path::PathBuf;

use foodshare_core::error::FoodError;
use thiserror::Error;

/// Errors raised by the relational store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store file does not exist yet; run a rebuild first.
    #[error("Store not yet built: {0}")]
    NotBuilt(PathBuf),

    #[error("Failed to open store {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// A statement failed; `sql` is the statement text as submitted.
    #[error("{source}\nin statement:\n{sql}")]
    Statement {
        sql: String,
        #[source]
        source: rusqlite::Error,
    },

    #[error("No value for parameter {name} in statement:\n{sql}")]
    UnboundParameter { name: String, sql: String },

    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to replace store {path}: {source}")]
    Replace {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Load(#[from] FoodError),
}

impl StoreError {
    /// `true` when the error only means the store has not been built yet.
    pub fn is_not_built(&self) -> bool {
        matches!(self, StoreError::NotBuilt(_))
    }
}

/// Result type alias for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Attach the originating SQL text to a rusqlite failure.
pub(crate) trait StatementContext<T> {
    fn with_sql(self, sql: &str) -> Result<T>;
}

impl<T> StatementContext<T> for rusqlite::Result<T> {
    fn with_sql(self, sql: &str) -> Result<T> {
        self.map_err(|source| StoreError::Statement {
            sql: sql.trim().to_string(),
            source,
        })
    }
}
