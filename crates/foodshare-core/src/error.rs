use std::path::PathBuf;
use thiserror::Error;

/// All errors produced while loading and preparing foodshare source data.
#[derive(Error, Debug)]
pub enum FoodError {
    /// A source file could not be opened or read from disk.
    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A source file could not be written (fixture persistence).
    #[error("Failed to write file {path}: {source}")]
    FileWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A CSV source could not be read or written as a whole.
    #[error("CSV error in {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A required source is absent and fixture synthesis is disabled.
    #[error("Source not found: {0}")]
    SourceMissing(PathBuf),

    /// A categorical value was rejected by a strict parser.
    #[error("Invalid {field} value: {value}")]
    InvalidCategory { field: &'static str, value: String },
}

/// Convenience alias used throughout the foodshare crates.
pub type Result<T> = std::result::Result<T, FoodError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_file_read() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "no such file");
        let err = FoodError::FileRead {
            path: PathBuf::from("/data/providers_data.csv"),
            source: io_err,
        };
        let msg = err.to_string();
        assert!(msg.contains("Failed to read file"));
        assert!(msg.contains("/data/providers_data.csv"));
        assert!(msg.contains("no such file"));
    }

    #[test]
    fn test_error_display_source_missing() {
        let err = FoodError::SourceMissing(PathBuf::from("/data/claims_data.csv"));
        assert_eq!(err.to_string(), "Source not found: /data/claims_data.csv");
    }

    #[test]
    fn test_error_display_invalid_category() {
        let err = FoodError::InvalidCategory {
            field: "Status",
            value: "Lost".to_string(),
        };
        assert_eq!(err.to_string(), "Invalid Status value: Lost");
    }

    #[test]
    fn test_error_display_csv() {
        let err = FoodError::Csv {
            path: PathBuf::from("listings.csv"),
            source: "unequal lengths".into(),
        };
        assert_eq!(err.to_string(), "CSV error in listings.csv: unequal lengths");
    }
}
