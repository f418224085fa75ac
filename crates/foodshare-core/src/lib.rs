//! Shared building blocks for the foodshare crates.
//!
//! Entity models and their categorical value sets, permissive value parsers
//! used during CSV ingestion, error types, CLI settings and small time and
//! text-formatting helpers.

pub mod data_processors;
pub mod error;
pub mod formatting;
pub mod models;
pub mod settings;
pub mod time_utils;

pub use error::{FoodError, Result};
