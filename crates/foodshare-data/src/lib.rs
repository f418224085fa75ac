//! Data ingestion layer for foodshare.
//!
//! Reads the four CSV sources (synthesizing a small fixture for absent ones
//! when allowed), normalizes them into constraint-satisfying tables and runs
//! the combined load pipeline used by the store rebuild.

pub mod fixtures;
pub mod normalizer;
pub mod pipeline;
pub mod reader;

pub use foodshare_core as core;
