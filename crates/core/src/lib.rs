//! Assetbook Core - asset depreciation schedules and book values.
//!
//! This crate contains the depreciation engine used by reporting, seeding and
//! export code. It is storage-agnostic and performs no I/O; collaborators
//! supply asset parameters and persist or render the results.

pub mod constants;
pub mod depreciation;
pub mod errors;
pub mod utils;

// Re-export common types from the depreciation module
pub use depreciation::*;

// Re-export error types
pub use errors::Error;
pub use errors::Result;
