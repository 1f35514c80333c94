//! Database module for geoip-rs
//!
//! This module wraps the MaxMind GeoIP2 reader behind a small trait and a manager
//! that owns the single open handle of the process.
//!
//! # Module Organization
//!
//! - `types`: the normalized record (`GeoData`) and its parts
//! - `traits`: the `Database` trait
//! - `geoip2`: MaxMind reader and record normalization
//! - `manager`: open-once handle manager answering text lookups

// Core modules
pub mod types;
pub mod traits;
pub mod manager;

// Database implementation modules
pub mod geoip2;

// Re-export core types and traits for convenience
pub use types::GeoData;
pub use traits::Database;
pub use manager::{DatabaseHandle, DatabaseManager};

// Re-export database implementations
pub use geoip2::GeoIP2Database;
