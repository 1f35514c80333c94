//! geoip-rs: IP geolocation lookups against a local MaxMind database
//!
//! Answers "where is this IP located" from a GeoIP2/GeoLite2 City database,
//! either as a one-shot command or as a caching HTTP service.

pub mod cache;
pub mod cli;
pub mod config;
pub mod database;
pub mod error;
pub mod server;
pub mod utils;

// Re-export common types
pub use cache::ResponseCache;
pub use config::ServerConfig;
pub use database::{Database, DatabaseManager, GeoData, GeoIP2Database};
pub use error::{GeoIpError, Result};
pub use server::{JsonResponse, LookupService};
