//! Error types for geoip-rs
//!
//! This module defines custom error types using thiserror for better error handling.
//! Startup-scoped variants (`Config`, `Startup`, `DatabaseConflict`) end the process,
//! request-scoped variants (`InvalidIp`, `NotFound`, `Lookup`, `Serialization`) are
//! turned into HTTP responses by the server.

use thiserror::Error;

/// Main error type for geoip-rs
#[derive(Error, Debug)]
pub enum GeoIpError {
    /// Malformed or unreadable configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Database could not be opened or the listener could not be bound
    #[error("Startup failure: {0}")]
    Startup(String),

    /// Request IP text is not an IP address
    #[error("unable to decode ip `{0}`")]
    InvalidIp(String),

    /// The database holds no usable data for the address
    #[error("{0}")]
    NotFound(String),

    /// The database reader failed to answer a query
    #[error("{0}")]
    Lookup(String),

    /// A database is already open from a different file
    #[error("database already opened from {open}; refusing to open {requested}")]
    DatabaseConflict { open: String, requested: String },

    /// JSON encoding/decoding error
    #[error("JSON error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parsing error
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// File I/O error
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for geoip-rs
pub type Result<T> = std::result::Result<T, GeoIpError>;

impl GeoIpError {
    /// Create a config error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        GeoIpError::Config(msg.into())
    }

    /// Create a startup error
    pub fn startup<S: Into<String>>(msg: S) -> Self {
        GeoIpError::Startup(msg.into())
    }

    /// Create a lookup error
    pub fn lookup<S: Into<String>>(msg: S) -> Self {
        GeoIpError::Lookup(msg.into())
    }

    /// Create a not-found error
    pub fn not_found<S: Into<String>>(msg: S) -> Self {
        GeoIpError::NotFound(msg.into())
    }
}

/// Convert from maxminddb errors raised while querying
impl From<maxminddb::MaxMindDBError> for GeoIpError {
    fn from(err: maxminddb::MaxMindDBError) -> Self {
        match err {
            maxminddb::MaxMindDBError::AddressNotFoundError(msg) => GeoIpError::NotFound(msg),
            other => GeoIpError::Lookup(other.to_string()),
        }
    }
}
