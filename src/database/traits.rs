//! Trait definitions for the database module
//!
//! This module defines the interface the handle manager talks to. The only
//! production implementation is the MaxMind GeoIP2 reader.

use crate::error::Result;
use std::net::IpAddr;

use super::types::GeoData;

/// A loaded geolocation database that can answer lookups concurrently
pub trait Database: Send + Sync {
    fn name(&self) -> &str;

    /// Look up the normalized record for an IP address
    ///
    /// Returns an error when the reader cannot answer (address not in the
    /// database, corrupt entry, unsupported address family).
    fn lookup_ip(&self, ip: IpAddr) -> Result<GeoData>;
}
