//! Configuration module for geoip-rs
//!
//! Server settings are resolved once at startup: built-in defaults, then an
//! optional config file (JSON, or YAML by extension), then command line
//! overrides. The result is immutable while the server runs.

use crate::cache;
use crate::error::{GeoIpError, Result};
use crate::utils::path;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Database used when nothing else is configured
pub const DEFAULT_DATABASE_FILE: &str = "/var/lib/maxminddb/GeoLite2-City.mmdb";

/// Server configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    /// Address to bind; empty binds all interfaces
    #[serde(rename = "server.ip")]
    pub ip: String,

    #[serde(rename = "server.port")]
    pub port: u16,

    /// MaxMind City database file
    #[serde(rename = "database.file")]
    pub database_file: PathBuf,

    /// Runtime worker threads, at least 1
    #[serde(rename = "worker.threads")]
    pub worker_threads: usize,

    /// Seconds a response stays cached; 0 or less disables the cache
    #[serde(rename = "cache.ttl")]
    pub cache_ttl: f64,

    /// File the configuration was read from
    #[serde(skip)]
    pub config_file: Option<PathBuf>,
}

/// Values given on the command line; `None` keeps the configured value
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub ip: Option<String>,
    pub port: Option<u16>,
    pub database_file: Option<PathBuf>,
    pub worker_threads: Option<usize>,
    pub cache_ttl: Option<f64>,
}

fn default_worker_threads() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
        .min(u8::MAX as usize)
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            ip: "127.0.0.1".to_string(),
            port: 8000,
            database_file: PathBuf::from(DEFAULT_DATABASE_FILE),
            worker_threads: default_worker_threads(),
            cache_ttl: 3600.0,
            config_file: None,
        }
    }
}

impl ServerConfig {
    /// Load configuration from `config_file`, or from the default location if it exists
    ///
    /// An explicitly given file must exist; the default one is optional.
    pub fn load(config_file: Option<&Path>) -> Result<Self> {
        match config_file {
            Some(file) => Self::from_file(&path::real_path(file)?),
            None => match path::default_config_file() {
                Ok(file) if file.is_file() => {
                    log::debug!("Using default config file {}", file.display());
                    Self::from_file(&file)
                }
                _ => Ok(Self::default()),
            },
        }
    }

    /// Read a config file; `.yaml`/`.yml` files are parsed as YAML, anything else as JSON
    pub fn from_file(file: &Path) -> Result<Self> {
        let content = fs::read_to_string(file).map_err(|e| {
            GeoIpError::config(format!("Failed to read config file {}: {}", file.display(), e))
        })?;

        let is_yaml = matches!(
            file.extension().and_then(|ext| ext.to_str()),
            Some("yaml") | Some("yml")
        );

        let mut config = if is_yaml {
            Self::from_yaml(&content)
        } else {
            Self::from_json(&content)
        }
        .map_err(|e| {
            GeoIpError::config(format!("Failed to parse config file {}: {}", file.display(), e))
        })?;

        config.config_file = Some(file.to_path_buf());
        Ok(config)
    }

    pub fn from_json(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Apply command line overrides
    pub fn apply_overrides(&mut self, overrides: &Overrides) {
        if let Some(ref ip) = overrides.ip {
            self.ip = ip.clone();
        }
        if let Some(port) = overrides.port {
            self.port = port;
        }
        if let Some(ref file) = overrides.database_file {
            self.database_file = file.clone();
        }
        if let Some(threads) = overrides.worker_threads {
            self.worker_threads = threads;
        }
        if let Some(ttl) = overrides.cache_ttl {
            self.cache_ttl = ttl;
        }
    }

    /// Check the final settings and normalize the database path
    pub fn validate(&mut self) -> Result<()> {
        if self.worker_threads < 1 {
            return Err(GeoIpError::config("worker threads must be at least 1"));
        }
        if self.database_file.as_os_str().is_empty() {
            return Err(GeoIpError::config("missing required path to MaxMind database file"));
        }
        if !self.cache_ttl.is_finite() {
            return Err(GeoIpError::config("cache ttl must be a finite number of seconds"));
        }
        if self.cache_enabled() {
            match Duration::try_from_secs_f64(self.cache_ttl) {
                Ok(ttl) if ttl <= cache::MAX_TTL => {}
                _ => {
                    return Err(GeoIpError::config(format!(
                        "cache ttl {} is out of range; at most {} seconds",
                        self.cache_ttl,
                        cache::MAX_TTL.as_secs()
                    )));
                }
            }
        }
        self.database_file = path::real_path(&self.database_file)?;
        Ok(())
    }

    pub fn cache_enabled(&self) -> bool {
        self.cache_ttl > 0.0
    }

    /// `ip:port` to listen on
    pub fn bind_address(&self) -> String {
        let ip = if self.ip.is_empty() { "0.0.0.0" } else { self.ip.as_str() };
        if ip.contains(':') {
            format!("[{}]:{}", ip, self.port)
        } else {
            format!("{}:{}", ip, self.port)
        }
    }
}
