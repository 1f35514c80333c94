//! Path utilities for configuration and database files

use crate::error::{GeoIpError, Result};
use std::path::{Path, PathBuf};

/// Get the geoip-rs configuration directory (XDG_CONFIG_HOME/geoip-rs or platform equivalent)
pub fn config_dir() -> Result<PathBuf> {
    dirs::config_dir()
        .map(|dir| dir.join("geoip-rs"))
        .ok_or_else(|| GeoIpError::config("unable to determine configuration directory"))
}

/// Config file picked up when none is given on the command line
pub fn default_config_file() -> Result<PathBuf> {
    Ok(config_dir()?.join("config.json"))
}

/// Expand tilde (~) in path
pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}

/// Absolute, symlink-free form of an existing path
pub fn real_path(path: &Path) -> Result<PathBuf> {
    let expanded = expand_tilde(&path.to_string_lossy());
    expanded.canonicalize().map_err(|e| {
        if expanded.exists() {
            GeoIpError::config(format!("{}: {}", expanded.display(), e))
        } else {
            GeoIpError::config(format!("{} path does not exist", expanded.display()))
        }
    })
}
