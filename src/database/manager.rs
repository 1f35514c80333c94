//! Database manager - owns the single database handle of the process

use crate::database::{Database, GeoData, GeoIP2Database};
use crate::error::{GeoIpError, Result};
use once_cell::sync::OnceCell;
use std::net::IpAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Opens a database file; swapped out in tests
pub type Opener = Box<dyn Fn(&Path) -> Result<Box<dyn Database>> + Send + Sync>;

fn open_geoip2(path: &Path) -> Result<Box<dyn Database>> {
    Ok(Box::new(GeoIP2Database::open(path)?))
}

/// An open database together with the path it was opened from
pub struct DatabaseHandle {
    path: PathBuf,
    database: Box<dyn Database>,
}

impl DatabaseHandle {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn database(&self) -> &dyn Database {
        self.database.as_ref()
    }
}

/// Database manager handles loading the database and answering lookups
///
/// The manager opens its database at most once, on first use, no matter how
/// many callers race for it. Lookups after that run concurrently without a
/// lock; the reader is read-only once open.
///
/// # Thread Safety
///
/// DatabaseManager is thread-safe and can be shared across threads using Arc.
pub struct DatabaseManager {
    path: PathBuf,
    opener: Opener,
    handle: OnceCell<Arc<DatabaseHandle>>,
}

impl DatabaseManager {
    /// Create a manager for the MaxMind database at `path`
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self::with_opener(path, Box::new(open_geoip2))
    }

    /// Create a manager that opens its database through `opener`
    pub fn with_opener<P: Into<PathBuf>>(path: P, opener: Opener) -> Self {
        Self {
            path: path.into(),
            opener,
            handle: OnceCell::new(),
        }
    }

    /// Path the manager opens when used lazily
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_open(&self) -> bool {
        self.handle.get().is_some()
    }

    /// Open the database at `path`, or return the handle that is already open
    ///
    /// Exactly one open succeeds per manager. Asking for a different file once
    /// a handle exists is rejected with `DatabaseConflict`; a failed open leaves
    /// the manager closed so a later call can try again.
    pub fn open(&self, path: &Path) -> Result<Arc<DatabaseHandle>> {
        let handle = self.handle.get_or_try_init(|| {
            let database = (self.opener)(path)?;
            log::info!("Opened database {} from {}", database.name(), path.display());
            Ok::<_, GeoIpError>(Arc::new(DatabaseHandle {
                path: path.to_path_buf(),
                database,
            }))
        })?;

        if handle.path != path {
            return Err(GeoIpError::DatabaseConflict {
                open: handle.path.display().to_string(),
                requested: path.display().to_string(),
            });
        }

        Ok(Arc::clone(handle))
    }

    /// Handle for the configured path, opening it on first use
    pub fn handle(&self) -> Result<Arc<DatabaseHandle>> {
        match self.handle.get() {
            Some(handle) => Ok(Arc::clone(handle)),
            None => self.open(&self.path),
        }
    }

    /// Look up an IP address given as text
    ///
    /// # Returns
    ///
    /// * `Ok(GeoData)` - a record with usable location data
    /// * `Err(GeoIpError::InvalidIp)` - the text is not an IP address
    /// * `Err(GeoIpError::NotFound)` - the database has no usable data for the address
    /// * `Err(GeoIpError::Lookup)` - the reader failed
    pub fn lookup(&self, ip_text: &str) -> Result<GeoData> {
        let ip: IpAddr = ip_text
            .parse()
            .map_err(|_| GeoIpError::InvalidIp(ip_text.to_string()))?;

        let handle = self.handle()?;
        let data = handle.database().lookup_ip(ip)?;

        if data.is_unknown() {
            return Err(GeoIpError::not_found(format!(
                "no geolocation data found for {}",
                ip
            )));
        }

        Ok(data)
    }

    /// Release the database
    ///
    /// Takes the manager by value: no lookup can be in flight while it runs.
    pub fn close(mut self) {
        if let Some(handle) = self.handle.take() {
            log::info!("Closing database {}", handle.path.display());
            if Arc::strong_count(&handle) > 1 {
                log::warn!("Database handle still referenced at close; released when last user drops it");
            }
        }
    }
}
