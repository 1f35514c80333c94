//! Response cache
//!
//! Maps the raw request key (the IP text exactly as received) to the already
//! serialized response body. Every entry lives for the same TTL; moka stops
//! returning an entry once it expires and evicts it on its own.

use axum::body::Bytes;
use moka::sync::Cache;
use std::time::Duration;

/// Longest TTL the cache accepts; moka refuses anything above 1000 years
pub const MAX_TTL: Duration = Duration::from_secs(1000 * 365 * 24 * 60 * 60);

/// TTL cache of serialized responses, safe to share between request tasks
pub struct ResponseCache {
    ttl: Duration,
    inner: Cache<String, Bytes>,
}

impl ResponseCache {
    /// Cache keeping entries for `ttl`, capped at `MAX_TTL`
    pub fn new(ttl: Duration) -> Self {
        let ttl = ttl.min(MAX_TTL);
        let inner = Cache::builder().time_to_live(ttl).build();

        log::debug!("ResponseCache initialized: ttl={:.2}s", ttl.as_secs_f64());

        Self { ttl, inner }
    }

    /// Cache for a TTL given in seconds; `None` when caching is disabled (`<= 0`)
    pub fn from_ttl_secs(secs: f64) -> Option<Self> {
        if secs.is_nan() || secs <= 0.0 {
            return None;
        }
        let ttl = Duration::try_from_secs_f64(secs).unwrap_or(MAX_TTL);
        Some(Self::new(ttl))
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Stored payload for `key`, unless missing or expired
    pub fn get(&self, key: &str) -> Option<Bytes> {
        self.inner.get(key)
    }

    /// Store `payload` under `key` for the cache TTL, replacing any previous entry
    pub fn set(&self, key: impl Into<String>, payload: Bytes) {
        self.inner.insert(key.into(), payload);
    }

    /// Number of live entries
    pub fn len(&self) -> usize {
        self.inner.run_pending_tasks();
        self.inner.entry_count() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
