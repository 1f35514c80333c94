//! Caching HTTP lookup service
//!
//! Routes:
//!
//! - `GET /ip/:ip` answers with a JSON envelope. A malformed `:ip` is a 422;
//!   every other outcome, failed lookups included, is a 200 whose envelope
//!   `status` tells success from error.
//! - `GET`/`HEAD /ping` is a liveness check reporting uptime in `X-Uptime`.

pub mod response;

use crate::cache::ResponseCache;
use crate::config::ServerConfig;
use crate::database::DatabaseManager;
use crate::error::{GeoIpError, Result};
use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::{HeaderName, Method, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::{Duration, Instant};

pub use response::{INVALID_IP_MESSAGE, JsonResponse, Status};

const X_UPTIME: HeaderName = HeaderName::from_static("x-uptime");

/// State shared by all request handlers
pub struct LookupService {
    database: Arc<DatabaseManager>,
    cache: Option<Arc<ResponseCache>>,
    started: Instant,
    last_modified: String,
}

impl LookupService {
    /// Build the service around an already constructed database manager
    pub fn new(database: Arc<DatabaseManager>, cache: Option<ResponseCache>) -> Self {
        Self {
            database,
            cache: cache.map(Arc::new),
            started: Instant::now(),
            last_modified: http_date(Utc::now()),
        }
    }

    pub fn cache(&self) -> Option<&Arc<ResponseCache>> {
        self.cache.as_ref()
    }

    pub fn uptime(&self) -> Duration {
        self.started.elapsed()
    }

    /// Status code and body for a lookup of `ip_text`
    ///
    /// `None` for the body means the envelope could not be encoded.
    pub fn respond(&self, ip_text: &str) -> (StatusCode, Option<Bytes>) {
        if ip_text.parse::<std::net::IpAddr>().is_err() {
            log::error!("failed to handle request for {}; error was: {}", ip_text, INVALID_IP_MESSAGE);
            return (
                StatusCode::UNPROCESSABLE_ENTITY,
                encode(&JsonResponse::error(INVALID_IP_MESSAGE)),
            );
        }

        if let Some(cache) = &self.cache {
            if let Some(payload) = cache.get(ip_text) {
                log::debug!("cache hit for {}", ip_text);
                return (StatusCode::OK, Some(payload));
            }
        }

        let envelope = match self.database.lookup(ip_text) {
            Ok(data) => JsonResponse::success(data),
            Err(e) => JsonResponse::error(e.to_string()),
        };
        if envelope.status() == Status::Error {
            log::error!(
                "failed to handle request for {}; error was: {}",
                ip_text,
                envelope.message()
            );
        }

        match encode(&envelope) {
            Some(payload) => {
                if let Some(cache) = &self.cache {
                    cache.set(ip_text, payload.clone());
                }
                (StatusCode::OK, Some(payload))
            }
            None => (StatusCode::INTERNAL_SERVER_ERROR, None),
        }
    }
}

fn encode(envelope: &JsonResponse) -> Option<Bytes> {
    match serde_json::to_vec(envelope) {
        Ok(body) => Some(Bytes::from(body)),
        Err(e) => {
            log::error!("{}", GeoIpError::from(e));
            None
        }
    }
}

/// RFC 7231 date, as used by `Last-Modified`
fn http_date(at: DateTime<Utc>) -> String {
    at.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

/// Build the router for a service
pub fn router(service: Arc<LookupService>) -> Router {
    Router::new()
        .route("/ping", get(ping).head(ping))
        .route("/ip/:ip", get(lookup_ip))
        .with_state(service)
}

async fn lookup_ip(
    State(service): State<Arc<LookupService>>,
    Path(ip_text): Path<String>,
) -> Response {
    let (status, body) = service.respond(&ip_text);
    match body {
        Some(body) => (
            status,
            [
                (header::CONTENT_TYPE, "application/json".to_string()),
                (header::LAST_MODIFIED, service.last_modified.clone()),
            ],
            body,
        )
            .into_response(),
        None => status.into_response(),
    }
}

async fn ping(State(service): State<Arc<LookupService>>, method: Method) -> Response {
    let headers = [
        (header::CONTENT_TYPE, "text/plain".to_string()),
        (header::LAST_MODIFIED, service.last_modified.clone()),
        (X_UPTIME, format!("{:.6}s", service.uptime().as_secs_f64())),
    ];

    let body = if method == Method::HEAD { "" } else { "pong" };
    (StatusCode::OK, headers, body).into_response()
}

/// Log the effective configuration the way operators expect to see it at startup
fn log_configuration(config: &ServerConfig) {
    log::info!("Configuration:");
    log::info!("    Bind Address:   [ {} ]", config.bind_address());
    if config.cache_enabled() {
        log::info!("    Cache TTL:      [ {:.2} seconds ]", config.cache_ttl);
    } else {
        log::info!("    Cache TTL:      [ disabled ]");
    }
    log::info!("    Worker Threads: [ {} ]", config.worker_threads);
    if let Some(ref file) = config.config_file {
        log::info!("    Config File:    [ {} ]", file.display());
    }
    log::info!("    Database File:  [ {} ]", config.database_file.display());
}

/// Resolves when the process is asked to stop
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            log::error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                log::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    log::info!("Shutdown requested, draining in-flight requests");
}

/// Run the HTTP service until a shutdown signal arrives
///
/// Opens the database up front so a bad path fails startup rather than the
/// first request. On the way out, in-flight requests are drained and the
/// database is closed.
pub async fn serve(config: &ServerConfig) -> Result<()> {
    log_configuration(config);

    let cache = ResponseCache::from_ttl_secs(config.cache_ttl);
    match cache {
        Some(ref cache) => log::info!(
            "Caching enabled; will cache requests for {:.2} seconds",
            cache.ttl().as_secs_f64()
        ),
        None => log::warn!("Caching disabled by configuration"),
    }

    let database = Arc::new(DatabaseManager::new(config.database_file.clone()));
    database.handle()?;

    let service = Arc::new(LookupService::new(Arc::clone(&database), cache));

    let address = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .map_err(|e| GeoIpError::startup(format!("Failed to bind to {}: {}", address, e)))?;

    log::info!("Listening on {} ...", address);

    let result = axum::serve(listener, router(Arc::clone(&service)))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| GeoIpError::startup(format!("Server error: {}", e)));

    drop(service);

    match Arc::try_unwrap(database) {
        Ok(database) => database.close(),
        Err(_) => log::warn!("Database still in use at shutdown; released on exit"),
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::manager::tests::fake_manager;
    use axum::body::{Body, to_bytes};
    use axum::http::Request;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tower::ServiceExt;

    fn service_with_ttl(ttl: Option<Duration>) -> (Arc<LookupService>, Arc<AtomicUsize>) {
        let (manager, _, lookups) = fake_manager();
        let service = LookupService::new(Arc::new(manager), ttl.map(ResponseCache::new));
        (Arc::new(service), lookups)
    }

    async fn call(service: &Arc<LookupService>, method: Method, uri: &str) -> Response {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap();
        router(Arc::clone(service)).oneshot(request).await.unwrap()
    }

    async fn body_bytes(response: Response) -> Bytes {
        to_bytes(response.into_body(), usize::MAX).await.unwrap()
    }

    #[tokio::test]
    async fn test_lookup_success() {
        let (service, _) = service_with_ttl(None);
        let response = call(&service, Method::GET, "/ip/8.8.8.8").await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/json");
        assert!(response.headers().contains_key(header::LAST_MODIFIED));

        let body: serde_json::Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
        assert_eq!(body["status"], "success");
        assert_eq!(body["message"], "OK");
        assert_eq!(body["data"]["city"]["name"], "city-8.8.8.8");
        assert_eq!(body["data"]["country"]["iso_code"], "US");
    }

    #[tokio::test]
    async fn test_invalid_ip_is_422_and_not_cached() {
        let (service, lookups) = service_with_ttl(Some(Duration::from_secs(60)));
        let response = call(&service, Method::GET, "/ip/not-an-ip").await;

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/json");
        assert_eq!(
            body_bytes(response).await,
            Bytes::from_static(br#"{"status":"error","message":"unable to decode ip"}"#)
        );
        assert_eq!(lookups.load(Ordering::SeqCst), 0);
        assert!(service.cache().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_lookup_failure_is_200_with_error_envelope() {
        let (service, _) = service_with_ttl(None);
        let response = call(&service, Method::GET, "/ip/10.0.0.1").await;

        assert_eq!(response.status(), StatusCode::OK);
        let body: serde_json::Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
        assert_eq!(body["status"], "error");
        assert_eq!(body["message"], "Address not found in database");
        assert!(body.get("data").is_none());
    }

    #[tokio::test]
    async fn test_unknown_record_is_error_envelope() {
        let (service, _) = service_with_ttl(None);
        let response = call(&service, Method::GET, "/ip/0.0.0.0").await;

        assert_eq!(response.status(), StatusCode::OK);
        let body: serde_json::Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
        assert_eq!(body["status"], "error");
        assert!(body.get("data").is_none());
    }

    #[tokio::test]
    async fn test_cached_response_is_identical_and_skips_database() {
        let (service, lookups) = service_with_ttl(Some(Duration::from_secs(60)));

        let first = body_bytes(call(&service, Method::GET, "/ip/8.8.8.8").await).await;
        let second = body_bytes(call(&service, Method::GET, "/ip/8.8.8.8").await).await;

        assert_eq!(first, second);
        assert_eq!(lookups.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failed_lookups_are_cached_too() {
        let (service, lookups) = service_with_ttl(Some(Duration::from_secs(60)));

        call(&service, Method::GET, "/ip/10.0.0.1").await;
        let response = call(&service, Method::GET, "/ip/10.0.0.1").await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(lookups.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_without_cache_every_request_hits_database() {
        let (service, lookups) = service_with_ttl(None);

        call(&service, Method::GET, "/ip/8.8.8.8").await;
        call(&service, Method::GET, "/ip/8.8.8.8").await;

        assert_eq!(lookups.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_expired_entry_triggers_fresh_lookup() {
        let (service, lookups) = service_with_ttl(Some(Duration::from_millis(400)));

        call(&service, Method::GET, "/ip/1.1.1.1").await;
        call(&service, Method::GET, "/ip/1.1.1.1").await;
        assert_eq!(lookups.load(Ordering::SeqCst), 1);

        tokio::time::sleep(Duration::from_millis(600)).await;
        call(&service, Method::GET, "/ip/1.1.1.1").await;
        assert_eq!(lookups.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_textual_variants_are_cached_separately() {
        let (service, lookups) = service_with_ttl(Some(Duration::from_secs(60)));

        call(&service, Method::GET, "/ip/2001:db8::1").await;
        call(&service, Method::GET, "/ip/2001:DB8::1").await;

        assert_eq!(lookups.load(Ordering::SeqCst), 2);
        assert_eq!(service.cache().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_ping_get() {
        let (service, _) = service_with_ttl(None);
        let response = call(&service, Method::GET, "/ping").await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "text/plain");

        let uptime = response.headers()["x-uptime"].to_str().unwrap().to_string();
        let seconds: f64 = uptime.strip_suffix('s').unwrap().parse().unwrap();
        assert!(seconds >= 0.0);

        assert_eq!(body_bytes(response).await, Bytes::from_static(b"pong"));
    }

    #[tokio::test]
    async fn test_ping_head_has_no_body() {
        let (service, _) = service_with_ttl(None);
        let response = call(&service, Method::HEAD, "/ping").await;

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-uptime"));
        assert!(body_bytes(response).await.is_empty());
    }

    #[tokio::test]
    async fn test_last_modified_is_fixed() {
        let (service, _) = service_with_ttl(None);
        let first = call(&service, Method::GET, "/ip/8.8.8.8").await;
        tokio::time::sleep(Duration::from_millis(1100)).await;
        let second = call(&service, Method::GET, "/ping").await;

        assert_eq!(
            first.headers()[header::LAST_MODIFIED],
            second.headers()[header::LAST_MODIFIED]
        );
    }

    #[test]
    fn test_http_date_format() {
        let at = DateTime::parse_from_rfc3339("2015-10-21T07:28:00Z")
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(http_date(at), "Wed, 21 Oct 2015 07:28:00 GMT");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_distinct_keys() {
        let (service, lookups) = service_with_ttl(Some(Duration::from_secs(60)));

        let tasks: Vec<_> = (0..64)
            .map(|i| {
                let service = Arc::clone(&service);
                tokio::spawn(async move {
                    let ip = format!("203.0.113.{}", i);
                    let response = call(&service, Method::GET, &format!("/ip/{}", ip)).await;
                    let body: serde_json::Value =
                        serde_json::from_slice(&body_bytes(response).await).unwrap();
                    (ip, body)
                })
            })
            .collect();

        for task in tasks {
            let (ip, body) = task.await.unwrap();
            assert_eq!(body["data"]["city"]["name"], format!("city-{}", ip));
        }

        assert_eq!(lookups.load(Ordering::SeqCst), 64);
        assert_eq!(service.cache().unwrap().len(), 64);
    }
}
