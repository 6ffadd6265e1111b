#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Actix-Web API server for the crime correlation engine.
//!
//! Serves the contingency table, association test, correlation matrix,
//! centroids, and summaries of the currently published snapshot as JSON.
//! The snapshot is built once at startup from the read-only `DuckDB` event
//! database and rebuilt on `POST /api/reload`.

mod handlers;
pub mod interactive;

use std::path::PathBuf;
use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{App, HttpServer, middleware, web};
use crime_corr_analytics::AnalyticsError;
use crime_corr_analytics::snapshot::{Published, SnapshotStore};
use crime_corr_source::EventSource;
use crime_corr_source::duckdb_source::DuckDbEventSource;

/// Default bind address.
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1";

/// Default port.
pub const DEFAULT_PORT: u16 = 8080;

/// Shared application state.
pub struct AppState {
    /// Where events are read from.
    pub source: Arc<dyn EventSource>,
    /// The currently published snapshot.
    pub store: SnapshotStore,
}

impl AppState {
    /// Creates state with no snapshot published yet.
    #[must_use]
    pub fn new(source: Arc<dyn EventSource>) -> Self {
        Self {
            source,
            store: SnapshotStore::new(),
        }
    }

    /// Rebuilds the snapshot from the source and publishes it.
    ///
    /// # Errors
    ///
    /// Returns [`AnalyticsError`] if the build fails; the previous snapshot
    /// stays in effect.
    pub fn reload(&self) -> Result<Published, AnalyticsError> {
        self.store.reload(self.source.as_ref())
    }
}

/// Server settings read from the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Event database file (`CRIME_DB_PATH`).
    pub db_path: PathBuf,
    /// Bind address (`BIND_ADDR`).
    pub bind_addr: String,
    /// Port (`PORT`).
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            db_path: crime_corr_source::paths::default_db_path(),
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            port: DEFAULT_PORT,
        }
    }
}

impl ServerConfig {
    /// Reads `CRIME_DB_PATH`, `BIND_ADDR`, and `PORT`, falling back to the
    /// defaults for anything unset or unparsable.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            db_path: lookup("CRIME_DB_PATH").map_or(defaults.db_path, PathBuf::from),
            bind_addr: lookup("BIND_ADDR").unwrap_or(defaults.bind_addr),
            port: lookup("PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),
        }
    }
}

/// Registers the `/api` routes.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .route("/health", web::get().to(handlers::health))
            .route("/dataset", web::get().to(handlers::dataset))
            .route("/contingency", web::get().to(handlers::contingency))
            .route("/association", web::get().to(handlers::association))
            .route("/correlation", web::get().to(handlers::correlation))
            .route("/fingerprints", web::get().to(handlers::fingerprints))
            .route("/centroids", web::get().to(handlers::centroids))
            .route("/centroids/{city}", web::get().to(handlers::centroid))
            .route("/links", web::get().to(handlers::links))
            .route("/cities/{city}/summary", web::get().to(handlers::city_summary))
            .route(
                "/offenses/{offense}/summary",
                web::get().to(handlers::offense_summary),
            )
            .route("/events", web::get().to(handlers::events))
            .route("/diagnostics", web::get().to(handlers::diagnostics))
            .route("/reload", web::post().to(handlers::reload)),
    );
}

/// Starts the API server with settings from the environment.
///
/// This is a regular async function; the caller provides the runtime
/// (e.g. via `#[actix_web::main]`).
///
/// # Errors
///
/// Returns an `std::io::Result` error if the event database cannot be
/// opened or the HTTP server fails to bind.
#[allow(clippy::future_not_send)]
pub async fn run_server() -> std::io::Result<()> {
    run_with_config(ServerConfig::from_env()).await
}

/// Starts the API server with explicit settings.
///
/// A failed initial build is logged and the server starts anyway; data
/// endpoints answer `503` until a reload succeeds.
///
/// # Errors
///
/// Returns an `std::io::Result` error if the event database cannot be
/// opened or the HTTP server fails to bind.
#[allow(clippy::future_not_send)]
pub async fn run_with_config(config: ServerConfig) -> std::io::Result<()> {
    log::info!("Opening event database {}...", config.db_path.display());
    let source = DuckDbEventSource::open_read_only(&config.db_path).map_err(std::io::Error::other)?;

    let state = web::Data::new(AppState::new(Arc::new(source)));

    if state.reload().is_err() {
        log::warn!("Starting without a snapshot; data endpoints return 503 until a reload succeeds");
    }

    let ServerConfig {
        bind_addr, port, ..
    } = config;

    log::info!("Starting server on {bind_addr}:{port}");

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .configure(configure)
    })
    .bind((bind_addr, port))?
    .run()
    .await
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn config_reads_overrides() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("CRIME_DB_PATH", "/tmp/events.duckdb"),
            ("BIND_ADDR", "0.0.0.0"),
            ("PORT", "9000"),
        ]);
        let config = ServerConfig::from_lookup(|k| env.get(k).map(|v| (*v).to_string()));
        assert_eq!(config.db_path, PathBuf::from("/tmp/events.duckdb"));
        assert_eq!(config.bind_addr, "0.0.0.0");
        assert_eq!(config.port, 9000);
    }

    #[test]
    fn config_falls_back_on_bad_port() {
        let config =
            ServerConfig::from_lookup(|k| (k == "PORT").then(|| "not-a-port".to_string()));
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.bind_addr, DEFAULT_BIND_ADDR);
        assert_eq!(config.db_path, crime_corr_source::paths::default_db_path());
    }
}
