#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Actix-Web API server for the crisis map application.
//!
//! Loads the crisis and charity collections once at startup from the
//! configured [`crisis_map_source::CrisisSource`] and serves them
//! read-only: filtered crisis lists, charity lookups, and zoom-aware
//! `GeoJSON` clusters for the `MapLibre` frontend. A failed load is logged
//! and the server keeps running with empty collections.

mod handlers;
pub mod interactive;

use actix_cors::Cors;
use actix_web::{App, HttpResponse, HttpServer, error::InternalError, middleware, web};
use crisis_map_cluster::ClusterOptions;
use crisis_map_crisis_models::Snapshot;
use crisis_map_filter::CharityIndex;
use crisis_map_server_models::ApiError;
use crisis_map_source::{SourceConfig, load_snapshot};

/// Shared application state.
pub struct AppState {
    /// Crises and charities loaded at startup.
    pub snapshot: Snapshot,
    /// Charities grouped by crisis.
    pub charity_index: CharityIndex,
    /// Defaults for the cluster endpoints.
    pub cluster_options: ClusterOptions,
}

impl AppState {
    #[must_use]
    pub fn new(snapshot: Snapshot, cluster_options: ClusterOptions) -> Self {
        let charity_index = CharityIndex::build(&snapshot.charities);
        Self {
            snapshot,
            charity_index,
            cluster_options,
        }
    }
}

/// Answers malformed query strings with an [`ApiError`] body.
fn query_config() -> web::QueryConfig {
    web::QueryConfig::default().error_handler(|err, req| {
        log::debug!("Rejecting query for {}: {err}", req.path());
        let response = HttpResponse::BadRequest().json(ApiError::new(err.to_string()));
        InternalError::from_response(err, response).into()
    })
}

/// Registers the `/api` routes.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .app_data(query_config())
            .route("/health", web::get().to(handlers::health))
            .route("/categories", web::get().to(handlers::categories))
            .route("/crises", web::get().to(handlers::crises))
            .route("/crises/{id}", web::get().to(handlers::crisis))
            .route("/charities", web::get().to(handlers::charities))
            .route(
                "/charities/by-crisis/{id}",
                web::get().to(handlers::charities_by_crisis),
            )
            .route("/clusters", web::get().to(handlers::clusters))
            .route(
                "/clusters/{zoom}/{seed}/expansion",
                web::get().to(handlers::cluster_expansion),
            ),
    );
}

/// Reads cluster defaults from `CRISIS_MAP_CLUSTER_RADIUS` and
/// `CRISIS_MAP_CLUSTER_MAX_ZOOM`. Unparseable values are ignored.
#[must_use]
pub fn cluster_options_from(lookup: impl Fn(&str) -> Option<String>) -> ClusterOptions {
    let mut options = ClusterOptions::default();

    match lookup("CRISIS_MAP_CLUSTER_RADIUS").map(|v| v.trim().parse::<f64>()) {
        Some(Ok(radius)) if radius.is_finite() && radius >= 0.0 => options.radius = radius,
        Some(_) => log::warn!("Ignoring invalid CRISIS_MAP_CLUSTER_RADIUS"),
        None => {}
    }

    match lookup("CRISIS_MAP_CLUSTER_MAX_ZOOM").map(|v| v.trim().parse::<u8>()) {
        Some(Ok(max_zoom)) => options.max_zoom = max_zoom,
        Some(Err(e)) => log::warn!("Ignoring invalid CRISIS_MAP_CLUSTER_MAX_ZOOM: {e}"),
        None => {}
    }

    options
}

/// Starts the crisis map API server.
///
/// Loads the data source configuration from the environment, fetches the
/// snapshot, and starts the Actix-Web HTTP server. The caller provides the
/// async runtime (e.g. via `#[actix_web::main]`).
///
/// # Errors
///
/// Returns an `std::io::Result` error if the source configuration is
/// invalid, or if the HTTP server fails to bind or encounters a runtime
/// error.
#[allow(clippy::future_not_send)]
pub async fn run_server() -> std::io::Result<()> {
    pretty_env_logger::init_custom_env("RUST_LOG");

    let config = SourceConfig::from_env().map_err(std::io::Error::other)?;
    let source = config.build().map_err(std::io::Error::other)?;

    let outcome = load_snapshot(source.as_ref()).await;
    if let Some(error) = &outcome.error {
        log::error!("Serving empty collections: {error}");
    }

    let cluster_options = cluster_options_from(|key| std::env::var(key).ok());
    log::debug!("Cluster options: {cluster_options:?}");

    let state = web::Data::new(AppState::new(outcome.snapshot, cluster_options));

    let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8080);

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
