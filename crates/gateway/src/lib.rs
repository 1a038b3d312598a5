//! HTTP API gateway for Caliper.
//!
//! Exposes REST endpoints for running adaptive assessments: starting
//! sessions, submitting responses, inspecting status, plus an SSE event
//! stream and usage counters.
//!
//! Built on Axum for high performance async HTTP.

pub mod api_v1;

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::{Router, http::StatusCode, response::Json, routing::get};
use serde::Serialize;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

use caliper_bank::{InMemoryBank, demo_bank, load_bank};
use caliper_config::AppConfig;
use caliper_core::bank::ItemBank;
use caliper_core::error::{BankError, Error};
use caliper_core::event::EventBus;
use caliper_core::store::SessionStore;
use caliper_engine::Orchestrator;
use caliper_store::{FileStore, InMemoryStore, NoopStore, SqliteStore};
use caliper_telemetry::TelemetryEngine;

/// Shared application state for the gateway.
pub struct AppState {
    pub orchestrator: Arc<Orchestrator>,
    pub telemetry: Arc<TelemetryEngine>,
    pub store_backend: String,
    pub start_time: chrono::DateTime<chrono::Utc>,
}

pub type SharedState = Arc<AppState>;

/// Build the full Axum router.
///
/// Layers applied:
/// - CORS restricted to same-origin by default
/// - Request body size limit (256 KB — assessment payloads are tiny)
/// - HTTP trace logging
pub fn build_router(state: SharedState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::AllowOrigin::exact(
            "http://localhost:8080".parse().unwrap(),
        ))
        .allow_methods([axum::http::Method::GET, axum::http::Method::POST])
        .allow_headers([axum::http::header::CONTENT_TYPE])
        .max_age(std::time::Duration::from_secs(3600));

    Router::new()
        .route("/health", get(health_handler))
        .nest("/v1", api_v1::v1_router(state))
        .layer(DefaultBodyLimit::max(256 * 1024))
        .layer(cors)
        .layer(tower_http::trace::TraceLayer::new_for_http())
}

/// Build the item bank named by the config: a JSON file when a path is set,
/// the built-in demo bank otherwise.
pub fn build_bank(config: &AppConfig) -> Result<Arc<dyn ItemBank>, BankError> {
    if config.bank.path.is_empty() {
        info!("No bank path configured; using built-in demo bank");
        Ok(Arc::new(demo_bank()))
    } else {
        let bank: InMemoryBank = load_bank(std::path::Path::new(&config.bank.path))?;
        info!(path = %config.bank.path, "Item bank loaded");
        Ok(Arc::new(bank))
    }
}

/// Build the session store named by the config.
pub async fn build_store(config: &AppConfig) -> Result<Arc<dyn SessionStore>, Error> {
    match config.store.backend.as_str() {
        "sqlite" => {
            let path = if config.store.path.is_empty() {
                config.default_store_path().display().to_string()
            } else {
                config.store.path.clone()
            };
            if let Some(parent) = std::path::Path::new(&path).parent() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| Error::Internal(format!("store directory: {e}")))?;
            }
            let url = format!("sqlite://{path}");
            Ok(Arc::new(SqliteStore::new(&url).await?))
        }
        "file" => {
            let dir = if config.store.path.is_empty() {
                AppConfig::config_dir().join("sessions")
            } else {
                std::path::PathBuf::from(&config.store.path)
            };
            Ok(Arc::new(FileStore::new(dir)))
        }
        "memory" => Ok(Arc::new(InMemoryStore::new())),
        "none" => Ok(Arc::new(NoopStore)),
        other => Err(Error::Config {
            message: format!("Unknown store backend '{other}'"),
        }),
    }
}

/// Start the gateway HTTP server.
///
/// Builds bank, store, telemetry, and orchestrator once, then serves until
/// the process is stopped. A background task sweeps abandoned sessions.
pub async fn start(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let host = config.gateway.host.clone();
    let port = config.gateway.port;
    let addr = format!("{host}:{port}");

    let bank = build_bank(&config)?;
    let store = build_store(&config).await?;
    let events = Arc::new(EventBus::default());
    let telemetry = Arc::new(TelemetryEngine::new());

    let orchestrator = Arc::new(
        Orchestrator::new(
            bank,
            store,
            events,
            config.assessment.settings(),
            config.estimator.clone(),
        )
        .with_telemetry(telemetry.clone()),
    );

    // Background sweep: close sessions idle past the abandonment window.
    let sweeper = orchestrator.clone();
    let abandon_after = chrono::Duration::seconds(config.sessions.abandon_after_secs as i64);
    let sweep_interval = std::time::Duration::from_secs(config.sessions.sweep_interval_secs);
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(sweep_interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            let swept = sweeper.sweep_abandoned(abandon_after).await;
            if swept > 0 {
                warn!(swept, "Closed abandoned sessions");
            }
        }
    });

    let state = Arc::new(AppState {
        orchestrator,
        telemetry,
        store_backend: config.store.backend.clone(),
        start_time: chrono::Utc::now(),
    });

    let app = build_router(state);

    info!(addr = %addr, "Gateway starting");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// --- Handlers ---

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Map a domain error onto an HTTP status and JSON body.
pub(crate) fn error_response(err: Error) -> (StatusCode, Json<api_v1::ErrorBody>) {
    use caliper_core::error::EngineError;

    let status = match &err {
        Error::Engine(EngineError::SessionNotFound(_)) => StatusCode::NOT_FOUND,
        Error::Bank(BankError::ItemNotFound(_)) => StatusCode::NOT_FOUND,
        Error::Engine(EngineError::SessionClosed(_)) => StatusCode::CONFLICT,
        Error::Engine(EngineError::UnexpectedItem { .. })
        | Error::Engine(EngineError::NoPendingItem(_))
        | Error::Config { .. } => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if status == StatusCode::INTERNAL_SERVER_ERROR {
        tracing::error!(error = %err, "Request failed");
    }
    (
        status,
        Json(api_v1::ErrorBody {
            error: err.to_string(),
        }),
    )
}
