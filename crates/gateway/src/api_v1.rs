//! HTTP API v1 — the assessment REST API.
//!
//! Endpoints:
//!
//! - `POST /v1/assessment/start`        — Start a session, get the first item
//! - `POST /v1/assessment/{id}/respond` — Submit an answer, get the next step
//! - `GET  /v1/assessment/{id}`         — Session status (read-only)
//! - `GET  /v1/sessions`                — List sessions
//! - `GET  /v1/items`                   — Item inventory (client-safe views)
//! - `GET  /v1/events`                  — SSE domain event stream
//! - `GET  /v1/usage`                   — Telemetry counters
//! - `GET  /v1/status`                  — Server status

use axum::{
    Router,
    extract::{Path, State},
    http::StatusCode,
    response::sse::{Event as SseEvent, Sse},
    response::Json,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use tokio_stream::StreamExt;
use tracing::info;

use caliper_core::bank::CandidateFilter;
use caliper_core::item::ItemView;
use caliper_core::session::{CompletionReason, Session, SessionState};
use caliper_engine::{CompletionReport, Next, SettingsOverrides};
use caliper_telemetry::UsageSnapshot;

use crate::{SharedState, error_response};

// ── Router ────────────────────────────────────────────────────────────────

/// Build the v1 API router. Nest this under "/v1" in the main router.
pub fn v1_router(state: SharedState) -> Router {
    Router::new()
        .route("/assessment/start", post(start_handler))
        .route("/assessment/{id}/respond", post(respond_handler))
        .route("/assessment/{id}", get(session_status_handler))
        .route("/sessions", get(list_sessions_handler))
        .route("/items", get(list_items_handler))
        .route("/events", get(event_stream_handler))
        .route("/usage", get(usage_handler))
        .route("/status", get(status_handler))
        .with_state(state)
}

// ── Request / Response types ──────────────────────────────────────────────

#[derive(Serialize)]
pub struct ErrorBody {
    pub error: String,
}

#[derive(Deserialize)]
struct StartRequest {
    user_id: String,
    /// Restrict the session to one content category.
    #[serde(default)]
    domain: Option<String>,
    /// Per-session overrides of the configured defaults.
    #[serde(flatten)]
    overrides: SettingsOverrides,
}

/// Either the next item to answer or the final report.
#[derive(Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum NextDto {
    Item { item: ItemView },
    Report { report: CompletionReport },
}

impl From<Next> for NextDto {
    fn from(next: Next) -> Self {
        match next {
            Next::Item(item) => NextDto::Item { item },
            Next::Report(report) => NextDto::Report { report },
        }
    }
}

#[derive(Serialize)]
struct StartResponse {
    session_id: String,
    state: SessionState,
    theta: f64,
    standard_error: f64,
    next: NextDto,
}

#[derive(Deserialize)]
struct RespondRequest {
    item_id: String,
    answer: String,
    #[serde(default)]
    response_time_ms: u64,
}

#[derive(Serialize)]
struct RespondResponse {
    correct: bool,
    theta: f64,
    standard_error: f64,
    next: NextDto,
}

#[derive(Serialize)]
struct SessionStatusResponse {
    session_id: String,
    user_id: String,
    domain: Option<String>,
    state: SessionState,
    theta: f64,
    standard_error: f64,
    items_administered: usize,
    pending_item: Option<String>,
    completion: Option<CompletionReason>,
    started_at: String,
    updated_at: String,
    ended_at: Option<String>,
}

impl From<Session> for SessionStatusResponse {
    fn from(s: Session) -> Self {
        Self {
            session_id: s.id.to_string(),
            user_id: s.user_id,
            domain: s.domain,
            state: s.state,
            theta: s.theta,
            standard_error: s.standard_error,
            items_administered: s.administered.len(),
            pending_item: s.pending_item,
            completion: s.completion,
            started_at: s.started_at.to_rfc3339(),
            updated_at: s.updated_at.to_rfc3339(),
            ended_at: s.ended_at.map(|t| t.to_rfc3339()),
        }
    }
}

#[derive(Serialize)]
struct SessionListResponse {
    sessions: Vec<SessionSummaryDto>,
    count: usize,
}

#[derive(Serialize)]
struct SessionSummaryDto {
    session_id: String,
    user_id: String,
    domain: Option<String>,
    state: SessionState,
    completion: Option<CompletionReason>,
    theta: f64,
    standard_error: f64,
    items_administered: usize,
    updated_at: String,
}

#[derive(Serialize)]
struct ItemListResponse {
    items: Vec<ItemView>,
    count: usize,
    categories: Vec<String>,
}

#[derive(Serialize)]
struct StatusResponse {
    status: String,
    version: String,
    uptime_secs: u64,
    active_sessions: usize,
    bank_items: usize,
    store_backend: String,
}

// ── Handlers ──────────────────────────────────────────────────────────────

type ApiError = (StatusCode, Json<ErrorBody>);

async fn start_handler(
    State(state): State<SharedState>,
    Json(payload): Json<StartRequest>,
) -> Result<Json<StartResponse>, ApiError> {
    info!(user_id = %payload.user_id, "v1/assessment/start request");

    let outcome = state
        .orchestrator
        .start(payload.user_id, payload.domain, payload.overrides)
        .await
        .map_err(error_response)?;

    Ok(Json(StartResponse {
        session_id: outcome.session.id.to_string(),
        state: outcome.session.state,
        theta: outcome.session.theta,
        standard_error: outcome.session.standard_error,
        next: outcome.next.into(),
    }))
}

async fn respond_handler(
    State(state): State<SharedState>,
    Path(session_id): Path<String>,
    Json(payload): Json<RespondRequest>,
) -> Result<Json<RespondResponse>, ApiError> {
    let outcome = state
        .orchestrator
        .respond(
            &session_id,
            &payload.item_id,
            &payload.answer,
            payload.response_time_ms,
        )
        .await
        .map_err(error_response)?;

    Ok(Json(RespondResponse {
        correct: outcome.correct,
        theta: outcome.theta,
        standard_error: outcome.standard_error,
        next: outcome.next.into(),
    }))
}

async fn session_status_handler(
    State(state): State<SharedState>,
    Path(session_id): Path<String>,
) -> Result<Json<SessionStatusResponse>, ApiError> {
    let session = state
        .orchestrator
        .status(&session_id)
        .await
        .map_err(error_response)?;
    Ok(Json(session.into()))
}

async fn list_sessions_handler(State(state): State<SharedState>) -> Json<SessionListResponse> {
    let summaries = state.orchestrator.list().await;
    let sessions: Vec<SessionSummaryDto> = summaries
        .into_iter()
        .map(|s| SessionSummaryDto {
            session_id: s.id.to_string(),
            user_id: s.user_id,
            domain: s.domain,
            state: s.state,
            completion: s.completion,
            theta: s.theta,
            standard_error: s.standard_error,
            items_administered: s.items_administered,
            updated_at: s.updated_at.to_rfc3339(),
        })
        .collect();

    Json(SessionListResponse {
        count: sessions.len(),
        sessions,
    })
}

async fn list_items_handler(
    State(state): State<SharedState>,
) -> Result<Json<ItemListResponse>, ApiError> {
    let bank = state.orchestrator.bank();
    let items: Vec<ItemView> = match bank.candidates(&CandidateFilter::default()).await {
        Ok(items) => items.iter().map(|i| i.view()).collect(),
        Err(caliper_core::error::BankError::Empty) => Vec::new(),
        Err(e) => return Err(error_response(e.into())),
    };
    let categories = bank.categories().await;

    Ok(Json(ItemListResponse {
        count: items.len(),
        items,
        categories,
    }))
}

async fn event_stream_handler(
    State(state): State<SharedState>,
) -> Sse<impl futures::Stream<Item = Result<SseEvent, Infallible>>> {
    let rx = state.orchestrator.event_bus().subscribe();
    let stream = tokio_stream::wrappers::BroadcastStream::new(rx)
        .filter_map(|result| result.ok())
        .map(|event| {
            let data = serde_json::to_string(event.as_ref()).unwrap_or_default();
            Ok(SseEvent::default().event(event.name()).data(data))
        });

    Sse::new(stream)
}

async fn usage_handler(State(state): State<SharedState>) -> Json<UsageSnapshot> {
    Json(state.telemetry.usage_snapshot())
}

async fn status_handler(State(state): State<SharedState>) -> Json<StatusResponse> {
    let uptime = chrono::Utc::now()
        .signed_duration_since(state.start_time)
        .num_seconds() as u64;
    let bank = state.orchestrator.bank();

    Json(StatusResponse {
        status: "healthy".into(),
        version: env!("CARGO_PKG_VERSION").into(),
        uptime_secs: uptime,
        active_sessions: state.orchestrator.active_count().await,
        bank_items: bank.len().await,
        store_backend: state.store_backend.clone(),
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────
