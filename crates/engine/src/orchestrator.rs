//! The session orchestrator — sequences estimator → stopping rule →
//! selector per response and owns all session state.
//!
//! Sessions live in a map of per-session `tokio::sync::Mutex` slots: the
//! serve → answer → score cycle for one session is strictly serialized even
//! when the surrounding gateway handles many sessions concurrently. The
//! orchestrator is the sole writer of `Session`.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

use caliper_config::EstimatorConfig;
use caliper_core::bank::ItemBank;
use caliper_core::error::{BankError, EngineError, Error, Result};
use caliper_core::event::{DomainEvent, EventBus};
use caliper_core::item::ItemView;
use caliper_core::response::Response;
use caliper_core::session::{AssessmentSettings, CompletionReason, Session, SessionSummary};
use caliper_core::store::SessionStore;
use caliper_telemetry::TelemetryEngine;

use crate::estimator::estimate_ability;
use crate::selector::select_next;
use crate::stopping::evaluate_stopping;

/// Per-request overrides of the configured assessment defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SettingsOverrides {
    #[serde(default)]
    pub max_items: Option<usize>,
    #[serde(default)]
    pub min_items: Option<usize>,
    #[serde(default)]
    pub target_se: Option<f64>,
    #[serde(default)]
    pub max_seconds: Option<u64>,
}

impl SettingsOverrides {
    /// Merge into the defaults, re-validating the combined result.
    fn apply(&self, mut settings: AssessmentSettings) -> Result<AssessmentSettings> {
        if let Some(v) = self.max_items {
            settings.max_items = v;
        }
        if let Some(v) = self.min_items {
            settings.min_items = v;
        }
        if let Some(v) = self.target_se {
            settings.target_se = v;
        }
        if let Some(v) = self.max_seconds {
            settings.max_seconds = Some(v);
        }
        if settings.max_items == 0 {
            return Err(Error::Config {
                message: "max_items must be > 0".into(),
            });
        }
        if settings.min_items > settings.max_items {
            return Err(Error::Config {
                message: format!(
                    "min_items ({}) must not exceed max_items ({})",
                    settings.min_items, settings.max_items
                ),
            });
        }
        if settings.target_se <= 0.0 {
            return Err(Error::Config {
                message: "target_se must be > 0".into(),
            });
        }
        Ok(settings)
    }
}

/// What the client gets after a terminal transition.
#[derive(Debug, Clone, Serialize)]
pub struct CompletionReport {
    pub session_id: String,
    pub reason: CompletionReason,
    pub theta: f64,
    pub standard_error: f64,
    pub items_administered: usize,
    pub started_at: chrono::DateTime<Utc>,
    pub ended_at: chrono::DateTime<Utc>,
}

/// Either the next item to administer or the final report.
#[derive(Debug, Clone)]
pub enum Next {
    Item(ItemView),
    Report(CompletionReport),
}

/// Outcome of `start()`.
#[derive(Debug, Clone)]
pub struct StartOutcome {
    pub session: Session,
    pub next: Next,
}

/// Outcome of `respond()`.
#[derive(Debug, Clone)]
pub struct RespondOutcome {
    pub correct: bool,
    pub theta: f64,
    pub standard_error: f64,
    pub next: Next,
}

type SessionSlot = Arc<Mutex<Session>>;

/// The session orchestrator.
pub struct Orchestrator {
    bank: Arc<dyn ItemBank>,
    store: Arc<dyn SessionStore>,
    events: Arc<EventBus>,
    telemetry: Option<Arc<TelemetryEngine>>,
    defaults: AssessmentSettings,
    estimator_cfg: EstimatorConfig,
    sessions: RwLock<HashMap<String, SessionSlot>>,
}

impl Orchestrator {
    pub fn new(
        bank: Arc<dyn ItemBank>,
        store: Arc<dyn SessionStore>,
        events: Arc<EventBus>,
        defaults: AssessmentSettings,
        estimator_cfg: EstimatorConfig,
    ) -> Self {
        Self {
            bank,
            store,
            events,
            telemetry: None,
            defaults,
            estimator_cfg,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Attach a telemetry engine.
    pub fn with_telemetry(mut self, telemetry: Arc<TelemetryEngine>) -> Self {
        self.telemetry = Some(telemetry);
        self
    }

    /// Start a new session and serve its first item.
    ///
    /// An empty (or fully filtered) bank does not fail the request: the
    /// session completes immediately with `BankExhausted` and the outcome
    /// carries the report instead of a first item.
    pub async fn start(
        &self,
        user_id: impl Into<String>,
        domain: Option<String>,
        overrides: SettingsOverrides,
    ) -> Result<StartOutcome> {
        let settings = overrides.apply(self.defaults.clone())?;
        let mut session = Session::new(user_id, domain, settings);

        info!(session_id = %session.id, user_id = %session.user_id, "Assessment session started");
        self.events.publish(DomainEvent::SessionStarted {
            session_id: session.id.to_string(),
            user_id: session.user_id.clone(),
            domain: session.domain.clone(),
            timestamp: Utc::now(),
        });
        if let Some(t) = &self.telemetry {
            t.record_session_started();
        }

        let next = self.advance(&mut session).await?;
        self.store
            .save(&session)
            .await
            .log_storage_failure(&session.id.to_string());

        let id = session.id.to_string();
        self.sessions
            .write()
            .await
            .insert(id, Arc::new(Mutex::new(session.clone())));

        Ok(StartOutcome { session, next })
    }

    /// Score a response and advance the session.
    pub async fn respond(
        &self,
        session_id: &str,
        item_id: &str,
        answer: &str,
        response_time_ms: u64,
    ) -> Result<RespondOutcome> {
        let slot = self.slot(session_id).await?;
        let mut session = slot.lock().await;

        // Reject before any mutation.
        if session.is_completed() {
            return Err(EngineError::SessionClosed(session_id.to_string()).into());
        }
        let pending = session
            .pending_item
            .clone()
            .ok_or_else(|| EngineError::NoPendingItem(session_id.to_string()))?;
        if pending != item_id {
            return Err(EngineError::UnexpectedItem {
                expected: pending,
                got: item_id.to_string(),
            }
            .into());
        }

        let item = self
            .bank
            .get(item_id)
            .await
            .ok_or_else(|| BankError::ItemNotFound(item_id.to_string()))?;

        let correct = item.grade(answer);
        let response = Response::new(item_id, correct, response_time_ms);
        session.accept_response(response.clone())?;
        self.store
            .append_response(session_id, &response)
            .await
            .log_storage_failure(session_id);

        // Re-estimate from the full history.
        let mut history = Vec::with_capacity(session.responses.len());
        for r in &session.responses {
            let it = self
                .bank
                .get(&r.item_id)
                .await
                .ok_or_else(|| BankError::ItemNotFound(r.item_id.clone()))?;
            history.push((r.clone(), it));
        }
        let est = estimate_ability(&history, session.theta, &session.settings, &self.estimator_cfg);
        if !est.converged {
            warn!(session_id, "Ability estimation did not converge; keeping prior estimate");
            self.events.publish(DomainEvent::EstimationFellBack {
                session_id: session_id.to_string(),
                iterations: self.estimator_cfg.max_iterations,
                timestamp: Utc::now(),
            });
            if let Some(t) = &self.telemetry {
                t.record_fallback();
            }
        }
        session.theta = est.theta;
        session.standard_error = est.se;

        debug!(
            session_id,
            item_id,
            correct,
            theta = session.theta,
            se = session.standard_error,
            "Response scored"
        );
        self.events.publish(DomainEvent::ResponseScored {
            session_id: session_id.to_string(),
            item_id: item_id.to_string(),
            correct,
            theta: session.theta,
            standard_error: session.standard_error,
            timestamp: Utc::now(),
        });
        if let Some(t) = &self.telemetry {
            t.record_response(correct);
        }

        let next = match evaluate_stopping(&session, Utc::now()) {
            Some(reason) => Next::Report(self.finish(&mut session, reason)),
            None => self.advance(&mut session).await?,
        };
        self.store.save(&session).await.log_storage_failure(session_id);

        Ok(RespondOutcome {
            correct,
            theta: session.theta,
            standard_error: session.standard_error,
            next,
        })
    }

    /// Read-only session snapshot. Never mutates.
    pub async fn status(&self, session_id: &str) -> Result<Session> {
        if let Some(slot) = self.sessions.read().await.get(session_id) {
            return Ok(slot.lock().await.clone());
        }
        match self.store.load(session_id).await {
            Ok(Some(session)) => Ok(session),
            Ok(None) => Err(EngineError::SessionNotFound(session_id.to_string()).into()),
            Err(e) => Err(e.into()),
        }
    }

    /// Summaries of every session this process has seen, newest first.
    pub async fn list(&self) -> Vec<SessionSummary> {
        let slots: Vec<SessionSlot> = self.sessions.read().await.values().cloned().collect();
        let mut summaries = Vec::with_capacity(slots.len());
        for slot in slots {
            summaries.push(slot.lock().await.summary());
        }
        summaries.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        summaries
    }

    /// Number of sessions currently awaiting responses.
    pub async fn active_count(&self) -> usize {
        let slots: Vec<SessionSlot> = self.sessions.read().await.values().cloned().collect();
        let mut n = 0;
        for slot in slots {
            if !slot.lock().await.is_completed() {
                n += 1;
            }
        }
        n
    }

    /// Close sessions idle past `max_idle` as abandoned, so orphans don't
    /// block exposure bookkeeping forever. Returns how many were closed.
    pub async fn sweep_abandoned(&self, max_idle: Duration) -> usize {
        let now = Utc::now();
        let slots: Vec<SessionSlot> = self.sessions.read().await.values().cloned().collect();
        let mut swept = 0;
        for slot in slots {
            let mut session = slot.lock().await;
            if !session.is_completed() && now - session.updated_at > max_idle {
                let id = session.id.to_string();
                info!(session_id = %id, "Closing abandoned session");
                self.finish(&mut session, CompletionReason::Abandoned);
                self.store.save(&session).await.log_storage_failure(&id);
                swept += 1;
            }
        }
        swept
    }

    /// Attach handles the gateway needs.
    pub fn event_bus(&self) -> Arc<EventBus> {
        self.events.clone()
    }

    pub fn bank(&self) -> Arc<dyn ItemBank> {
        self.bank.clone()
    }

    // ── internals ─────────────────────────────────────────────────────────

    async fn slot(&self, session_id: &str) -> Result<SessionSlot> {
        if let Some(slot) = self.sessions.read().await.get(session_id) {
            return Ok(slot.clone());
        }
        // Not in memory: resume from the store (e.g. after a restart).
        match self.store.load(session_id).await {
            Ok(Some(session)) => {
                let mut sessions = self.sessions.write().await;
                let slot = sessions
                    .entry(session_id.to_string())
                    .or_insert_with(|| Arc::new(Mutex::new(session)))
                    .clone();
                Ok(slot)
            }
            Ok(None) => Err(EngineError::SessionNotFound(session_id.to_string()).into()),
            Err(e) => Err(e.into()),
        }
    }

    /// Select and serve the next item, or complete with `BankExhausted`.
    async fn advance(&self, session: &mut Session) -> Result<Next> {
        let selection = select_next(
            &self.bank,
            session.theta,
            &session.administered,
            session.domain.clone(),
        )
        .await?;

        match selection {
            Some(sel) => {
                session.serve_item(sel.item.id.clone())?;
                self.events.publish(DomainEvent::ItemAdministered {
                    session_id: session.id.to_string(),
                    item_id: sel.item.id.clone(),
                    information: sel.information,
                    timestamp: Utc::now(),
                });
                if let Some(t) = &self.telemetry {
                    t.record_item_administered();
                }
                Ok(Next::Item(sel.item.view()))
            }
            None => {
                debug!(session_id = %session.id, "Bank exhausted; forcing completion");
                Ok(Next::Report(
                    self.finish(session, CompletionReason::BankExhausted),
                ))
            }
        }
    }

    fn finish(&self, session: &mut Session, reason: CompletionReason) -> CompletionReport {
        session.complete(reason);
        let report = CompletionReport {
            session_id: session.id.to_string(),
            reason,
            theta: session.theta,
            standard_error: session.standard_error,
            items_administered: session.administered.len(),
            started_at: session.started_at,
            ended_at: session.ended_at.unwrap_or_else(Utc::now),
        };
        info!(
            session_id = %session.id,
            ?reason,
            items = report.items_administered,
            theta = report.theta,
            "Session completed"
        );
        self.events.publish(DomainEvent::SessionCompleted {
            session_id: report.session_id.clone(),
            reason,
            items_administered: report.items_administered,
            theta: report.theta,
            standard_error: report.standard_error,
            timestamp: Utc::now(),
        });
        if let Some(t) = &self.telemetry {
            t.record_completion(reason, report.items_administered);
        }
        report
    }
}

/// Persistence failures never fail the request; the session stays correct
/// in memory and the error is logged for the operator.
trait StorageLogged {
    fn log_storage_failure(self, session_id: &str);
}

impl<E: std::fmt::Display> StorageLogged for std::result::Result<(), E> {
    fn log_storage_failure(self, session_id: &str) {
        if let Err(e) = self {
            warn!(session_id, error = %e, "Session persistence failed");
        }
    }
}
