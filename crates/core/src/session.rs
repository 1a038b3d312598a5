//! Session domain types and the session state machine.
//!
//! A session walks `Created → AwaitingResponse → Scoring → …` until it is
//! `Completed`, which is terminal. The orchestrator in `caliper-engine` is
//! the sole writer of session state; the transition helpers here enforce
//! the legal moves and the duplicate-administration invariant.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::EngineError;
use crate::item::ItemId;
use crate::response::Response;

/// Unique identifier for an assessment session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub String);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Where a session is in its serve → answer → score cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// Created but no item served yet.
    Created,
    /// An item has been served; waiting for the respondent.
    AwaitingResponse,
    /// A response arrived and is being scored. Transient: only observable
    /// mid-call inside the orchestrator.
    Scoring,
    /// Terminal. No further responses accepted.
    Completed,
}

/// Why a session terminated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionReason {
    /// Hard item cap reached (always wins over precision).
    ItemCapReached,
    /// Standard error dropped to the configured target.
    PrecisionReached,
    /// Wall-clock budget exceeded.
    TimeBudgetExceeded,
    /// No eligible item remained in the bank.
    BankExhausted,
    /// Idle past the abandonment window; closed by the sweeper.
    Abandoned,
}

/// Per-session snapshot of the assessment parameters.
///
/// Captured at `start()` so mid-flight config changes never alter a
/// running session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentSettings {
    /// Hard cap on administered items.
    pub max_items: usize,
    /// Floor before any stopping rule other than the cap is considered.
    pub min_items: usize,
    /// Precision target: stop once SE falls to this level.
    pub target_se: f64,
    /// Prior mean for θ, used before any responses exist.
    pub prior_theta: f64,
    /// Prior standard error, used before any responses exist.
    pub prior_se: f64,
    /// Lower clamp for θ.
    pub theta_min: f64,
    /// Upper clamp for θ.
    pub theta_max: f64,
    /// Optional wall-clock budget for the whole session.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_seconds: Option<u64>,
}

impl Default for AssessmentSettings {
    fn default() -> Self {
        Self {
            max_items: 30,
            min_items: 10,
            target_se: 0.3,
            prior_theta: 0.0,
            prior_se: 1.0,
            theta_min: -4.0,
            theta_max: 4.0,
            max_seconds: None,
        }
    }
}

/// A full assessment session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Unique session ID
    pub id: SessionId,

    /// Who is being assessed.
    pub user_id: String,

    /// Content domain under assessment (maps to bank content categories).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,

    /// Current ability estimate (θ).
    pub theta: f64,

    /// Standard error of the ability estimate.
    pub standard_error: f64,

    /// Ordered ids of every administered item. No duplicates.
    pub administered: Vec<ItemId>,

    /// The item currently awaiting an answer, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pending_item: Option<ItemId>,

    /// Ordered scored responses.
    pub responses: Vec<Response>,

    /// Where the session is in its lifecycle.
    pub state: SessionState,

    /// Set exactly once, when the session completes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completion: Option<CompletionReason>,

    /// Settings snapshot taken at start.
    pub settings: AssessmentSettings,

    pub started_at: DateTime<Utc>,

    /// Last mutation time; drives the abandonment sweep.
    pub updated_at: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<DateTime<Utc>>,
}

impl Session {
    /// Create a new session with the prior estimate as its starting point.
    pub fn new(user_id: impl Into<String>, domain: Option<String>, settings: AssessmentSettings) -> Self {
        let now = Utc::now();
        Self {
            id: SessionId::new(),
            user_id: user_id.into(),
            domain,
            theta: settings.prior_theta,
            standard_error: settings.prior_se,
            administered: Vec::new(),
            pending_item: None,
            responses: Vec::new(),
            state: SessionState::Created,
            completion: None,
            settings,
            started_at: now,
            updated_at: now,
            ended_at: None,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.state == SessionState::Completed
    }

    /// Seconds since the session started.
    pub fn elapsed_secs(&self, now: DateTime<Utc>) -> i64 {
        (now - self.started_at).num_seconds()
    }

    /// Record that an item was served to the respondent.
    ///
    /// Legal from `Created` (first item) and `Scoring` (subsequent items).
    /// Rejects duplicate administration of the same item.
    pub fn serve_item(&mut self, item_id: ItemId) -> Result<(), EngineError> {
        match self.state {
            SessionState::Completed => {
                return Err(EngineError::SessionClosed(self.id.to_string()));
            }
            SessionState::AwaitingResponse => {
                return Err(EngineError::UnexpectedItem {
                    expected: self.pending_item.clone().unwrap_or_default(),
                    got: item_id,
                });
            }
            SessionState::Created | SessionState::Scoring => {}
        }
        debug_assert!(!self.administered.contains(&item_id));
        self.administered.push(item_id.clone());
        self.pending_item = Some(item_id);
        self.state = SessionState::AwaitingResponse;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Accept a response for the pending item and move to `Scoring`.
    pub fn accept_response(&mut self, response: Response) -> Result<(), EngineError> {
        if self.is_completed() {
            return Err(EngineError::SessionClosed(self.id.to_string()));
        }
        let pending = self
            .pending_item
            .clone()
            .ok_or_else(|| EngineError::NoPendingItem(self.id.to_string()))?;
        if pending != response.item_id {
            return Err(EngineError::UnexpectedItem {
                expected: pending,
                got: response.item_id,
            });
        }
        self.pending_item = None;
        self.responses.push(response);
        self.state = SessionState::Scoring;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Transition to the terminal `Completed` state. Idempotent-hostile on
    /// purpose: completing twice is a logic error upstream.
    pub fn complete(&mut self, reason: CompletionReason) {
        debug_assert!(!self.is_completed());
        self.state = SessionState::Completed;
        self.completion = Some(reason);
        self.pending_item = None;
        let now = Utc::now();
        self.updated_at = now;
        self.ended_at = Some(now);
    }

    /// Lightweight listing view.
    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            id: self.id.clone(),
            user_id: self.user_id.clone(),
            domain: self.domain.clone(),
            theta: self.theta,
            standard_error: self.standard_error,
            items_administered: self.administered.len(),
            state: self.state,
            completion: self.completion,
            started_at: self.started_at,
            updated_at: self.updated_at,
        }
    }
}

/// Summary row for session listings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSummary {
    pub id: SessionId,
    pub user_id: String,
    pub domain: Option<String>,
    pub theta: f64,
    pub standard_error: f64,
    pub items_administered: usize,
    pub state: SessionState,
    pub completion: Option<CompletionReason>,
    pub started_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
