//! Domain event system — decoupled communication between bounded contexts.
//!
//! Events are published when something interesting happens in the engine.
//! The telemetry engine and the gateway's SSE stream subscribe without
//! coupling to the orchestrator.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;

use crate::session::CompletionReason;

/// All domain events in the system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum DomainEvent {
    /// A new assessment session was started
    SessionStarted {
        session_id: String,
        user_id: String,
        domain: Option<String>,
        timestamp: DateTime<Utc>,
    },

    /// An item was served to a respondent
    ItemAdministered {
        session_id: String,
        item_id: String,
        information: f64,
        timestamp: DateTime<Utc>,
    },

    /// A response was scored and the ability estimate updated
    ResponseScored {
        session_id: String,
        item_id: String,
        correct: bool,
        theta: f64,
        standard_error: f64,
        timestamp: DateTime<Utc>,
    },

    /// Newton-Raphson failed to converge; the prior estimate was kept
    EstimationFellBack {
        session_id: String,
        iterations: u32,
        timestamp: DateTime<Utc>,
    },

    /// A session reached a terminal state
    SessionCompleted {
        session_id: String,
        reason: CompletionReason,
        items_administered: usize,
        theta: f64,
        standard_error: f64,
        timestamp: DateTime<Utc>,
    },
}

impl DomainEvent {
    /// Stable event name for SSE framing and log filtering.
    pub fn name(&self) -> &'static str {
        match self {
            DomainEvent::SessionStarted { .. } => "session_started",
            DomainEvent::ItemAdministered { .. } => "item_administered",
            DomainEvent::ResponseScored { .. } => "response_scored",
            DomainEvent::EstimationFellBack { .. } => "estimation_fell_back",
            DomainEvent::SessionCompleted { .. } => "session_completed",
        }
    }
}

/// A broadcast-based event bus for domain events.
///
/// Uses `tokio::sync::broadcast` for multi-consumer pub/sub.
/// Components subscribe to receive all events and filter for what they care about.
pub struct EventBus {
    sender: broadcast::Sender<Arc<DomainEvent>>,
}

impl EventBus {
    /// Create a new event bus with the given capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all subscribers.
    pub fn publish(&self, event: DomainEvent) {
        // Ignore send errors (no subscribers = that's fine)
        let _ = self.sender.send(Arc::new(event));
    }

    /// Subscribe to receive events.
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<DomainEvent>> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}
