//! Error types for the Caliper domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error variant.

use thiserror::Error;

/// The top-level error type for all Caliper operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Item bank errors ---
    #[error("Bank error: {0}")]
    Bank(#[from] BankError),

    // --- Engine / session errors ---
    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    // --- Session store errors ---
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // --- Generic ---
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

#[derive(Debug, Clone, Error)]
pub enum BankError {
    #[error("Item not found: {0}")]
    ItemNotFound(String),

    #[error("No eligible items remain in the bank")]
    Empty,

    #[error("Failed to load item bank from {path}: {reason}")]
    Load { path: String, reason: String },

    #[error("Invalid item '{id}': {reason}")]
    InvalidItem { id: String, reason: String },
}

#[derive(Debug, Clone, Error)]
pub enum EngineError {
    #[error("Session not found: {0}")]
    SessionNotFound(String),

    #[error("Session is completed and accepts no further responses: {0}")]
    SessionClosed(String),

    #[error("Response references item '{got}' but item '{expected}' is pending")]
    UnexpectedItem { expected: String, got: String },

    #[error("Session {0} has no item awaiting a response")]
    NoPendingItem(String),

    /// Newton-Raphson failed to converge. Never surfaced to clients; the
    /// orchestrator falls back to the prior estimate and continues.
    #[error("Ability estimation did not converge after {iterations} iterations")]
    DidNotConverge { iterations: u32 },
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}
