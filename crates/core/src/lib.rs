//! # Caliper Core
//!
//! Domain types, traits, and error definitions for the Caliper adaptive
//! assessment engine. This crate defines the domain model that all other
//! crates implement against; it carries no HTTP, storage, or CLI machinery.
//!
//! ## Design Philosophy
//!
//! Every subsystem is defined as a trait here. Implementations live in their
//! respective crates. This enables:
//! - Swapping implementations via configuration
//! - Easy testing with mock/stub implementations
//! - Clean dependency graph (all crates depend inward on core)

pub mod bank;
pub mod error;
pub mod event;
pub mod item;
pub mod response;
pub mod session;
pub mod store;

// Re-export key types at crate root for ergonomics
pub use bank::{CandidateFilter, ItemBank};
pub use error::{BankError, EngineError, Error, Result, StoreError};
pub use event::{DomainEvent, EventBus};
pub use item::{Item, ItemId, ItemView};
pub use response::Response;
pub use session::{
    AssessmentSettings, CompletionReason, Session, SessionId, SessionState, SessionSummary,
};
pub use store::SessionStore;
