#![forbid(unsafe_code)]

pub mod assessment;
pub mod coordinator;
pub mod error;
pub mod loader;
pub mod portal;
pub mod state;
pub mod watch_tracker;

pub use assessment::{AssessmentGate, Decision, QueryFailurePolicy};
pub use coordinator::{CompletionCoordinator, CompletionOutcome};
pub use error::{EngineError, LoadError};
pub use loader::{TrainingGraph, TrainingSessionLoader};
pub use portal::{
    AssessmentDecision, CompletionDecision, EligibleActions, PortalEngine, WatchDecision,
};
pub use state::{Dashboard, OpenVideo};
pub use watch_tracker::{WatchTracker, LOAD_TIMEOUT, SAMPLE_INTERVAL};
