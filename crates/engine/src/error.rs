//! Shared error types for the engine crate.
//!
//! Domain negatives (a locked video, an unwatched video, a failed
//! assessment) are decision values, not errors; only collaborator failures
//! appear here.

use thiserror::Error;

use client::api::ApiError;
use client::playback::PlaybackError;
use portal_core::model::training::TrainingError;

/// Errors emitted by the training session loader.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LoadError {
    #[error("no learner identity in the session store")]
    MissingIdentity,

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("backend payload failed validation: {0}")]
    Payload(#[from] TrainingError),
}

/// Errors emitted by the engine facade.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum EngineError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Playback(#[from] PlaybackError),

    #[error("assessment lookup failed and the configured policy blocks completion")]
    AssessmentUnavailable(#[source] ApiError),
}
