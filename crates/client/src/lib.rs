#![forbid(unsafe_code)]

pub mod api;
pub mod config;
pub mod http;
pub mod playback;
pub mod session_store;

pub use api::{
    ApiError, AssessmentSheet, CompletionAck, CompletionRequest, InMemoryPortalApi, PortalApi,
    TrainingDetail, TrainingsPayload,
};
pub use config::ClientConfig;
pub use http::HttpPortalApi;
pub use playback::{
    extract_embed_id, EmbedOptions, PlaybackError, PlaybackHandle, PlaybackProvider,
    ScriptedHandle, ScriptedProvider,
};
pub use session_store::{keys, InMemorySessionStore, SessionStore, StoredUser};
