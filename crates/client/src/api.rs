//! Backend interface: the `PortalApi` trait, its wire DTOs, and an
//! in-memory fake for tests.
//!
//! DTOs absorb the backend's shape quirks (camelCase names, `_id` keys,
//! percentages serialized as strings, optional collections) so the rest of
//! the workspace only sees normalized domain types.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;
use tracing::debug;

use portal_core::model::{
    default_due_date, Answer, AssessmentOutcome, EmployeeId, MediaRef, Module, ModuleId, Question,
    QuestionId, Training, TrainingError, TrainingId, TrainingKind, UserId, Video, VideoId,
};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

/// Errors surfaced by backend adapters.
///
/// Domain negatives (locked videos, failed assessments) are never errors;
/// everything here is a transport or protocol failure and is retryable.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ApiError {
    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error("request failed with status {0}")]
    Status(reqwest::StatusCode),

    #[error("backend rejected the request: {0}")]
    Rejected(String),

    #[error("transport failure: {0}")]
    Transport(String),
}

//
// ─── WIRE DTOS ─────────────────────────────────────────────────────────────────
//

/// Accepts a percentage encoded as a number, a string (`"100.00"`), or
/// absent/null, defaulting to zero — the backend is not consistent.
fn percent_from_any<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawPercent {
        Number(f64),
        Text(String),
    }

    let raw = Option::<RawPercent>::deserialize(deserializer)?;
    Ok(match raw {
        Some(RawPercent::Number(n)) => n,
        Some(RawPercent::Text(s)) => s.trim().parse().unwrap_or(0.0),
        None => 0.0,
    })
}

/// Unified listing of a learner's trainings.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainingsPayload {
    #[serde(default)]
    pub assigned_trainings: Vec<TrainingDto>,
    #[serde(default)]
    pub mandatory_trainings: Vec<TrainingDto>,
    #[serde(default, deserialize_with = "percent_from_any")]
    pub user_overall_completion_percentage: f64,
    #[serde(default)]
    pub user_role: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainingDto {
    #[serde(alias = "_id")]
    pub training_id: TrainingId,
    pub name: String,
    #[serde(default, deserialize_with = "percent_from_any")]
    pub completion_percentage: f64,
    #[serde(default)]
    pub due_date: Option<String>,
    #[serde(default)]
    pub modules: Vec<ModuleDto>,
}

impl TrainingDto {
    /// Normalizes the wire shape into a domain training.
    ///
    /// Missing `modules` arrive as an empty sequence via serde defaults; an
    /// absent or unparseable due date falls back to [`default_due_date`].
    ///
    /// # Errors
    ///
    /// Returns `TrainingError` if the backend sent blank names.
    pub fn into_training(self, kind: TrainingKind) -> Result<Training, TrainingError> {
        let due_date = self
            .due_date
            .as_deref()
            .and_then(|raw| raw.parse().ok())
            .unwrap_or_else(default_due_date);
        let modules = self
            .modules
            .into_iter()
            .map(ModuleDto::into_module)
            .collect::<Result<Vec<_>, _>>()?;
        Training::new(
            self.training_id,
            self.name,
            kind,
            self.completion_percentage,
            due_date,
            modules,
        )
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleDto {
    #[serde(rename = "_id")]
    pub id: ModuleId,
    pub name: String,
    #[serde(default)]
    pub videos: Vec<VideoDto>,
}

impl ModuleDto {
    /// # Errors
    ///
    /// Returns `TrainingError` if the backend sent a blank module name.
    pub fn into_module(self) -> Result<Module, TrainingError> {
        let videos = self
            .videos
            .into_iter()
            .map(|video| video.into_video(self.id.clone()))
            .collect();
        Module::new(self.id, self.name, videos)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoDto {
    #[serde(rename = "_id")]
    pub id: VideoId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub video_url: Option<String>,
    #[serde(default)]
    pub original_url: Option<String>,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub questions: Vec<QuestionRefDto>,
}

impl VideoDto {
    fn into_video(self, module_id: ModuleId) -> Video {
        // Prefer the embed URL, fall back to the original share link. A
        // missing or malformed URL leaves the video present but unplayable.
        let media = self
            .video_url
            .as_deref()
            .or(self.original_url.as_deref())
            .and_then(|raw| match MediaRef::parse(raw) {
                Ok(media) => Some(media),
                Err(err) => {
                    debug!(video = %self.id, %err, "dropping unusable media reference");
                    None
                }
            });
        let questions = self.questions.into_iter().map(|q| q.id).collect();
        Video::new(self.id, module_id, self.title, media, self.completed, questions)
    }
}

/// Question reference as embedded in detail payloads; only the id matters,
/// the full question set is re-fetched from the assessment endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct QuestionRefDto {
    #[serde(rename = "_id")]
    pub id: QuestionId,
}

/// Detail payload for one training.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainingDetail {
    #[serde(default)]
    pub modules: Vec<ModuleDto>,
}

impl TrainingDetail {
    /// # Errors
    ///
    /// Returns `TrainingError` if any module fails validation.
    pub fn into_modules(self) -> Result<Vec<Module>, TrainingError> {
        self.modules.into_iter().map(ModuleDto::into_module).collect()
    }
}

/// Question set attached to a video; empty when the video carries none.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AssessmentSheet {
    #[serde(default)]
    pub questions: Vec<Question>,
}

/// Body of the mark-complete call.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionRequest {
    pub video_id: VideoId,
    pub training_id: TrainingId,
    pub module_id: ModuleId,
    pub user_id: UserId,
    pub watch_time: f64,
    pub total_duration: f64,
}

/// Backend acknowledgement of a completion persist.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct CompletionAck {
    #[serde(default)]
    pub success: bool,
}

//
// ─── API CONTRACT ──────────────────────────────────────────────────────────────
//

/// Backend contract consumed by the progression engine.
#[async_trait]
pub trait PortalApi: Send + Sync {
    /// Fetches the unified assigned + mandatory listing for an employee.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` on transport or protocol failure.
    async fn load_trainings(&self, employee_id: &EmployeeId)
        -> Result<TrainingsPayload, ApiError>;

    /// Fetches module/video detail for one training, with per-user progress.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` on transport or protocol failure.
    async fn training_detail(
        &self,
        training_id: &TrainingId,
        user_id: &UserId,
    ) -> Result<TrainingDetail, ApiError>;

    /// Persists a video completion. Called exactly once per completion
    /// gesture; the backend is assumed idempotent for repeats.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` on transport or protocol failure.
    async fn mark_video_complete(
        &self,
        request: &CompletionRequest,
    ) -> Result<CompletionAck, ApiError>;

    /// Fetches the assessment question set for a video.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` on transport or protocol failure.
    async fn assessment(&self, video_id: &VideoId) -> Result<AssessmentSheet, ApiError>;

    /// Submits answers and returns the graded verdict.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` on transport or protocol failure.
    async fn submit_assessment(
        &self,
        video_id: &VideoId,
        answers: &[Answer],
    ) -> Result<AssessmentOutcome, ApiError>;
}

//
// ─── IN-MEMORY FAKE ────────────────────────────────────────────────────────────
//

#[derive(Default)]
struct FakeState {
    trainings: TrainingsPayload,
    details: HashMap<TrainingId, TrainingDetail>,
    assessments: HashMap<VideoId, Vec<Question>>,
    verdicts: HashMap<VideoId, VecDeque<AssessmentOutcome>>,
    completions: Vec<CompletionRequest>,
    refuse_completions: bool,
    fail_completion_transport: bool,
    fail_assessment_queries: bool,
}

/// Scriptable in-memory backend for tests and prototyping.
///
/// Records every completion request and lets tests inject backend refusals
/// and transport failures per call family.
#[derive(Clone, Default)]
pub struct InMemoryPortalApi {
    inner: Arc<Mutex<FakeState>>,
}

impl InMemoryPortalApi {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, FakeState>, ApiError> {
        self.inner
            .lock()
            .map_err(|e| ApiError::Transport(e.to_string()))
    }

    /// Scripts the listing returned by `load_trainings`.
    pub fn set_trainings(&self, payload: TrainingsPayload) {
        if let Ok(mut state) = self.inner.lock() {
            state.trainings = payload;
        }
    }

    /// Scripts the detail returned for one training.
    pub fn set_detail(&self, training_id: TrainingId, detail: TrainingDetail) {
        if let Ok(mut state) = self.inner.lock() {
            state.details.insert(training_id, detail);
        }
    }

    /// Scripts the question set for one video.
    pub fn set_assessment(&self, video_id: VideoId, questions: Vec<Question>) {
        if let Ok(mut state) = self.inner.lock() {
            state.assessments.insert(video_id, questions);
        }
    }

    /// Queues a graded verdict for the next `submit_assessment` on a video.
    pub fn push_verdict(&self, video_id: VideoId, outcome: AssessmentOutcome) {
        if let Ok(mut state) = self.inner.lock() {
            state.verdicts.entry(video_id).or_default().push_back(outcome);
        }
    }

    /// Makes `mark_video_complete` acknowledge with `success = false`.
    pub fn refuse_completions(&self, refuse: bool) {
        if let Ok(mut state) = self.inner.lock() {
            state.refuse_completions = refuse;
        }
    }

    /// Makes `mark_video_complete` fail at the transport layer.
    pub fn fail_completion_transport(&self, fail: bool) {
        if let Ok(mut state) = self.inner.lock() {
            state.fail_completion_transport = fail;
        }
    }

    /// Makes `assessment` fail at the transport layer.
    pub fn fail_assessment_queries(&self, fail: bool) {
        if let Ok(mut state) = self.inner.lock() {
            state.fail_assessment_queries = fail;
        }
    }

    /// Completion requests received so far, in arrival order.
    #[must_use]
    pub fn completions(&self) -> Vec<CompletionRequest> {
        self.inner
            .lock()
            .map(|state| state.completions.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl PortalApi for InMemoryPortalApi {
    async fn load_trainings(
        &self,
        _employee_id: &EmployeeId,
    ) -> Result<TrainingsPayload, ApiError> {
        Ok(self.lock()?.trainings.clone())
    }

    async fn training_detail(
        &self,
        training_id: &TrainingId,
        _user_id: &UserId,
    ) -> Result<TrainingDetail, ApiError> {
        self.lock()?
            .details
            .get(training_id)
            .cloned()
            .ok_or_else(|| ApiError::Rejected(format!("unknown training {training_id}")))
    }

    async fn mark_video_complete(
        &self,
        request: &CompletionRequest,
    ) -> Result<CompletionAck, ApiError> {
        let mut state = self.lock()?;
        if state.fail_completion_transport {
            return Err(ApiError::Transport("connection reset".into()));
        }
        state.completions.push(request.clone());
        Ok(CompletionAck {
            success: !state.refuse_completions,
        })
    }

    async fn assessment(&self, video_id: &VideoId) -> Result<AssessmentSheet, ApiError> {
        let state = self.lock()?;
        if state.fail_assessment_queries {
            return Err(ApiError::Transport("assessment service unreachable".into()));
        }
        Ok(AssessmentSheet {
            questions: state.assessments.get(video_id).cloned().unwrap_or_default(),
        })
    }

    async fn submit_assessment(
        &self,
        video_id: &VideoId,
        _answers: &[Answer],
    ) -> Result<AssessmentOutcome, ApiError> {
        self.lock()?
            .verdicts
            .get_mut(video_id)
            .and_then(VecDeque::pop_front)
            .ok_or_else(|| ApiError::Rejected(format!("no scripted verdict for {video_id}")))
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
