//! Engine facade for the surrounding UI layer.
//!
//! Assembles the loader, gates, tracker, and coordinator over one shared
//! dashboard, and exposes the four engine operations. Expected-domain
//! outcomes (ineligibility, unwatched video, failed assessment) come back
//! as decision values; only collaborator failures surface as errors.

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;

use client::api::{CompletionRequest, PortalApi};
use client::playback::{EmbedOptions, PlaybackProvider};
use client::session_store::SessionStore;
use portal_core::model::{
    Answer, AssessmentOutcome, Identity, ModuleId, Question, TrainingId, TrainingKind, Video,
    VideoId, WatchSessionId,
};
use portal_core::progression;
use portal_core::watch::{PlayerEvent, WatchSession};

use crate::assessment::{AssessmentGate, Decision, QueryFailurePolicy};
use crate::coordinator::{CompletionCoordinator, CompletionOutcome};
use crate::error::{EngineError, LoadError};
use crate::loader::TrainingSessionLoader;
use crate::state::{Dashboard, OpenVideo};
use crate::watch_tracker::WatchTracker;

/// DOM container the player is embedded into.
const PLAYER_CONTAINER_ID: &str = "portal-player";

/// Per-video action eligibility, consulted on every render pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EligibleActions {
    pub completed: bool,
    pub can_watch: bool,
    pub can_mark_complete: bool,
}

/// Result of asking to open a video.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchDecision {
    Opened { session_id: WatchSessionId },
    /// Prerequisite chain not satisfied yet.
    Locked,
    /// No training detail is open.
    NoOpenTraining,
    /// The video id is not part of the open training.
    UnknownVideo,
    /// The video has no playable media reference.
    MissingMedia,
}

/// Result of a completion attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum CompletionDecision {
    Completed,
    /// A knowledge check gates this video; submit answers to proceed.
    AssessmentRequired(Vec<Question>),
    NotWatched,
    NoOpenSession,
    Ineligible,
    PersistFailed,
    Superseded,
}

/// Result of submitting assessment answers.
#[derive(Debug, Clone, PartialEq)]
pub enum AssessmentDecision {
    /// Failed the check; resubmission is allowed without limit.
    Failed(AssessmentOutcome),
    /// Passed; `completion` reports what happened to the follow-on persist.
    Passed {
        outcome: AssessmentOutcome,
        completion: CompletionDecision,
    },
}

/// The assembled progression engine.
pub struct PortalEngine {
    identity: Identity,
    provider: Arc<dyn PlaybackProvider>,
    dashboard: Arc<Mutex<Dashboard>>,
    loader: TrainingSessionLoader,
    assessment: AssessmentGate,
    coordinator: CompletionCoordinator,
    tracker: Mutex<Option<WatchTracker>>,
}

impl PortalEngine {
    #[must_use]
    pub fn new(
        api: Arc<dyn PortalApi>,
        provider: Arc<dyn PlaybackProvider>,
        identity: Identity,
    ) -> Self {
        let dashboard = Arc::new(Mutex::new(Dashboard::new()));
        Self {
            identity,
            provider,
            loader: TrainingSessionLoader::new(Arc::clone(&api)),
            assessment: AssessmentGate::new(Arc::clone(&api)),
            coordinator: CompletionCoordinator::new(api, Arc::clone(&dashboard)),
            dashboard,
            tracker: Mutex::new(None),
        }
    }

    /// Builds the engine with the identity resolved from the session store.
    ///
    /// # Errors
    ///
    /// Returns `LoadError::MissingIdentity` if the store holds no usable
    /// identity.
    pub fn from_session(
        api: Arc<dyn PortalApi>,
        provider: Arc<dyn PlaybackProvider>,
        store: &dyn SessionStore,
    ) -> Result<Self, LoadError> {
        let identity = TrainingSessionLoader::resolve_identity(store)?;
        Ok(Self::new(api, provider, identity))
    }

    #[must_use]
    pub fn with_assessment_policy(mut self, policy: QueryFailurePolicy) -> Self {
        self.assessment = self.assessment.with_policy(policy);
        self
    }

    #[must_use]
    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    /// Shared dashboard state. Render paths read through this handle and
    /// must tolerate the graph changing between reads.
    #[must_use]
    pub fn dashboard(&self) -> Arc<Mutex<Dashboard>> {
        Arc::clone(&self.dashboard)
    }

    /// Reloads the training collections from the backend.
    ///
    /// Any open detail or watch session refers to the discarded graph and
    /// is torn down. On failure no state is mutated and the call can simply
    /// be retried.
    ///
    /// # Errors
    ///
    /// Returns `LoadError` on transport or payload failure.
    pub async fn refresh(&self) -> Result<(), LoadError> {
        let graph = self.loader.load(&self.identity.employee_id).await?;
        self.tracker.lock().take();
        self.dashboard.lock().replace_collections(
            graph.assigned,
            graph.mandatory,
            graph.overall_completion,
        );
        Ok(())
    }

    pub fn switch_tab(&self, tab: TrainingKind) {
        self.dashboard.lock().switch_tab(tab);
    }

    /// Fetches detail for a listed training and opens it. Returns `false`
    /// if the id is not in either collection.
    ///
    /// # Errors
    ///
    /// Returns `LoadError` on transport or payload failure.
    pub async fn open_training(&self, training_id: &TrainingId) -> Result<bool, LoadError> {
        let summary = {
            let dashboard = self.dashboard.lock();
            dashboard.training_summary(training_id).cloned()
        };
        let Some(summary) = summary else {
            debug!(%training_id, "training not present in either collection");
            return Ok(false);
        };

        let detail = self
            .loader
            .open_detail(&summary, &self.identity.user_id)
            .await?;
        self.dashboard.lock().set_open_detail(detail);
        Ok(true)
    }

    pub fn toggle_module(&self, module_id: &ModuleId) -> bool {
        self.dashboard.lock().toggle_module_expansion(module_id)
    }

    /// Eligibility of the watch/complete actions for a video, evaluated
    /// against the open detail view.
    #[must_use]
    pub fn list_eligible_actions(&self, video_id: &VideoId) -> EligibleActions {
        let dashboard = self.dashboard.lock();
        let module = dashboard
            .open_detail()
            .and_then(|detail| detail.module_containing(video_id));
        let completed = module
            .and_then(|m| m.video(video_id))
            .is_some_and(Video::completed);

        EligibleActions {
            completed,
            can_watch: progression::can_watch(video_id, module),
            can_mark_complete: progression::can_mark_complete(video_id, module),
        }
    }

    /// Opens a watch session for a video of the open training.
    ///
    /// Replaces any previous session: its sampler and timeout are torn down
    /// before the new one starts, so stale samples cannot leak across.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::Playback` if the provider cannot embed the
    /// media.
    pub fn open_watch_session(&self, video_id: &VideoId) -> Result<WatchDecision, EngineError> {
        let (video, training_id) = {
            let dashboard = self.dashboard.lock();
            let Some(detail) = dashboard.open_detail() else {
                return Ok(WatchDecision::NoOpenTraining);
            };
            let module = detail.module_containing(video_id);
            if !progression::can_watch(video_id, module) {
                debug!(%video_id, "video is locked behind its predecessor");
                return Ok(WatchDecision::Locked);
            }
            let Some(video) = module.and_then(|m| m.video(video_id)) else {
                return Ok(WatchDecision::UnknownVideo);
            };
            (video.clone(), detail.id().clone())
        };

        let Some(media) = video.media() else {
            return Ok(WatchDecision::MissingMedia);
        };
        let handle = self
            .provider
            .embed(media, PLAYER_CONTAINER_ID, &EmbedOptions::default())?;

        let tracker = WatchTracker::bind(video_id.clone(), handle);
        let session_id = tracker.session_id();

        // Install the new tracker first; dropping the old one aborts its
        // sampler before the dashboard points at the new session.
        *self.tracker.lock() = Some(tracker);
        self.dashboard.lock().set_open_video(OpenVideo {
            session_id,
            video_id: video_id.clone(),
            training_id,
            module_id: video.module_id().clone(),
        });

        Ok(WatchDecision::Opened { session_id })
    }

    /// Forwards a playback provider event into the open session, if any.
    pub fn handle_player_event(&self, event: PlayerEvent) {
        if let Some(tracker) = self.tracker.lock().as_ref() {
            tracker.handle_event(event);
        }
    }

    /// A copy of the open watch session, if any.
    #[must_use]
    pub fn watch_session(&self) -> Option<WatchSession> {
        self.tracker.lock().as_ref().map(WatchTracker::snapshot)
    }

    /// Closes the open watch session and tears down its timers.
    pub fn close_watch_session(&self) {
        self.tracker.lock().take();
        self.dashboard.lock().clear_open_video();
    }

    /// Attempts to complete the currently open video.
    ///
    /// Checks, in order: an open session for this video, the watched flag,
    /// the prerequisite chain, then the assessment gate. Only when all of
    /// them clear does the coordinator persist and fan out.
    ///
    /// # Errors
    ///
    /// Returns `EngineError` on transport failure or, under the blocking
    /// policy, an unavailable assessment service.
    pub async fn attempt_completion(
        &self,
        video_id: &VideoId,
    ) -> Result<CompletionDecision, EngineError> {
        let Some(session) = self
            .tracker
            .lock()
            .as_ref()
            .filter(|t| t.video_id() == video_id)
            .map(WatchTracker::snapshot)
        else {
            return Ok(CompletionDecision::NoOpenSession);
        };
        if !session.watched() {
            debug!(%video_id, elapsed = session.elapsed(), "completion attempted before threshold");
            return Ok(CompletionDecision::NotWatched);
        }

        let Some(request) = self.build_request(video_id, &session) else {
            return Ok(CompletionDecision::NoOpenSession);
        };
        if !self.prerequisite_cleared(video_id) {
            return Ok(CompletionDecision::Ineligible);
        }

        match self.assessment.check_and_gate(video_id).await? {
            Decision::RequireAssessment(questions) => {
                Ok(CompletionDecision::AssessmentRequired(questions))
            }
            Decision::ProceedDirectly => self.finish_completion(request).await,
        }
    }

    /// Submits assessment answers; a passing verdict triggers the same
    /// persist and fan-out as an assessment-free completion.
    ///
    /// # Errors
    ///
    /// Returns `EngineError` on transport failure.
    pub async fn submit_assessment_answers(
        &self,
        video_id: &VideoId,
        answers: &[Answer],
    ) -> Result<AssessmentDecision, EngineError> {
        let outcome = self.assessment.submit(video_id, answers).await?;
        if !outcome.passed {
            return Ok(AssessmentDecision::Failed(outcome));
        }

        // The verdict is trusted as-is; rebuild the request from whatever
        // session is still open for this video.
        let session = self
            .tracker
            .lock()
            .as_ref()
            .filter(|t| t.video_id() == video_id)
            .map(WatchTracker::snapshot);
        let completion = match session.and_then(|s| self.build_request(video_id, &s)) {
            Some(request) => self.finish_completion(request).await?,
            None => CompletionDecision::NoOpenSession,
        };

        Ok(AssessmentDecision::Passed {
            outcome,
            completion,
        })
    }

    fn prerequisite_cleared(&self, video_id: &VideoId) -> bool {
        let dashboard = self.dashboard.lock();
        let module = dashboard
            .open_detail()
            .and_then(|detail| detail.module_containing(video_id));
        progression::can_mark_complete(video_id, module)
    }

    fn build_request(&self, video_id: &VideoId, session: &WatchSession) -> Option<CompletionRequest> {
        let dashboard = self.dashboard.lock();
        let open = dashboard.open_video().filter(|o| &o.video_id == video_id)?;
        Some(CompletionRequest {
            video_id: video_id.clone(),
            training_id: open.training_id.clone(),
            module_id: open.module_id.clone(),
            user_id: self.identity.user_id.clone(),
            watch_time: session.elapsed(),
            total_duration: session.duration(),
        })
    }

    async fn finish_completion(
        &self,
        request: CompletionRequest,
    ) -> Result<CompletionDecision, EngineError> {
        match self.coordinator.complete(request).await? {
            CompletionOutcome::Applied { .. } => {
                // The gesture is finished; tear the session down so the next
                // open starts clean.
                self.close_watch_session();
                Ok(CompletionDecision::Completed)
            }
            CompletionOutcome::NotPersisted => Ok(CompletionDecision::PersistFailed),
            CompletionOutcome::Superseded => Ok(CompletionDecision::Superseded),
        }
    }
}
