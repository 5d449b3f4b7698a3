//! Completion coordinator: the only component that mutates completion
//! state.
//!
//! One invocation makes exactly one backend persist call. Only a successful
//! acknowledgement mutates the in-memory holders, and only when the
//! response still refers to the currently relevant video — in-flight
//! requests are never cancelled, their effects are conditionally discarded.

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{info, warn};

use client::api::{ApiError, CompletionRequest, PortalApi};

use crate::state::Dashboard;

/// Result of a completion invocation that reached the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionOutcome {
    /// Persisted and fanned out; `holders` counts the in-memory copies that
    /// carried the video.
    Applied { holders: usize },
    /// The backend refused the persist; no holder was mutated. Retryable by
    /// re-invoking with the same arguments.
    NotPersisted,
    /// The response arrived after the viewer moved to a different video;
    /// the effect was dropped without mutating any holder.
    Superseded,
}

/// Persists completions and fans them out across the dashboard holders.
#[derive(Clone)]
pub struct CompletionCoordinator {
    api: Arc<dyn PortalApi>,
    dashboard: Arc<Mutex<Dashboard>>,
}

impl CompletionCoordinator {
    #[must_use]
    pub fn new(api: Arc<dyn PortalApi>, dashboard: Arc<Mutex<Dashboard>>) -> Self {
        Self { api, dashboard }
    }

    /// Persists one completion and, on success, applies it to every holder.
    ///
    /// Callers must not invoke twice for the same gesture: the persist is
    /// not deduplicated here. Re-invocation for an already-completed video
    /// is fine — the backend persist is idempotent and the fan-out is a
    /// no-op on already-set flags.
    ///
    /// The fan-out happens under a single lock over the dashboard, so no
    /// reader observes a partially applied completion.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` on transport failure; no holder is mutated.
    pub async fn complete(
        &self,
        request: CompletionRequest,
    ) -> Result<CompletionOutcome, ApiError> {
        let ack = self.api.mark_video_complete(&request).await?;
        if !ack.success {
            warn!(video = %request.video_id, "backend refused completion persist");
            return Ok(CompletionOutcome::NotPersisted);
        }

        let mut dashboard = self.dashboard.lock();

        // The viewer may have opened a different video while the request was
        // in flight; a superseded response must not touch the graph.
        if let Some(open) = dashboard.open_video() {
            if open.video_id != request.video_id {
                info!(
                    video = %request.video_id,
                    now_open = %open.video_id,
                    "dropping superseded completion response"
                );
                return Ok(CompletionOutcome::Superseded);
            }
        }

        let holders = dashboard.apply_completion(
            &request.training_id,
            &request.module_id,
            &request.video_id,
        );
        info!(
            video = %request.video_id,
            training = %request.training_id,
            holders,
            "completion applied"
        );
        Ok(CompletionOutcome::Applied { holders })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use client::api::InMemoryPortalApi;
    use portal_core::model::{
        default_due_date, Module, ModuleId, Training, TrainingId, TrainingKind, UserId, Video,
        VideoId, WatchSessionId,
    };

    use crate::state::OpenVideo;

    fn training(id: &str) -> Training {
        let videos = vec![Video::new(
            VideoId::new("v1"),
            ModuleId::new("m1"),
            "Video 1",
            None,
            false,
            Vec::new(),
        )];
        Training::new(
            TrainingId::new(id),
            "Training",
            TrainingKind::Assigned,
            0.0,
            default_due_date(),
            vec![Module::new(ModuleId::new("m1"), "Module 1", videos).unwrap()],
        )
        .unwrap()
    }

    fn request() -> CompletionRequest {
        CompletionRequest {
            video_id: VideoId::new("v1"),
            training_id: TrainingId::new("t1"),
            module_id: ModuleId::new("m1"),
            user_id: UserId::new("u1"),
            watch_time: 96.0,
            total_duration: 100.0,
        }
    }

    fn setup() -> (Arc<InMemoryPortalApi>, Arc<Mutex<Dashboard>>, CompletionCoordinator) {
        let api = Arc::new(InMemoryPortalApi::new());
        let dashboard = Arc::new(Mutex::new(Dashboard::new()));
        dashboard
            .lock()
            .replace_collections(vec![training("t1")], Vec::new(), 0.0);
        let coordinator = CompletionCoordinator::new(api.clone(), Arc::clone(&dashboard));
        (api, dashboard, coordinator)
    }

    fn first_video_completed(dashboard: &Arc<Mutex<Dashboard>>) -> bool {
        dashboard.lock().trainings(TrainingKind::Assigned)[0].modules()[0].videos()[0].completed()
    }

    #[tokio::test]
    async fn success_persists_once_and_fans_out() {
        let (api, dashboard, coordinator) = setup();
        let outcome = coordinator.complete(request()).await.unwrap();
        assert_eq!(outcome, CompletionOutcome::Applied { holders: 1 });
        assert!(first_video_completed(&dashboard));
        assert_eq!(api.completions().len(), 1);
    }

    #[tokio::test]
    async fn backend_refusal_leaves_holders_untouched() {
        let (api, dashboard, coordinator) = setup();
        api.refuse_completions(true);

        let outcome = coordinator.complete(request()).await.unwrap();
        assert_eq!(outcome, CompletionOutcome::NotPersisted);
        assert!(!first_video_completed(&dashboard));

        // Scenario E: the same arguments can still succeed afterwards.
        api.refuse_completions(false);
        let outcome = coordinator.complete(request()).await.unwrap();
        assert_eq!(outcome, CompletionOutcome::Applied { holders: 1 });
        assert!(first_video_completed(&dashboard));
    }

    #[tokio::test]
    async fn transport_failure_leaves_holders_untouched() {
        let (api, dashboard, coordinator) = setup();
        api.fail_completion_transport(true);

        let err = coordinator.complete(request()).await.unwrap_err();
        assert!(matches!(err, ApiError::Transport(_)));
        assert!(!first_video_completed(&dashboard));
    }

    #[tokio::test]
    async fn superseded_response_is_dropped() {
        let (api, dashboard, coordinator) = setup();
        dashboard.lock().set_open_video(OpenVideo {
            session_id: WatchSessionId::generate(),
            video_id: VideoId::new("v-other"),
            training_id: TrainingId::new("t1"),
            module_id: ModuleId::new("m1"),
        });

        let outcome = coordinator.complete(request()).await.unwrap();
        assert_eq!(outcome, CompletionOutcome::Superseded);
        assert!(!first_video_completed(&dashboard));
        // The persist itself still happened; only its local effect was
        // discarded.
        assert_eq!(api.completions().len(), 1);
    }

    #[tokio::test]
    async fn completing_twice_is_idempotent() {
        let (api, dashboard, coordinator) = setup();
        let first = coordinator.complete(request()).await.unwrap();
        let second = coordinator.complete(request()).await.unwrap();
        assert_eq!(first, CompletionOutcome::Applied { holders: 1 });
        assert_eq!(second, CompletionOutcome::Applied { holders: 1 });
        assert!(first_video_completed(&dashboard));
        assert_eq!(api.completions().len(), 2);
    }
}
