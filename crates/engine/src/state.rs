//! In-memory dashboard state: the three holders of training data.
//!
//! The rendered list views and the open detail view share this graph. The
//! completion coordinator is the sole writer of completion flags; everything
//! else only creates, replaces, or reads. Readers must tolerate the graph
//! changing between reads — there is no snapshot isolation.

use portal_core::model::{
    ModuleId, Training, TrainingId, TrainingKind, VideoId, WatchSessionId,
};
use portal_core::progression;

/// Marker for the video currently open in the viewer.
///
/// Carries the ids a completion request needs plus the session id used to
/// match slow responses against the session that issued them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenVideo {
    pub session_id: WatchSessionId,
    pub video_id: VideoId,
    pub training_id: TrainingId,
    pub module_id: ModuleId,
}

/// The three in-memory holders plus viewer bookkeeping.
#[derive(Debug)]
pub struct Dashboard {
    assigned: Vec<Training>,
    mandatory: Vec<Training>,
    overall_completion: f64,
    active_tab: TrainingKind,
    open_detail: Option<Training>,
    open_video: Option<OpenVideo>,
}

impl Default for Dashboard {
    fn default() -> Self {
        Self::new()
    }
}

impl Dashboard {
    #[must_use]
    pub fn new() -> Self {
        Self {
            assigned: Vec::new(),
            mandatory: Vec::new(),
            overall_completion: 0.0,
            active_tab: TrainingKind::Assigned,
            open_detail: None,
            open_video: None,
        }
    }

    /// Installs freshly loaded collections, discarding any open detail or
    /// viewer state that referred to the previous graph.
    pub fn replace_collections(
        &mut self,
        assigned: Vec<Training>,
        mandatory: Vec<Training>,
        overall_completion: f64,
    ) {
        self.assigned = assigned;
        self.mandatory = mandatory;
        self.overall_completion = overall_completion;
        self.open_detail = None;
        self.open_video = None;
    }

    #[must_use]
    pub fn active_tab(&self) -> TrainingKind {
        self.active_tab
    }

    /// Switches tab and closes the open detail, matching viewer behavior.
    pub fn switch_tab(&mut self, tab: TrainingKind) {
        self.active_tab = tab;
        self.open_detail = None;
    }

    #[must_use]
    pub fn trainings(&self, kind: TrainingKind) -> &[Training] {
        match kind {
            TrainingKind::Assigned => &self.assigned,
            TrainingKind::Mandatory => &self.mandatory,
        }
    }

    #[must_use]
    pub fn active_trainings(&self) -> &[Training] {
        self.trainings(self.active_tab())
    }

    #[must_use]
    pub fn overall_completion(&self) -> f64 {
        self.overall_completion
    }

    /// Finds a training summary by id, searching assigned then mandatory.
    #[must_use]
    pub fn training_summary(&self, training_id: &TrainingId) -> Option<&Training> {
        self.assigned
            .iter()
            .chain(self.mandatory.iter())
            .find(|t| t.id() == training_id)
    }

    #[must_use]
    pub fn open_detail(&self) -> Option<&Training> {
        self.open_detail.as_ref()
    }

    pub fn set_open_detail(&mut self, training: Training) {
        self.open_detail = Some(training);
    }

    pub fn close_detail(&mut self) {
        self.open_detail = None;
    }

    /// Toggles a module's expansion flag on the open detail view.
    ///
    /// Locked modules do not toggle; returns whether a toggle happened.
    pub fn toggle_module_expansion(&mut self, module_id: &ModuleId) -> bool {
        let Some(detail) = self.open_detail.as_mut() else {
            return false;
        };
        let Some(index) = detail.modules().iter().position(|m| m.id() == module_id) else {
            return false;
        };
        let unlocked = progression::can_watch_module(index, detail.preceding_module(index));
        if !unlocked {
            return false;
        }
        if let Some(module) = detail.module_mut(module_id) {
            module.toggle_expanded();
            return true;
        }
        false
    }

    #[must_use]
    pub fn open_video(&self) -> Option<&OpenVideo> {
        self.open_video.as_ref()
    }

    pub fn set_open_video(&mut self, open: OpenVideo) {
        self.open_video = Some(open);
    }

    pub fn clear_open_video(&mut self) {
        self.open_video = None;
    }

    /// Fans a confirmed completion out to every holder that carries a copy
    /// of the training: the open detail view, the assigned list, and the
    /// mandatory list, in that fixed order. Absence in a holder is a no-op
    /// for that holder. Returns the number of holders that carried the
    /// video.
    ///
    /// Restricted to the crate so the completion coordinator stays the sole
    /// writer of completion flags.
    pub(crate) fn apply_completion(
        &mut self,
        training_id: &TrainingId,
        module_id: &ModuleId,
        video_id: &VideoId,
    ) -> usize {
        let mut holders = 0;

        if let Some(detail) = self.open_detail.as_mut() {
            if detail.id() == training_id && detail.mark_video_completed(module_id, video_id) {
                holders += 1;
            }
        }
        for training in self.assigned.iter_mut().filter(|t| t.id() == training_id) {
            if training.mark_video_completed(module_id, video_id) {
                holders += 1;
            }
        }
        for training in self.mandatory.iter_mut().filter(|t| t.id() == training_id) {
            if training.mark_video_completed(module_id, video_id) {
                holders += 1;
            }
        }

        holders
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use portal_core::model::{default_due_date, Module, Video};

    fn video(id: &str, module: &str, completed: bool) -> Video {
        Video::new(
            VideoId::new(id),
            ModuleId::new(module),
            format!("Video {id}"),
            None,
            completed,
            Vec::new(),
        )
    }

    fn training(id: &str, kind: TrainingKind) -> Training {
        let module = Module::new(
            ModuleId::new("m1"),
            "Module 1",
            vec![video("v1", "m1", false), video("v2", "m1", false)],
        )
        .unwrap();
        Training::new(
            TrainingId::new(id),
            format!("Training {id}"),
            kind,
            0.0,
            default_due_date(),
            vec![module],
        )
        .unwrap()
    }

    fn completed_in(training: &Training, video: &str) -> bool {
        training.modules()[0]
            .video(&VideoId::new(video))
            .is_some_and(Video::completed)
    }

    #[test]
    fn fan_out_updates_every_holder_carrying_the_training() {
        let mut dashboard = Dashboard::new();
        dashboard.replace_collections(
            vec![training("t1", TrainingKind::Assigned)],
            vec![training("t1", TrainingKind::Mandatory)],
            0.0,
        );
        dashboard.set_open_detail(training("t1", TrainingKind::Assigned));

        let holders = dashboard.apply_completion(
            &TrainingId::new("t1"),
            &ModuleId::new("m1"),
            &VideoId::new("v1"),
        );

        assert_eq!(holders, 3);
        assert!(completed_in(dashboard.open_detail().unwrap(), "v1"));
        assert!(completed_in(&dashboard.trainings(TrainingKind::Assigned)[0], "v1"));
        assert!(completed_in(&dashboard.trainings(TrainingKind::Mandatory)[0], "v1"));
        // Sibling videos are untouched.
        assert!(!completed_in(dashboard.open_detail().unwrap(), "v2"));
    }

    #[test]
    fn fan_out_skips_holders_without_the_training() {
        let mut dashboard = Dashboard::new();
        dashboard.replace_collections(vec![training("t1", TrainingKind::Assigned)], Vec::new(), 0.0);

        let holders = dashboard.apply_completion(
            &TrainingId::new("t2"),
            &ModuleId::new("m1"),
            &VideoId::new("v1"),
        );
        assert_eq!(holders, 0);
        assert!(!completed_in(&dashboard.trainings(TrainingKind::Assigned)[0], "v1"));
    }

    #[test]
    fn switching_tab_closes_the_detail() {
        let mut dashboard = Dashboard::new();
        dashboard.set_open_detail(training("t1", TrainingKind::Assigned));
        dashboard.switch_tab(TrainingKind::Mandatory);
        assert!(dashboard.open_detail().is_none());
        assert_eq!(dashboard.active_tab(), TrainingKind::Mandatory);
    }

    #[test]
    fn locked_module_does_not_toggle() {
        let first = Module::new(
            ModuleId::new("m1"),
            "Module 1",
            vec![video("v1", "m1", false)],
        )
        .unwrap();
        let second = Module::new(
            ModuleId::new("m2"),
            "Module 2",
            vec![video("v2", "m2", false)],
        )
        .unwrap();
        let detail = Training::new(
            TrainingId::new("t1"),
            "Training",
            TrainingKind::Assigned,
            0.0,
            default_due_date(),
            vec![first, second],
        )
        .unwrap();

        let mut dashboard = Dashboard::new();
        dashboard.set_open_detail(detail);

        assert!(dashboard.toggle_module_expansion(&ModuleId::new("m1")));
        assert!(!dashboard.toggle_module_expansion(&ModuleId::new("m2")));
    }

    #[test]
    fn replacing_collections_discards_viewer_state() {
        let mut dashboard = Dashboard::new();
        dashboard.set_open_detail(training("t1", TrainingKind::Assigned));
        dashboard.set_open_video(OpenVideo {
            session_id: WatchSessionId::generate(),
            video_id: VideoId::new("v1"),
            training_id: TrainingId::new("t1"),
            module_id: ModuleId::new("m1"),
        });

        dashboard.replace_collections(Vec::new(), Vec::new(), 12.5);

        assert!(dashboard.open_detail().is_none());
        assert!(dashboard.open_video().is_none());
        assert_eq!(dashboard.overall_completion(), 12.5);
    }
}
