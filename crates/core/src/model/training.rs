use chrono::NaiveDate;
use thiserror::Error;
use url::Url;

use crate::model::ids::{ModuleId, QuestionId, TrainingId, VideoId};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum TrainingError {
    #[error("training name cannot be empty")]
    EmptyName,

    #[error("module name cannot be empty")]
    EmptyModuleName,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MediaRefError {
    #[error("media reference cannot be empty")]
    Empty,

    #[error("media reference is not a valid URL: {0}")]
    InvalidUrl(String),
}

//
// ─── MEDIA REFERENCE ───────────────────────────────────────────────────────────
//

/// Playable media location attached to a video.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaRef(Url);

impl MediaRef {
    /// Parses a media reference from the backend's URL string.
    ///
    /// # Errors
    ///
    /// Returns `MediaRefError` if the string is empty or not a URL.
    pub fn parse(raw: impl AsRef<str>) -> Result<Self, MediaRefError> {
        let s = raw.as_ref().trim();
        if s.is_empty() {
            return Err(MediaRefError::Empty);
        }
        let url = Url::parse(s).map_err(|_| MediaRefError::InvalidUrl(s.to_string()))?;
        Ok(Self(url))
    }

    #[must_use]
    pub fn as_url(&self) -> &Url {
        &self.0
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

//
// ─── TRAINING KIND ─────────────────────────────────────────────────────────────
//

/// Which collection a training belongs to.
///
/// Assigned trainings are picked per employee; mandatory trainings follow
/// from the employee's designation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrainingKind {
    Assigned,
    Mandatory,
}

impl TrainingKind {
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            TrainingKind::Assigned => "Assigned",
            TrainingKind::Mandatory => "Mandatory",
        }
    }
}

//
// ─── VIDEO ─────────────────────────────────────────────────────────────────────
//

/// The atomic watchable unit.
///
/// `questions` carries the ids of attached assessment questions as reported
/// by the detail payload. It is a hint only: the assessment gate re-queries
/// the assessment service before completion is allowed.
#[derive(Debug, Clone, PartialEq)]
pub struct Video {
    id: VideoId,
    module_id: ModuleId,
    title: String,
    media: Option<MediaRef>,
    completed: bool,
    questions: Vec<QuestionId>,
}

impl Video {
    #[must_use]
    pub fn new(
        id: VideoId,
        module_id: ModuleId,
        title: impl Into<String>,
        media: Option<MediaRef>,
        completed: bool,
        questions: Vec<QuestionId>,
    ) -> Self {
        Self {
            id,
            module_id,
            title: title.into(),
            media,
            completed,
            questions,
        }
    }

    #[must_use]
    pub fn id(&self) -> &VideoId {
        &self.id
    }

    /// Back-reference to the owning module; not an ownership edge.
    #[must_use]
    pub fn module_id(&self) -> &ModuleId {
        &self.module_id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn media(&self) -> Option<&MediaRef> {
        self.media.as_ref()
    }

    #[must_use]
    pub fn completed(&self) -> bool {
        self.completed
    }

    #[must_use]
    pub fn question_ids(&self) -> &[QuestionId] {
        &self.questions
    }

    /// Whether the detail payload listed assessment questions for this video.
    #[must_use]
    pub fn has_assessment_hint(&self) -> bool {
        !self.questions.is_empty()
    }

    /// Marks the video completed. Idempotent.
    ///
    /// Only the completion coordinator may call this on graph-held videos;
    /// readers never observe a partially applied completion because the
    /// coordinator holds the sole `&mut` over the graph.
    pub fn mark_completed(&mut self) {
        self.completed = true;
    }
}

//
// ─── MODULE ────────────────────────────────────────────────────────────────────
//

/// An ordered group of videos; the order defines the prerequisite chain.
#[derive(Debug, Clone, PartialEq)]
pub struct Module {
    id: ModuleId,
    name: String,
    expanded: bool,
    videos: Vec<Video>,
}

impl Module {
    /// Creates a module.
    ///
    /// # Errors
    ///
    /// Returns `TrainingError::EmptyModuleName` if the name is blank.
    pub fn new(
        id: ModuleId,
        name: impl Into<String>,
        videos: Vec<Video>,
    ) -> Result<Self, TrainingError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(TrainingError::EmptyModuleName);
        }
        Ok(Self {
            id,
            name,
            expanded: false,
            videos,
        })
    }

    #[must_use]
    pub fn id(&self) -> &ModuleId {
        &self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// UI-only expansion flag; never persisted.
    #[must_use]
    pub fn expanded(&self) -> bool {
        self.expanded
    }

    pub fn set_expanded(&mut self, expanded: bool) {
        self.expanded = expanded;
    }

    pub fn toggle_expanded(&mut self) {
        self.expanded = !self.expanded;
    }

    #[must_use]
    pub fn videos(&self) -> &[Video] {
        &self.videos
    }

    /// Position of a video within the prerequisite chain.
    #[must_use]
    pub fn position_of(&self, video_id: &VideoId) -> Option<usize> {
        self.videos.iter().position(|v| v.id() == video_id)
    }

    #[must_use]
    pub fn video(&self, video_id: &VideoId) -> Option<&Video> {
        self.videos.iter().find(|v| v.id() == video_id)
    }

    pub(crate) fn video_mut(&mut self, video_id: &VideoId) -> Option<&mut Video> {
        self.videos.iter_mut().find(|v| v.id() == video_id)
    }

    /// Derived completion: true iff the module owns at least one video and
    /// every owned video is completed. An empty module never reports
    /// completed, which keeps the module-level gate fail-closed.
    #[must_use]
    pub fn completed(&self) -> bool {
        !self.videos.is_empty() && self.videos.iter().all(Video::completed)
    }
}

//
// ─── TRAINING ──────────────────────────────────────────────────────────────────
//

/// Due date applied when the backend omits one.
#[must_use]
pub fn default_due_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 9, 29).unwrap_or_default()
}

/// A named curriculum item assigned to a learner.
///
/// Created by the session loader from a backend response; mutated only by
/// the completion coordinator; discarded on tab switch or logout.
#[derive(Debug, Clone, PartialEq)]
pub struct Training {
    id: TrainingId,
    name: String,
    kind: TrainingKind,
    completion_percent: f64,
    due_date: NaiveDate,
    modules: Vec<Module>,
}

impl Training {
    /// Creates a training.
    ///
    /// # Errors
    ///
    /// Returns `TrainingError::EmptyName` if the name is blank.
    pub fn new(
        id: TrainingId,
        name: impl Into<String>,
        kind: TrainingKind,
        completion_percent: f64,
        due_date: NaiveDate,
        modules: Vec<Module>,
    ) -> Result<Self, TrainingError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(TrainingError::EmptyName);
        }
        Ok(Self {
            id,
            name,
            kind,
            completion_percent,
            due_date,
            modules,
        })
    }

    #[must_use]
    pub fn id(&self) -> &TrainingId {
        &self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn kind(&self) -> TrainingKind {
        self.kind
    }

    /// Aggregate completion as last reported by the backend.
    ///
    /// Never recomputed locally from module/video state.
    #[must_use]
    pub fn completion_percent(&self) -> f64 {
        self.completion_percent
    }

    #[must_use]
    pub fn due_date(&self) -> NaiveDate {
        self.due_date
    }

    /// Whether the training is past due and not yet fully completed,
    /// judged against the backend-reported aggregate.
    #[must_use]
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        self.completion_percent < 100.0 && today > self.due_date
    }

    #[must_use]
    pub fn modules(&self) -> &[Module] {
        &self.modules
    }

    #[must_use]
    pub fn module(&self, module_id: &ModuleId) -> Option<&Module> {
        self.modules.iter().find(|m| m.id() == module_id)
    }

    pub fn module_mut(&mut self, module_id: &ModuleId) -> Option<&mut Module> {
        self.modules.iter_mut().find(|m| m.id() == module_id)
    }

    /// The module that owns the given video, located by scanning the graph.
    #[must_use]
    pub fn module_containing(&self, video_id: &VideoId) -> Option<&Module> {
        self.modules.iter().find(|m| m.video(video_id).is_some())
    }

    /// The module preceding `index` in the prerequisite chain, if any.
    #[must_use]
    pub fn preceding_module(&self, index: usize) -> Option<&Module> {
        index.checked_sub(1).and_then(|i| self.modules.get(i))
    }

    /// Replaces the module list, e.g. when the detail payload arrives.
    pub fn set_modules(&mut self, modules: Vec<Module>) {
        self.modules = modules;
    }

    /// Marks every module expanded, so nested videos render without further
    /// user action when a detail view first opens.
    pub fn expand_all_modules(&mut self) {
        for module in &mut self.modules {
            module.set_expanded(true);
        }
    }

    /// Sets `completed` on the matching video. Returns whether a matching
    /// video exists in this training; marking an already-completed video is
    /// a no-op that still reports `true`.
    pub fn mark_video_completed(&mut self, module_id: &ModuleId, video_id: &VideoId) -> bool {
        let Some(module) = self.modules.iter_mut().find(|m| m.id() == module_id) else {
            return false;
        };
        match module.video_mut(video_id) {
            Some(video) => {
                video.mark_completed();
                true
            }
            None => false,
        }
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;

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

    fn module(id: &str, videos: Vec<Video>) -> Module {
        Module::new(ModuleId::new(id), format!("Module {id}"), videos).unwrap()
    }

    #[test]
    fn training_rejects_blank_name() {
        let err = Training::new(
            TrainingId::new("t1"),
            "  ",
            TrainingKind::Assigned,
            0.0,
            default_due_date(),
            Vec::new(),
        )
        .unwrap_err();
        assert_eq!(err, TrainingError::EmptyName);
    }

    #[test]
    fn empty_module_is_never_completed() {
        let m = module("m1", Vec::new());
        assert!(!m.completed());
    }

    #[test]
    fn module_completed_requires_all_videos() {
        let m = module("m1", vec![video("v1", "m1", true), video("v2", "m1", false)]);
        assert!(!m.completed());

        let m = module("m1", vec![video("v1", "m1", true), video("v2", "m1", true)]);
        assert!(m.completed());
    }

    #[test]
    fn mark_video_completed_is_idempotent() {
        let mut training = Training::new(
            TrainingId::new("t1"),
            "Onboarding",
            TrainingKind::Assigned,
            0.0,
            default_due_date(),
            vec![module("m1", vec![video("v1", "m1", false)])],
        )
        .unwrap();

        assert!(training.mark_video_completed(&ModuleId::new("m1"), &VideoId::new("v1")));
        assert!(training.mark_video_completed(&ModuleId::new("m1"), &VideoId::new("v1")));
        assert!(training.modules()[0].videos()[0].completed());
    }

    #[test]
    fn mark_video_completed_ignores_unknown_ids() {
        let mut training = Training::new(
            TrainingId::new("t1"),
            "Onboarding",
            TrainingKind::Mandatory,
            0.0,
            default_due_date(),
            vec![module("m1", vec![video("v1", "m1", false)])],
        )
        .unwrap();

        assert!(!training.mark_video_completed(&ModuleId::new("m2"), &VideoId::new("v1")));
        assert!(!training.mark_video_completed(&ModuleId::new("m1"), &VideoId::new("v9")));
        assert!(!training.modules()[0].videos()[0].completed());
    }

    #[test]
    fn module_containing_scans_all_modules() {
        let training = Training::new(
            TrainingId::new("t1"),
            "Onboarding",
            TrainingKind::Assigned,
            0.0,
            default_due_date(),
            vec![
                module("m1", vec![video("v1", "m1", false)]),
                module("m2", vec![video("v2", "m2", false)]),
            ],
        )
        .unwrap();

        let owner = training.module_containing(&VideoId::new("v2")).unwrap();
        assert_eq!(owner.id(), &ModuleId::new("m2"));
        assert!(training.module_containing(&VideoId::new("v9")).is_none());
    }

    #[test]
    fn expand_all_modules_sets_every_flag() {
        let mut training = Training::new(
            TrainingId::new("t1"),
            "Onboarding",
            TrainingKind::Assigned,
            0.0,
            default_due_date(),
            vec![module("m1", Vec::new()), module("m2", Vec::new())],
        )
        .unwrap();

        training.expand_all_modules();
        assert!(training.modules().iter().all(Module::expanded));
    }

    #[test]
    fn overdue_depends_on_date_and_aggregate() {
        let training = Training::new(
            TrainingId::new("t1"),
            "Onboarding",
            TrainingKind::Assigned,
            40.0,
            default_due_date(),
            Vec::new(),
        )
        .unwrap();

        let before = default_due_date().pred_opt().unwrap();
        let after = default_due_date().succ_opt().unwrap();
        assert!(!training.is_overdue(before));
        assert!(!training.is_overdue(default_due_date()));
        assert!(training.is_overdue(after));

        let finished = Training::new(
            TrainingId::new("t2"),
            "Finished",
            TrainingKind::Assigned,
            100.0,
            default_due_date(),
            Vec::new(),
        )
        .unwrap();
        assert!(!finished.is_overdue(after));
    }

    #[test]
    fn media_ref_rejects_garbage() {
        assert!(matches!(MediaRef::parse(""), Err(MediaRefError::Empty)));
        assert!(matches!(
            MediaRef::parse("not a url"),
            Err(MediaRefError::InvalidUrl(_))
        ));
        let ok = MediaRef::parse("https://www.youtube.com/embed/dQw4w9WgXcQ").unwrap();
        assert_eq!(ok.as_url().scheme(), "https");
    }
}
