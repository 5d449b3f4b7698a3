mod assessment;
mod identity;
mod ids;
pub mod training;

pub use ids::{
    EmployeeId, ModuleId, ParseIdError, QuestionId, TrainingId, UserId, VideoId, WatchSessionId,
};

pub use assessment::{Answer, AssessmentOutcome, Question};
pub use identity::Identity;
pub use training::{
    default_due_date, MediaRef, MediaRefError, Module, Training, TrainingError, TrainingKind, Video,
};
