//! Assessment gate.
//!
//! Consulted only after the progression gate and watch tracker both permit
//! completion. The gate decides whether a knowledge check stands between
//! the learner and the completion call; grading itself is the assessment
//! service's job and its verdict is consumed untouched.

use std::sync::Arc;

use tracing::{debug, warn};

use client::api::{ApiError, PortalApi};
use portal_core::model::{Answer, AssessmentOutcome, Question, VideoId};

use crate::error::EngineError;

/// Gate verdict for a completion attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    /// No questions attached; completion may proceed directly.
    ProceedDirectly,
    /// Questions exist; completion must wait for a passing submission.
    RequireAssessment(Vec<Question>),
}

/// What to do when the assessment lookup itself fails.
///
/// The observed product behavior treats a failed lookup as "no assessment"
/// and lets completion proceed — at the risk of silently skipping a real
/// assessment during a transient outage. Deployments that prefer the strict
/// reading can block instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QueryFailurePolicy {
    #[default]
    ProceedWithoutAssessment,
    Block,
}

/// Decides whether a video's completion is gated on a knowledge check.
#[derive(Clone)]
pub struct AssessmentGate {
    api: Arc<dyn PortalApi>,
    policy: QueryFailurePolicy,
}

impl AssessmentGate {
    #[must_use]
    pub fn new(api: Arc<dyn PortalApi>) -> Self {
        Self {
            api,
            policy: QueryFailurePolicy::default(),
        }
    }

    #[must_use]
    pub fn with_policy(mut self, policy: QueryFailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    #[must_use]
    pub fn policy(&self) -> QueryFailurePolicy {
        self.policy
    }

    /// Queries the question set for a video and gates accordingly.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::AssessmentUnavailable` only when the lookup
    /// fails and the policy is [`QueryFailurePolicy::Block`].
    pub async fn check_and_gate(&self, video_id: &VideoId) -> Result<Decision, EngineError> {
        match self.api.assessment(video_id).await {
            Ok(sheet) if sheet.questions.is_empty() => {
                debug!(%video_id, "no assessment attached, proceeding directly");
                Ok(Decision::ProceedDirectly)
            }
            Ok(sheet) => {
                debug!(%video_id, count = sheet.questions.len(), "assessment required");
                Ok(Decision::RequireAssessment(sheet.questions))
            }
            Err(err) => match self.policy {
                QueryFailurePolicy::ProceedWithoutAssessment => {
                    warn!(%video_id, %err, "assessment lookup failed, proceeding without assessment");
                    Ok(Decision::ProceedDirectly)
                }
                QueryFailurePolicy::Block => Err(EngineError::AssessmentUnavailable(err)),
            },
        }
    }

    /// Submits answers for grading. Unlimited resubmission is allowed; a
    /// failing verdict is a decision for the caller, not an error.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` on transport or protocol failure.
    pub async fn submit(
        &self,
        video_id: &VideoId,
        answers: &[Answer],
    ) -> Result<AssessmentOutcome, ApiError> {
        let outcome = self.api.submit_assessment(video_id, answers).await?;
        debug!(
            %video_id,
            passed = outcome.passed,
            score = outcome.score,
            "assessment graded"
        );
        Ok(outcome)
    }
}
