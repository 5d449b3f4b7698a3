use serde::{Deserialize, Serialize};

use crate::model::ids::QuestionId;

/// A single knowledge-check question attached to a video.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    #[serde(rename = "_id")]
    pub id: QuestionId,
    #[serde(rename = "questionText")]
    pub text: String,
    pub options: Vec<String>,
}

/// A learner's selected answer for one question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Answer {
    pub question_id: QuestionId,
    pub selected_answer: String,
}

impl Answer {
    #[must_use]
    pub fn new(question_id: QuestionId, selected_answer: impl Into<String>) -> Self {
        Self {
            question_id,
            selected_answer: selected_answer.into(),
        }
    }
}

/// Graded verdict returned by the assessment service.
///
/// The grading itself is a trust boundary: the engine consumes `passed`
/// without re-validating the score arithmetic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentOutcome {
    pub passed: bool,
    pub score: f64,
    pub correct_answers: u32,
    pub total_questions: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcome_deserializes_backend_shape() {
        let raw = r#"{"passed":false,"score":50.0,"correctAnswers":1,"totalQuestions":2}"#;
        let outcome: AssessmentOutcome = serde_json::from_str(raw).unwrap();
        assert!(!outcome.passed);
        assert_eq!(outcome.correct_answers, 1);
        assert_eq!(outcome.total_questions, 2);
    }

    #[test]
    fn answer_serializes_with_backend_field_names() {
        let answer = Answer::new(QuestionId::new("q1"), "Option B");
        let json = serde_json::to_string(&answer).unwrap();
        assert!(json.contains("\"questionId\":\"q1\""));
        assert!(json.contains("\"selectedAnswer\":\"Option B\""));
    }
}
