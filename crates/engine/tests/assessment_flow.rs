//! Assessment-gated completion flows.

use std::sync::Arc;

use client::api::{InMemoryPortalApi, ModuleDto, TrainingDetail, TrainingDto, TrainingsPayload, VideoDto};
use client::playback::{ScriptedHandle, ScriptedProvider};
use engine::{AssessmentDecision, CompletionDecision, PortalEngine, QueryFailurePolicy, WatchDecision};
use portal_core::model::{
    Answer, AssessmentOutcome, EmployeeId, Identity, ModuleId, Question, QuestionId, TrainingId,
    TrainingKind, UserId, VideoId,
};
use portal_core::watch::PlayerEvent;

fn identity() -> Identity {
    Identity::new(EmployeeId::new("Emp257"), UserId::new("u-1"))
}

fn question(id: &str) -> Question {
    Question {
        id: QuestionId::new(id),
        text: format!("Question {id}?"),
        options: vec!["A".into(), "B".into(), "C".into()],
    }
}

fn outcome(passed: bool) -> AssessmentOutcome {
    AssessmentOutcome {
        passed,
        score: if passed { 100.0 } else { 50.0 },
        correct_answers: if passed { 2 } else { 1 },
        total_questions: 2,
    }
}

fn answers() -> Vec<Answer> {
    vec![
        Answer::new(QuestionId::new("q1"), "A"),
        Answer::new(QuestionId::new("q2"), "B"),
    ]
}

async fn open_engine_with_assessment(
    policy: Option<QueryFailurePolicy>,
) -> (Arc<InMemoryPortalApi>, PortalEngine) {
    let api = Arc::new(InMemoryPortalApi::new());
    api.set_trainings(TrainingsPayload {
        assigned_trainings: vec![TrainingDto {
            training_id: TrainingId::new("t1"),
            name: "Training t1".into(),
            completion_percentage: 0.0,
            due_date: None,
            modules: Vec::new(),
        }],
        mandatory_trainings: Vec::new(),
        user_overall_completion_percentage: 0.0,
        user_role: None,
    });
    api.set_detail(
        TrainingId::new("t1"),
        TrainingDetail {
            modules: vec![ModuleDto {
                id: ModuleId::new("m1"),
                name: "Module 1".into(),
                videos: vec![VideoDto {
                    id: VideoId::new("v1"),
                    title: "Video v1".into(),
                    video_url: Some("https://www.youtube.com/embed/dQw4w9WgXcQ".into()),
                    original_url: None,
                    completed: false,
                    questions: Vec::new(),
                }],
            }],
        },
    );
    api.set_assessment(VideoId::new("v1"), vec![question("q1"), question("q2")]);

    let provider = Arc::new(ScriptedProvider::new(ScriptedHandle::new(100.0)));
    let mut engine = PortalEngine::new(api.clone(), provider, identity());
    if let Some(policy) = policy {
        engine = engine.with_assessment_policy(policy);
    }

    engine.refresh().await.unwrap();
    assert!(engine.open_training(&TrainingId::new("t1")).await.unwrap());

    let decision = engine.open_watch_session(&VideoId::new("v1")).unwrap();
    assert!(matches!(decision, WatchDecision::Opened { .. }));
    engine.handle_player_event(PlayerEvent::Ready { duration: 100.0 });
    engine.handle_player_event(PlayerEvent::Playing);
    engine.handle_player_event(PlayerEvent::Ended);

    (api, engine)
}

fn assigned_video_completed(engine: &PortalEngine) -> bool {
    let dashboard = engine.dashboard();
    let dashboard = dashboard.lock();
    dashboard.trainings(TrainingKind::Assigned)[0]
        .modules()
        .first()
        .map(|m| m.videos()[0].completed())
        .unwrap_or(false)
}

#[tokio::test]
async fn assessment_gates_completion_until_passed() {
    // Scenario D, the whole arc: gate, fail, resubmit, pass, fan out.
    let (api, engine) = open_engine_with_assessment(None).await;

    let decision = engine.attempt_completion(&VideoId::new("v1")).await.unwrap();
    let questions = match decision {
        CompletionDecision::AssessmentRequired(questions) => questions,
        other => panic!("expected the assessment requirement, got {other:?}"),
    };
    assert_eq!(questions.len(), 2);
    assert!(api.completions().is_empty());

    // First submission fails: nothing persists, resubmission is allowed.
    api.push_verdict(VideoId::new("v1"), outcome(false));
    let decision = engine
        .submit_assessment_answers(&VideoId::new("v1"), &answers())
        .await
        .unwrap();
    let failed = match decision {
        AssessmentDecision::Failed(failed) => failed,
        other => panic!("expected a failed verdict, got {other:?}"),
    };
    assert!(!failed.passed);
    assert!(!assigned_video_completed(&engine));
    assert!(api.completions().is_empty());

    // Second submission passes and triggers the persist + fan-out.
    api.push_verdict(VideoId::new("v1"), outcome(true));
    let decision = engine
        .submit_assessment_answers(&VideoId::new("v1"), &answers())
        .await
        .unwrap();
    let (passed, completion) = match decision {
        AssessmentDecision::Passed {
            outcome: passed,
            completion,
        } => (passed, completion),
        other => panic!("expected a passing verdict, got {other:?}"),
    };
    assert!(passed.passed);
    assert_eq!(completion, CompletionDecision::Completed);
    assert!(assigned_video_completed(&engine));
    assert_eq!(api.completions().len(), 1);
}

#[tokio::test]
async fn query_failure_proceeds_directly_under_the_default_policy() {
    let (api, engine) = open_engine_with_assessment(None).await;
    api.fail_assessment_queries(true);

    let decision = engine.attempt_completion(&VideoId::new("v1")).await.unwrap();
    assert_eq!(decision, CompletionDecision::Completed);
    assert!(assigned_video_completed(&engine));
}

#[tokio::test]
async fn query_failure_blocks_under_the_strict_policy() {
    let (api, engine) = open_engine_with_assessment(Some(QueryFailurePolicy::Block)).await;
    api.fail_assessment_queries(true);

    let result = engine.attempt_completion(&VideoId::new("v1")).await;
    assert!(result.is_err());
    assert!(!assigned_video_completed(&engine));
    assert!(api.completions().is_empty());
}

#[tokio::test]
async fn passing_after_the_session_closed_does_not_mutate() {
    let (api, engine) = open_engine_with_assessment(None).await;

    let decision = engine.attempt_completion(&VideoId::new("v1")).await.unwrap();
    assert!(matches!(decision, CompletionDecision::AssessmentRequired(_)));

    // The viewer closes the video before the grading round-trip finishes.
    engine.close_watch_session();

    api.push_verdict(VideoId::new("v1"), outcome(true));
    let decision = engine
        .submit_assessment_answers(&VideoId::new("v1"), &answers())
        .await
        .unwrap();
    let completion = match decision {
        AssessmentDecision::Passed { completion, .. } => completion,
        other => panic!("expected a passing verdict, got {other:?}"),
    };
    assert_eq!(completion, CompletionDecision::NoOpenSession);
    assert!(!assigned_video_completed(&engine));
    assert!(api.completions().is_empty());
}
