use anyhow::Result;
use std::collections::HashSet;

use examcore::models::{AnswerSubmission, SessionKind, SessionStatus, SubmittedAnswer};
use examcore::orchestration::{NoopSink, SessionOrchestrator};
use examcore::storage::SessionStore;
use examcore::{EngineError, PoolFilter};
use uuid::Uuid;

use crate::{practice_bank, IntegrationHarness};

#[test]
fn daily_quiz_runs_to_completion_and_locks() -> Result<()> {
    let harness = IntegrationHarness::new();
    let config = harness.config();
    let bank = practice_bank(12);
    let store = harness.session_store();
    let sink = NoopSink;
    let orchestrator = SessionOrchestrator::new(&config, &bank, &store, &sink);

    let session = orchestrator.start_session(
        Uuid::new_v4(),
        SessionKind::DailyQuiz,
        PoolFilter::default(),
        None,
    )?;
    assert_eq!(session.total_questions, 5);
    assert_eq!(session.questions.len(), 1, "adaptive sessions seed one question");

    let mut seen = HashSet::new();
    let mut current = session.questions[0].question_id.clone();
    let mut last_outcome = None;
    for _ in 0..5 {
        assert!(seen.insert(current.clone()), "selector repeated {current}");
        let outcome = orchestrator.submit_answer(
            session.id,
            AnswerSubmission {
                question_id: current.clone(),
                answer: SubmittedAnswer::Numerical { value: 1.0 },
                time_spent_secs: 20,
            },
        )?;
        assert!(outcome.is_correct);
        assert!(
            outcome.theta_delta.abs() <= config.estimator.max_step + 1e-12,
            "theta step {} exceeds cap",
            outcome.theta_delta
        );
        if let Some(next) = &outcome.next_question {
            current = next.id.clone();
        }
        last_outcome = Some(outcome);
    }
    assert!(last_outcome.unwrap().next_question.is_none());

    let stored = store.load_session(session.id)?.expect("session persisted");
    assert_eq!(stored.status, SessionStatus::Completed);
    assert_eq!(stored.answered_count(), 5);
    // Five correct answers from the prior must have raised the estimate.
    assert!(stored.ability.theta > 0.0);
    assert!(stored.ability.std_err < config.estimator.prior_std_err);

    // Scenario C: a sixth submission bounces off the terminal session.
    let err = orchestrator
        .submit_answer(
            session.id,
            AnswerSubmission {
                question_id: "prac000".into(),
                answer: SubmittedAnswer::Numerical { value: 1.0 },
                time_spent_secs: 5,
            },
        )
        .unwrap_err();
    match err.downcast_ref::<EngineError>() {
        Some(EngineError::SessionState { status, .. }) => {
            assert_eq!(*status, SessionStatus::Completed)
        }
        other => panic!("expected SessionState error, got {other:?}"),
    }
    Ok(())
}

#[test]
fn wrong_answers_pull_theta_down() -> Result<()> {
    let harness = IntegrationHarness::new();
    let config = harness.config();
    let bank = practice_bank(10);
    let store = harness.session_store();
    let sink = NoopSink;
    let orchestrator = SessionOrchestrator::new(&config, &bank, &store, &sink);

    let session = orchestrator.start_session(
        Uuid::new_v4(),
        SessionKind::DailyQuiz,
        PoolFilter::default(),
        None,
    )?;
    let mut current = session.questions[0].question_id.clone();
    for _ in 0..5 {
        let outcome = orchestrator.submit_answer(
            session.id,
            AnswerSubmission {
                question_id: current.clone(),
                answer: SubmittedAnswer::Numerical { value: 99.0 },
                time_spent_secs: 45,
            },
        )?;
        assert!(!outcome.is_correct);
        if let Some(next) = &outcome.next_question {
            current = next.id.clone();
        }
    }
    let stored = store.load_session(session.id)?.unwrap();
    assert!(stored.ability.theta < 0.0);
    Ok(())
}

#[test]
fn malformed_submissions_are_rejected_without_mutation() -> Result<()> {
    let harness = IntegrationHarness::new();
    let config = harness.config();
    let bank = practice_bank(10);
    let store = harness.session_store();
    let sink = NoopSink;
    let orchestrator = SessionOrchestrator::new(&config, &bank, &store, &sink);

    let session = orchestrator.start_session(
        Uuid::new_v4(),
        SessionKind::DailyQuiz,
        PoolFilter::default(),
        None,
    )?;
    let before = store.load_session(session.id)?.unwrap();

    let err = orchestrator
        .submit_answer(
            session.id,
            AnswerSubmission {
                question_id: session.questions[0].question_id.clone(),
                answer: SubmittedAnswer::Numerical { value: 1.0 },
                time_spent_secs: -1,
            },
        )
        .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<EngineError>(),
        Some(EngineError::Validation(_))
    ));

    let after = store.load_session(session.id)?.unwrap();
    assert_eq!(after.version, before.version, "rejected payload must not mutate state");
    assert_eq!(after.answered_count(), 0);
    Ok(())
}
