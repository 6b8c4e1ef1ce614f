use anyhow::Result;

use examcore::models::{
    AnswerSubmission, QuestionState, SelectionReason, SessionKind, SessionStatus, SubmittedAnswer,
};
use examcore::orchestration::{NoopSink, SessionOrchestrator};
use examcore::storage::SessionStore;
use examcore::PoolFilter;
use uuid::Uuid;

use crate::{mock_bank, IntegrationHarness};

#[test]
fn mock_test_assigns_the_full_fixed_paper() -> Result<()> {
    let harness = IntegrationHarness::new();
    let config = harness.config();
    let bank = mock_bank();
    let store = harness.session_store();
    let sink = NoopSink;
    let orchestrator = SessionOrchestrator::new(&config, &bank, &store, &sink);

    let session = orchestrator.start_session(
        Uuid::new_v4(),
        SessionKind::MockTest,
        PoolFilter::default(),
        None,
    )?;
    assert_eq!(session.questions.len(), 90);
    assert!(session
        .questions
        .iter()
        .all(|q| q.selection_reason == SelectionReason::Fixed));
    assert!(session.expires_at.is_some(), "mock tests are time-boxed");
    Ok(())
}

#[test]
fn jee_marking_scheme_scores_the_observed_scenario() -> Result<()> {
    // 75 correct, 10 incorrect, 5 unattempted out of 90.
    let harness = IntegrationHarness::new();
    let config = harness.config();
    let bank = mock_bank();
    let store = harness.session_store();
    let sink = NoopSink;
    let orchestrator = SessionOrchestrator::new(&config, &bank, &store, &sink);

    let session = orchestrator.start_session(
        Uuid::new_v4(),
        SessionKind::MockTest,
        PoolFilter::default(),
        None,
    )?;
    let assigned: Vec<String> = session.asked_question_ids();
    for (idx, question_id) in assigned.iter().take(85).enumerate() {
        let option = if idx < 75 { "b" } else { "c" };
        orchestrator.submit_answer(
            session.id,
            AnswerSubmission {
                question_id: question_id.clone(),
                answer: SubmittedAnswer::Option {
                    option_id: option.into(),
                },
                time_spent_secs: 90,
            },
        )?;
    }

    let (finished, score) = orchestrator.submit_early(session.id)?;
    assert_eq!(finished.status, SessionStatus::Completed);
    assert_eq!(score.correct, 75);
    assert_eq!(score.incorrect, 10);
    assert_eq!(score.unattempted, 5);
    assert_eq!(score.total_marks, 290);
    assert_eq!(score.max_marks, 300);
    assert!((score.percentage - 96.666_666_666_666_67).abs() < 1e-9);
    assert!((score.accuracy - 88.235_294_117_647_06).abs() < 1e-9);

    // 30 questions per subject, each fully accounted for.
    assert_eq!(score.subjects.len(), 3);
    for subject in &score.subjects {
        assert_eq!(subject.correct + subject.incorrect + subject.unattempted, 30);
    }
    Ok(())
}

#[test]
fn review_markers_survive_answering() -> Result<()> {
    let harness = IntegrationHarness::new();
    let config = harness.config();
    let bank = mock_bank();
    let store = harness.session_store();
    let sink = NoopSink;
    let orchestrator = SessionOrchestrator::new(&config, &bank, &store, &sink);

    let session = orchestrator.start_session(
        Uuid::new_v4(),
        SessionKind::MockTest,
        PoolFilter::default(),
        None,
    )?;
    let first = session.questions[0].question_id.clone();
    let second = session.questions[1].question_id.clone();

    orchestrator.visit_question(session.id, &first)?;
    orchestrator.mark_for_review(session.id, &second)?;
    orchestrator.submit_answer(
        session.id,
        AnswerSubmission {
            question_id: second.clone(),
            answer: SubmittedAnswer::Option {
                option_id: "b".into(),
            },
            time_spent_secs: 40,
        },
    )?;

    let stored = store.load_session(session.id)?.unwrap();
    assert_eq!(stored.assigned(&first).unwrap().state, QuestionState::NotAnswered);
    assert_eq!(
        stored.assigned(&second).unwrap().state,
        QuestionState::AnsweredAndMarked
    );
    assert_eq!(
        stored.assigned(&stored.questions[2].question_id.clone()).unwrap().state,
        QuestionState::NotVisited
    );
    Ok(())
}
