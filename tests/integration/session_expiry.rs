use anyhow::Result;
use chrono::{Duration, Utc};

use examcore::models::{AnswerSubmission, SessionKind, SessionStatus, SubmittedAnswer};
use examcore::orchestration::{NoopSink, SessionOrchestrator};
use examcore::storage::SessionStore;
use examcore::{EngineError, PoolFilter};
use uuid::Uuid;

use crate::{mock_bank, IntegrationHarness};

#[test]
fn overdue_mock_test_auto_submits_with_zero_marks_for_the_rest() -> Result<()> {
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
    orchestrator.submit_answer(
        session.id,
        AnswerSubmission {
            question_id: first,
            answer: SubmittedAnswer::Option {
                option_id: "b".into(),
            },
            time_spent_secs: 60,
        },
    )?;

    // Push the deadline into the past, as if three hours elapsed.
    let mut stored = store.load_session(session.id)?.unwrap();
    stored.expires_at = Some(Utc::now() - Duration::seconds(1));
    store.save_session(&stored, stored.version)?;
    assert!(stored.is_expired(Utc::now()));

    let (expired, score) = orchestrator.auto_submit(session.id)?;
    assert_eq!(expired.status, SessionStatus::Expired);
    assert_eq!(score.correct, 1);
    assert_eq!(score.unattempted, 89);
    assert_eq!(score.total_marks, 4);
    Ok(())
}

#[test]
fn submission_against_an_overdue_session_is_lazily_expired() -> Result<()> {
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
    let mut stored = store.load_session(session.id)?.unwrap();
    stored.expires_at = Some(Utc::now() - Duration::seconds(10));
    store.save_session(&stored, stored.version)?;

    let err = orchestrator
        .submit_answer(
            session.id,
            AnswerSubmission {
                question_id: session.questions[0].question_id.clone(),
                answer: SubmittedAnswer::Option {
                    option_id: "b".into(),
                },
                time_spent_secs: 10,
            },
        )
        .unwrap_err();
    match err.downcast_ref::<EngineError>() {
        Some(EngineError::SessionState { status, .. }) => {
            assert_eq!(*status, SessionStatus::Expired)
        }
        other => panic!("expected SessionState error, got {other:?}"),
    }

    let after = store.load_session(session.id)?.unwrap();
    assert_eq!(after.status, SessionStatus::Expired);
    assert_eq!(after.answered_count(), 0);
    Ok(())
}

#[test]
fn abandoned_sessions_terminate_and_staleness_is_detected() -> Result<()> {
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
    let ttl = Duration::seconds(config.sessions.abandon_ttl_secs as i64);
    assert!(!session.is_stale(Utc::now(), ttl));
    assert!(session.is_stale(Utc::now() + ttl + Duration::seconds(1), ttl));

    let abandoned = orchestrator.abandon(session.id)?;
    assert_eq!(abandoned.status, SessionStatus::Abandoned);
    assert!(orchestrator.abandon(session.id).is_err(), "abandon is terminal");
    Ok(())
}
