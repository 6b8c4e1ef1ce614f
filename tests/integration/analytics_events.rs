use anyhow::Result;

use examcore::models::{AnswerSubmission, SessionKind, SubmittedAnswer};
use examcore::orchestration::{
    AnalyticsEventType, AnalyticsLog, SessionOrchestrator, ThetaUpdateDetails,
};
use examcore::PoolFilter;
use uuid::Uuid;

use crate::{practice_bank, IntegrationHarness};

#[test]
fn theta_updates_and_completion_land_in_the_jsonl_log() -> Result<()> {
    let harness = IntegrationHarness::new();
    let config = harness.config();
    let bank = practice_bank(12);
    let store = harness.session_store();
    let log = AnalyticsLog::new(&harness.paths);
    let orchestrator = SessionOrchestrator::new(&config, &bank, &store, &log);

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
                answer: SubmittedAnswer::Numerical { value: 1.0 },
                time_spent_secs: 12,
            },
        )?;
        if let Some(next) = &outcome.next_question {
            current = next.id.clone();
        }
    }

    let events = log.read_all()?;
    let theta_updates: Vec<_> = events
        .iter()
        .filter(|e| matches!(e.event_type, AnalyticsEventType::ThetaUpdated))
        .collect();
    assert_eq!(theta_updates.len(), 5);
    for event in &theta_updates {
        assert_eq!(event.session_id, session.id);
        let details: ThetaUpdateDetails = serde_json::from_value(event.details.clone())?;
        assert!(details.is_correct);
        assert_eq!(details.chapter, "algebra");
        assert!(details.delta.abs() <= config.estimator.max_step + 1e-12);
    }

    let completions: Vec<_> = events
        .iter()
        .filter(|e| matches!(e.event_type, AnalyticsEventType::SessionCompleted))
        .collect();
    assert_eq!(completions.len(), 1);
    let summary: examcore::orchestration::SessionSummaryDetails =
        serde_json::from_value(completions[0].details.clone())?;
    assert_eq!(summary.questions_answered, 5);
    assert_eq!(summary.chapter_accuracy.get("algebra"), Some(&(5, 5)));
    Ok(())
}
