use anyhow::{Context, Result};
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use uuid::Uuid;

use crate::config::EngineConfig;
use crate::engine::estimator::{apply_update, update_theta};
use crate::engine::selector::{phase_for, select_next, SelectionPhase};
use crate::error::EngineError;
use crate::models::{
    AbilityEstimate, AnswerSubmission, CorrectAnswer, PoolFilter, Question, Response,
    SelectionReason, Session, SessionKind, SessionStatus,
};
use crate::orchestration::events::{
    summary_event, theta_event, AnalyticsEventType, AnalyticsSink, SessionSummaryDetails,
    ThetaUpdateDetails,
};
use crate::orchestration::scoring::{chapter_accuracy, score_session, SessionScore};
use crate::storage::{QuestionBank, SessionStore};

/// What the client gets back for one submitted answer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitOutcome {
    pub is_correct: bool,
    pub correct_answer: CorrectAnswer,
    pub explanation: Option<String>,
    pub theta_delta: f64,
    pub next_question: Option<Question>,
}

/// Drives sessions over injected collaborators. Holds no global state; every
/// dependency is passed in, so two orchestrators over the same stores behave
/// like two app servers over one database.
pub struct SessionOrchestrator<'a> {
    config: &'a EngineConfig,
    bank: &'a dyn QuestionBank,
    store: &'a dyn SessionStore,
    analytics: &'a dyn AnalyticsSink,
}

impl<'a> SessionOrchestrator<'a> {
    pub fn new(
        config: &'a EngineConfig,
        bank: &'a dyn QuestionBank,
        store: &'a dyn SessionStore,
        analytics: &'a dyn AnalyticsSink,
    ) -> Self {
        Self {
            config,
            bank,
            store,
            analytics,
        }
    }

    /// Creates and starts a session. Mock tests pre-select the full fixed
    /// paper; adaptive kinds seed only the first question and pick the rest
    /// one response at a time.
    pub fn start_session(
        &self,
        learner_id: Uuid,
        kind: SessionKind,
        filter: PoolFilter,
        ability: Option<AbilityEstimate>,
    ) -> Result<Session> {
        let profile = self.config.profile(kind);
        let ability = ability.unwrap_or_else(|| {
            AbilityEstimate::prior(
                self.config.estimator.prior_theta,
                self.config.estimator.prior_std_err,
            )
        });
        let mut session = Session::new(learner_id, kind, profile.total_questions, ability);
        session.pool_filter = filter;

        let pool = self
            .bank
            .load_pool(&session.pool_filter)
            .context("Failed to load question pool")?;

        if profile.adaptive {
            let asked = HashSet::new();
            let first = select_next(
                &pool,
                session.ability.theta,
                &asked,
                SelectionPhase::Exploration,
                &self.config.selector,
            )?;
            session.assign(first, SelectionReason::Exploration)?;
        } else {
            if pool.len() < profile.total_questions {
                return Err(EngineError::PoolExhausted.into());
            }
            for question in pool.iter().take(profile.total_questions) {
                session.assign(question, SelectionReason::Fixed)?;
            }
        }

        let duration = profile
            .duration_secs
            .map(|secs| Duration::seconds(secs as i64));
        session.begin(duration);
        self.store
            .save_session(&session, session.version)
            .context("Failed to persist new session")?;
        Ok(session)
    }

    /// Processes one answer: grade, record, update theta, pick what comes
    /// next, persist under the optimistic version check.
    ///
    /// If the adaptive pool runs dry the scored response is still persisted
    /// before `PoolExhausted` surfaces; scoring is never silently skipped.
    pub fn submit_answer(
        &self,
        session_id: Uuid,
        submission: AnswerSubmission,
    ) -> Result<SubmitOutcome> {
        submission.validate()?;
        let mut session = self.load_required(session_id)?;
        let loaded_version = session.version;

        // Lazy expiry check on access; the cron sweep is not the only guard.
        if session.is_expired(Utc::now()) {
            self.finish(&mut session, loaded_version, FinishKind::Expired)?;
            return Err(EngineError::SessionState {
                session_id: session.id,
                status: session.status,
            }
            .into());
        }
        session.ensure_open()?;

        let question = self
            .bank
            .get(&submission.question_id)?
            .ok_or_else(|| {
                EngineError::validation(format!("unknown question {}", submission.question_id))
            })?;

        let is_correct = question.grade(&submission.answer);
        let response = Response {
            question_id: question.id.clone(),
            learner_id: session.learner_id,
            session_id: session.id,
            answer: submission.answer,
            is_correct,
            time_spent_secs: submission.time_spent_secs as u32,
            recorded_at: Utc::now(),
        };
        session.record_answer(response.clone())?;

        let update = update_theta(
            &session.ability,
            &question.irt,
            is_correct,
            &self.config.estimator,
        );
        session.ability = apply_update(&session.ability, &update);

        let profile = self.config.profile(session.kind);
        let mut pool_exhausted = false;
        let next_question = if session.answered_count() >= session.total_questions {
            session.complete();
            None
        } else if profile.adaptive && session.questions.len() < session.total_questions {
            match self.select_for(&session) {
                Ok((question, reason)) => {
                    session.assign(&question, reason)?;
                    Some(question)
                }
                Err(err) if is_pool_exhausted(&err) => {
                    pool_exhausted = true;
                    None
                }
                Err(err) => return Err(err),
            }
        } else {
            self.next_pending(&session)?
        };

        session.bump_version();
        self.store
            .save_session(&session, loaded_version)
            .context("Failed to persist session after answer")?;
        self.store
            .append_response(session.id, &response)
            .context("Failed to append response record")?;

        self.analytics.record(&theta_event(
            &session,
            ThetaUpdateDetails {
                question_id: question.id.clone(),
                subject: question.subject,
                chapter: question.chapter.clone(),
                is_correct,
                delta: update.delta,
                theta_after: update.theta_after,
                std_err_after: update.std_err_after,
            },
        )?)?;
        if session.status == SessionStatus::Completed {
            self.analytics
                .record(&self.summary(&session, AnalyticsEventType::SessionCompleted)?)?;
        }

        if pool_exhausted {
            return Err(EngineError::PoolExhausted.into());
        }
        Ok(SubmitOutcome {
            is_correct,
            correct_answer: question.correct.clone(),
            explanation: question.explanation.clone(),
            theta_delta: update.delta,
            next_question,
        })
    }

    /// Learner opens a question without answering it.
    pub fn visit_question(&self, session_id: Uuid, question_id: &str) -> Result<Session> {
        self.mutate(session_id, |session| session.visit(question_id))
    }

    pub fn mark_for_review(&self, session_id: Uuid, question_id: &str) -> Result<Session> {
        self.mutate(session_id, |session| session.mark_for_review(question_id))
    }

    /// Learner submits before answering everything; the rest counts as
    /// unattempted.
    pub fn submit_early(&self, session_id: Uuid) -> Result<(Session, SessionScore)> {
        let mut session = self.load_required(session_id)?;
        session.ensure_open()?;
        let loaded_version = session.version;
        self.finish(&mut session, loaded_version, FinishKind::Completed)?;
        let score = self.score(&session);
        Ok((session, score))
    }

    /// Timeout transition: remaining questions stay unattempted (zero marks)
    /// and the session terminates as expired.
    pub fn auto_submit(&self, session_id: Uuid) -> Result<(Session, SessionScore)> {
        let mut session = self.load_required(session_id)?;
        session.ensure_open()?;
        let loaded_version = session.version;
        self.finish(&mut session, loaded_version, FinishKind::Expired)?;
        let score = self.score(&session);
        Ok((session, score))
    }

    /// Terminal no-op transition for a learner who walked away.
    pub fn abandon(&self, session_id: Uuid) -> Result<Session> {
        let mut session = self.load_required(session_id)?;
        session.ensure_open()?;
        let loaded_version = session.version;
        self.finish(&mut session, loaded_version, FinishKind::Abandoned)?;
        Ok(session)
    }

    /// Scores a session under its kind's marking scheme.
    pub fn score(&self, session: &Session) -> SessionScore {
        score_session(session, &self.config.profile(session.kind).marking)
    }

    fn load_required(&self, session_id: Uuid) -> Result<Session> {
        self.store
            .load_session(session_id)?
            .ok_or_else(|| EngineError::validation(format!("unknown session {session_id}")).into())
    }

    fn mutate(
        &self,
        session_id: Uuid,
        op: impl FnOnce(&mut Session) -> Result<(), EngineError>,
    ) -> Result<Session> {
        let mut session = self.load_required(session_id)?;
        let loaded_version = session.version;
        op(&mut session)?;
        session.bump_version();
        self.store.save_session(&session, loaded_version)?;
        Ok(session)
    }

    fn select_for(&self, session: &Session) -> Result<(Question, SelectionReason)> {
        let pool = self.bank.load_pool(&session.pool_filter)?;
        let asked: HashSet<String> = session.asked_question_ids().into_iter().collect();
        let phase = phase_for(session.answered_count() as u32, &self.config.selector);
        let question = select_next(
            &pool,
            session.ability.theta,
            &asked,
            phase,
            &self.config.selector,
        )?;
        let reason = match phase {
            SelectionPhase::Exploration => SelectionReason::Exploration,
            SelectionPhase::DeliberatePractice => SelectionReason::MaxInformation,
        };
        Ok((question.clone(), reason))
    }

    /// Next unanswered question of a fixed paper, in assignment order.
    fn next_pending(&self, session: &Session) -> Result<Option<Question>> {
        for assigned in &session.questions {
            if !assigned.state.is_answered() {
                return self.bank.get(&assigned.question_id);
            }
        }
        Ok(None)
    }

    fn finish(&self, session: &mut Session, loaded_version: u64, kind: FinishKind) -> Result<()> {
        let event_type = match kind {
            FinishKind::Completed => {
                session.complete();
                AnalyticsEventType::SessionCompleted
            }
            FinishKind::Expired => {
                session.expire();
                AnalyticsEventType::SessionExpired
            }
            FinishKind::Abandoned => {
                session.abandon();
                AnalyticsEventType::SessionAbandoned
            }
        };
        session.bump_version();
        self.store
            .save_session(session, loaded_version)
            .context("Failed to persist finished session")?;
        self.analytics.record(&self.summary(session, event_type)?)?;
        Ok(())
    }

    fn summary(
        &self,
        session: &Session,
        event_type: AnalyticsEventType,
    ) -> Result<crate::orchestration::events::AnalyticsEvent> {
        summary_event(
            session,
            event_type,
            SessionSummaryDetails {
                kind: session.kind,
                questions_answered: session.answered_count(),
                questions_total: session.total_questions,
                theta_final: session.ability.theta,
                chapter_accuracy: chapter_accuracy(session),
            },
        )
    }
}

enum FinishKind {
    Completed,
    Expired,
    Abandoned,
}

fn is_pool_exhausted(err: &anyhow::Error) -> bool {
    matches!(
        err.downcast_ref::<EngineError>(),
        Some(EngineError::PoolExhausted)
    )
}
