use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::EngineError;
use crate::models::ability::AbilityEstimate;
use crate::models::question::{PoolFilter, Question, Subject};
use crate::models::response::Response;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionKind {
    DailyQuiz,
    ChapterPractice,
    MockTest,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Created,
    InProgress,
    Completed,
    Abandoned,
    Expired,
}

impl SessionStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SessionStatus::Completed | SessionStatus::Abandoned | SessionStatus::Expired
        )
    }
}

/// Per-question state within a session. A closed five-state machine, not a
/// flag set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionState {
    NotVisited,
    NotAnswered,
    Answered,
    MarkedForReview,
    AnsweredAndMarked,
}

impl QuestionState {
    pub fn is_answered(&self) -> bool {
        matches!(self, QuestionState::Answered | QuestionState::AnsweredAndMarked)
    }
}

/// Why the selector assigned a question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionReason {
    Exploration,
    MaxInformation,
    Fixed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignedQuestion {
    pub question_id: String,
    /// Taxonomy snapshot so scoring and summaries never need the bank.
    pub subject: Subject,
    pub chapter: String,
    pub state: QuestionState,
    pub selection_reason: SelectionReason,
    #[serde(default)]
    pub response: Option<Response>,
}

impl AssignedQuestion {
    pub fn new(question: &Question, selection_reason: SelectionReason) -> Self {
        Self {
            question_id: question.id.clone(),
            subject: question.subject,
            chapter: question.chapter.clone(),
            state: QuestionState::NotVisited,
            selection_reason,
            response: None,
        }
    }
}

/// An ordered, bounded question sequence assigned to one learner. The total
/// question count is fixed at creation and never changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: Uuid,
    pub learner_id: Uuid,
    pub kind: SessionKind,
    pub status: SessionStatus,
    pub total_questions: usize,
    /// Pool scope questions are drawn from; adaptive kinds re-query it.
    #[serde(default)]
    pub pool_filter: PoolFilter,
    pub questions: Vec<AssignedQuestion>,
    pub ability: AbilityEstimate,
    /// Bumped on every persisted mutation; the store's optimistic check.
    pub version: u64,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

impl Session {
    pub fn new(
        learner_id: Uuid,
        kind: SessionKind,
        total_questions: usize,
        ability: AbilityEstimate,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            learner_id,
            kind,
            status: SessionStatus::Created,
            total_questions,
            pool_filter: PoolFilter::default(),
            questions: Vec::new(),
            ability,
            version: 0,
            created_at: now,
            started_at: None,
            expires_at: None,
            finished_at: None,
            updated_at: now,
        }
    }

    pub fn answered_count(&self) -> usize {
        self.questions.iter().filter(|q| q.state.is_answered()).count()
    }

    pub fn asked_question_ids(&self) -> Vec<String> {
        self.questions.iter().map(|q| q.question_id.clone()).collect()
    }

    pub fn assigned(&self, question_id: &str) -> Option<&AssignedQuestion> {
        self.questions.iter().find(|q| q.question_id == question_id)
    }

    pub fn assigned_mut(&mut self, question_id: &str) -> Option<&mut AssignedQuestion> {
        self.questions.iter_mut().find(|q| q.question_id == question_id)
    }

    /// Adds a question to the sequence. The count fixed at creation is a
    /// hard ceiling.
    pub fn assign(&mut self, question: &Question, reason: SelectionReason) -> Result<(), EngineError> {
        if self.questions.len() >= self.total_questions {
            return Err(EngineError::validation(format!(
                "session {} already has its {} questions",
                self.id, self.total_questions
            )));
        }
        if self.assigned(&question.id).is_some() {
            return Err(EngineError::validation(format!(
                "question {} is already assigned in session {}",
                question.id, self.id
            )));
        }
        self.questions.push(AssignedQuestion::new(question, reason));
        Ok(())
    }

    /// Rejects any mutating operation once the session is terminal.
    pub fn ensure_open(&self) -> Result<(), EngineError> {
        if self.status.is_terminal() {
            return Err(EngineError::SessionState {
                session_id: self.id,
                status: self.status,
            });
        }
        Ok(())
    }

    pub fn begin(&mut self, duration: Option<Duration>) {
        let now = Utc::now();
        self.status = SessionStatus::InProgress;
        self.started_at = Some(now);
        self.expires_at = duration.map(|d| now + d);
        self.updated_at = now;
    }

    /// Marks a question as seen without answering it.
    pub fn visit(&mut self, question_id: &str) -> Result<(), EngineError> {
        self.ensure_open()?;
        let slot = self.assigned_mut(question_id).ok_or_else(|| {
            EngineError::validation(format!("question {question_id} is not assigned"))
        })?;
        if slot.state == QuestionState::NotVisited {
            slot.state = QuestionState::NotAnswered;
        }
        self.updated_at = Utc::now();
        Ok(())
    }

    pub fn mark_for_review(&mut self, question_id: &str) -> Result<(), EngineError> {
        self.ensure_open()?;
        let slot = self.assigned_mut(question_id).ok_or_else(|| {
            EngineError::validation(format!("question {question_id} is not assigned"))
        })?;
        slot.state = match slot.state {
            QuestionState::Answered | QuestionState::AnsweredAndMarked => {
                QuestionState::AnsweredAndMarked
            }
            _ => QuestionState::MarkedForReview,
        };
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Records a graded response against an assigned, not-yet-answered
    /// question.
    pub fn record_answer(&mut self, response: Response) -> Result<(), EngineError> {
        self.ensure_open()?;
        let session_id = self.id;
        let slot = self
            .assigned_mut(&response.question_id)
            .ok_or_else(|| {
                EngineError::validation(format!(
                    "question {} was not assigned in session {}",
                    response.question_id, session_id
                ))
            })?;
        if slot.state.is_answered() {
            return Err(EngineError::validation(format!(
                "question {} was already answered in session {}",
                response.question_id, session_id
            )));
        }
        slot.state = match slot.state {
            QuestionState::MarkedForReview => QuestionState::AnsweredAndMarked,
            _ => QuestionState::Answered,
        };
        slot.response = Some(response);
        self.updated_at = Utc::now();
        Ok(())
    }

    pub fn complete(&mut self) {
        let now = Utc::now();
        self.status = SessionStatus::Completed;
        self.finished_at = Some(now);
        self.updated_at = now;
    }

    pub fn abandon(&mut self) {
        let now = Utc::now();
        self.status = SessionStatus::Abandoned;
        self.finished_at = Some(now);
        self.updated_at = now;
    }

    pub fn expire(&mut self) {
        let now = Utc::now();
        self.status = SessionStatus::Expired;
        self.finished_at = Some(now);
        self.updated_at = now;
    }

    /// True when the wall-clock budget has elapsed. Only time-boxed sessions
    /// (mock tests) carry an `expires_at`.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        match self.expires_at {
            Some(deadline) => !self.status.is_terminal() && now >= deadline,
            None => false,
        }
    }

    /// True when an in-progress session has sat untouched past the TTL and
    /// should be swept to `Abandoned`.
    pub fn is_stale(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        !self.status.is_terminal() && now - self.updated_at >= ttl
    }

    pub fn bump_version(&mut self) {
        self.version += 1;
    }
}
