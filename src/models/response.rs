use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::EngineError;
use crate::models::question::SubmittedAnswer;

/// One scored answer. Immutable once recorded; feeds exactly one theta
/// update.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
    pub question_id: String,
    pub learner_id: Uuid,
    pub session_id: Uuid,
    pub answer: SubmittedAnswer,
    pub is_correct: bool,
    pub time_spent_secs: u32,
    pub recorded_at: DateTime<Utc>,
}

/// Raw submission as it arrives from the client, before any state mutation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerSubmission {
    pub question_id: String,
    pub answer: SubmittedAnswer,
    pub time_spent_secs: i64,
}

impl AnswerSubmission {
    /// Rejects malformed payloads up front so nothing downstream sees them.
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.question_id.trim().is_empty() {
            return Err(EngineError::validation("submission is missing question_id"));
        }
        if self.time_spent_secs < 0 {
            return Err(EngineError::validation(format!(
                "time_spent_secs must be non-negative, got {}",
                self.time_spent_secs
            )));
        }
        Ok(())
    }
}
