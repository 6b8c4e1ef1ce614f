use thiserror::Error;
use uuid::Uuid;

use crate::models::SessionStatus;

/// Caller-facing engine failures. Storage/IO problems stay `anyhow` errors
/// with context; these are the conditions callers branch on.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Malformed input rejected before any state mutation: bad IRT
    /// parameters, empty question id, negative time spent.
    #[error("validation failed: {0}")]
    Validation(String),

    /// Adaptive selection found no eligible candidate (pool minus asked
    /// questions is empty). Recoverable: caller serves a fallback set or
    /// ends the session early.
    #[error("question pool exhausted for session")]
    PoolExhausted,

    /// Operation attempted on a session in a terminal state. The session is
    /// left unchanged.
    #[error("session {session_id} is {status:?} and no longer accepts this operation")]
    SessionState {
        session_id: Uuid,
        status: SessionStatus,
    },

    /// Two submissions raced on one session; the version check rejected this
    /// one. Retry with refreshed state.
    #[error("session {session_id} was modified concurrently (expected version {expected}, found {found})")]
    ConcurrentModification {
        session_id: Uuid,
        expected: u64,
        found: u64,
    },
}

impl EngineError {
    pub fn validation(msg: impl Into<String>) -> Self {
        EngineError::Validation(msg.into())
    }
}
