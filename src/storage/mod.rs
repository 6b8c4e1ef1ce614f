pub mod question_bank;
pub mod sessions;

pub use question_bank::{JsonQuestionBank, MemoryQuestionBank, PoolFilter};
pub use sessions::JsonSessionStore;

use anyhow::Result;
use uuid::Uuid;

use crate::models::{Question, Response, Session};

/// Read-only supplier of calibrated questions. The engine never writes to
/// the bank.
pub trait QuestionBank {
    fn load_pool(&self, filter: &PoolFilter) -> Result<Vec<Question>>;
    fn get(&self, question_id: &str) -> Result<Option<Question>>;
}

/// Narrow persistence interface the orchestrator is handed. Injected
/// explicitly; never a module-level singleton.
pub trait SessionStore {
    fn load_session(&self, session_id: Uuid) -> Result<Option<Session>>;
    /// Persists the session iff the stored version still equals
    /// `expected_version`. A mismatch surfaces as
    /// `EngineError::ConcurrentModification`.
    fn save_session(&self, session: &Session, expected_version: u64) -> Result<()>;
    fn append_response(&self, session_id: Uuid, response: &Response) -> Result<()>;
}
