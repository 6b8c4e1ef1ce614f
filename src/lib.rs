pub mod config;
pub mod engine;
pub mod error;
pub mod models;
pub mod orchestration;
pub mod storage;

// Re-export commonly used types for convenience.
pub use config::{EngineConfig, MarkingScheme, SessionProfile};
pub use error::EngineError;
pub use models::{
    AbilityEstimate, AnswerSubmission, PoolFilter, Question, Response, Session, SessionKind,
    SessionStatus, SubmittedAnswer,
};
pub use orchestration::{SessionOrchestrator, SubmitOutcome};
