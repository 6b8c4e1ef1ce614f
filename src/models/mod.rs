pub mod ability;
pub mod question;
pub mod response;
pub mod session;

pub use ability::AbilityEstimate;
pub use question::{
    CorrectAnswer, IrtParams, PoolFilter, Question, QuestionOption, QuestionType, Subject,
    SubmittedAnswer,
};
pub use response::{AnswerSubmission, Response};
pub use session::{
    AssignedQuestion, QuestionState, SelectionReason, Session, SessionKind, SessionStatus,
};
