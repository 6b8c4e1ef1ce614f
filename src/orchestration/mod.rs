pub mod events;
pub mod scoring;
pub mod session;

pub use events::{
    summary_event, theta_event, AnalyticsEvent, AnalyticsEventType, AnalyticsLog, AnalyticsSink,
    NoopSink, SessionSummaryDetails, ThetaUpdateDetails,
};
pub use scoring::{chapter_accuracy, score_session, SessionScore, SubjectScore};
pub use session::{SessionOrchestrator, SubmitOutcome};
