use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use uuid::Uuid;

use crate::config::WorkspacePaths;
use crate::models::{Session, SessionKind, Subject};

/// Analytics events emitted for the downstream weak-spot/mastery subsystem.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalyticsEventType {
    ThetaUpdated,
    SessionCompleted,
    SessionExpired,
    SessionAbandoned,
}

/// General-purpose engine event stored as JSONL.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticsEvent {
    pub event_id: Uuid,
    pub learner_id: Uuid,
    pub session_id: Uuid,
    pub event_type: AnalyticsEventType,
    pub timestamp: DateTime<Utc>,
    pub details: serde_json::Value,
}

/// Payload logged for every theta mutation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThetaUpdateDetails {
    pub question_id: String,
    pub subject: Subject,
    pub chapter: String,
    pub is_correct: bool,
    pub delta: f64,
    pub theta_after: f64,
    pub std_err_after: f64,
}

/// Chapter-level accuracy summary emitted when a session finishes; the
/// input downstream mastery classification works from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSummaryDetails {
    pub kind: SessionKind,
    pub questions_answered: usize,
    pub questions_total: usize,
    pub theta_final: f64,
    /// chapter -> (correct, attempted)
    pub chapter_accuracy: BTreeMap<String, (u32, u32)>,
}

/// Listener contract. Mastery classification itself stays external; the
/// engine only feeds it.
pub trait AnalyticsSink {
    fn record(&self, event: &AnalyticsEvent) -> Result<()>;
}

/// Sink that drops everything, for unit contexts and callers wiring their
/// own pipeline.
pub struct NoopSink;

impl AnalyticsSink for NoopSink {
    fn record(&self, _event: &AnalyticsEvent) -> Result<()> {
        Ok(())
    }
}

/// Append-only JSONL analytics log under the workspace.
pub struct AnalyticsLog {
    events_path: PathBuf,
}

impl AnalyticsLog {
    pub fn new(paths: &WorkspacePaths) -> Self {
        Self {
            events_path: paths.analytics_dir.join("events.jsonl"),
        }
    }

    pub fn read_all(&self) -> Result<Vec<AnalyticsEvent>> {
        if !self.events_path.exists() {
            return Ok(Vec::new());
        }
        let data = fs::read_to_string(&self.events_path)?;
        let mut events = Vec::new();
        for line in data.lines().filter(|l| !l.trim().is_empty()) {
            events.push(serde_json::from_str(line)?);
        }
        Ok(events)
    }
}

impl AnalyticsSink for AnalyticsLog {
    fn record(&self, event: &AnalyticsEvent) -> Result<()> {
        if let Some(parent) = self.events_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.events_path)?;
        let line = serde_json::to_string(event)?;
        writeln!(file, "{line}")?;
        Ok(())
    }
}

pub fn theta_event(session: &Session, details: ThetaUpdateDetails) -> Result<AnalyticsEvent> {
    Ok(AnalyticsEvent {
        event_id: Uuid::new_v4(),
        learner_id: session.learner_id,
        session_id: session.id,
        event_type: AnalyticsEventType::ThetaUpdated,
        timestamp: Utc::now(),
        details: serde_json::to_value(details)?,
    })
}

pub fn summary_event(
    session: &Session,
    event_type: AnalyticsEventType,
    details: SessionSummaryDetails,
) -> Result<AnalyticsEvent> {
    Ok(AnalyticsEvent {
        event_id: Uuid::new_v4(),
        learner_id: session.learner_id,
        session_id: session.id,
        event_type,
        timestamp: Utc::now(),
        details: serde_json::to_value(details)?,
    })
}
