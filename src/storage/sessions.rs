use anyhow::{Context, Result};
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use uuid::Uuid;

use crate::config::WorkspacePaths;
use crate::error::EngineError;
use crate::models::{Response, Session};
use crate::storage::SessionStore;

/// File-backed session store: one JSON document per session plus an
/// append-only JSONL response log.
pub struct JsonSessionStore {
    sessions_dir: PathBuf,
    responses_dir: PathBuf,
}

impl JsonSessionStore {
    pub fn new(paths: &WorkspacePaths) -> Result<Self> {
        fs::create_dir_all(&paths.sessions_dir)?;
        fs::create_dir_all(&paths.responses_dir)?;
        Ok(Self {
            sessions_dir: paths.sessions_dir.clone(),
            responses_dir: paths.responses_dir.clone(),
        })
    }

    fn session_path(&self, session_id: Uuid) -> PathBuf {
        self.sessions_dir.join(format!("{session_id}.json"))
    }

    fn responses_path(&self, session_id: Uuid) -> PathBuf {
        self.responses_dir.join(format!("{session_id}.jsonl"))
    }
}

impl SessionStore for JsonSessionStore {
    fn load_session(&self, session_id: Uuid) -> Result<Option<Session>> {
        let path = self.session_path(session_id);
        if !path.exists() {
            return Ok(None);
        }
        let data = fs::read(&path)
            .with_context(|| format!("Failed to read session document {:?}", path))?;
        let session: Session = serde_json::from_slice(&data)
            .with_context(|| format!("Failed to parse session document {:?}", path))?;
        Ok(Some(session))
    }

    fn save_session(&self, session: &Session, expected_version: u64) -> Result<()> {
        // Optimistic check: re-read what is on disk before overwriting. Two
        // racing submissions load the same version; the second save sees the
        // first one's bump and loses.
        if let Some(stored) = self.load_session(session.id)? {
            if stored.version != expected_version {
                return Err(EngineError::ConcurrentModification {
                    session_id: session.id,
                    expected: expected_version,
                    found: stored.version,
                }
                .into());
            }
        }
        let path = self.session_path(session.id);
        let data = serde_json::to_vec_pretty(session)?;
        fs::write(&path, data)
            .with_context(|| format!("Failed to write session document {:?}", path))?;
        Ok(())
    }

    fn append_response(&self, session_id: Uuid, response: &Response) -> Result<()> {
        let path = self.responses_path(session_id);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("Failed to open response log {:?}", path))?;
        let line = serde_json::to_string(response)?;
        writeln!(file, "{line}")?;
        Ok(())
    }
}
