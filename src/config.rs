//! Engine configuration.
//!
//! Stored in a machine-readable TOML file located at:
//!   %APPDATA%/Examcore/config.toml on Windows
//!   $XDG_DATA_HOME/examcore/config.toml on Linux
//!   ~/Library/Application Support/Examcore/config.toml on macOS
//!
//! Marking schemes, session sizes, time budgets, and estimator/selector
//! constants are configuration, never hard-coded: the constants observed in
//! production fixtures (multipliers around 0.5, deltas of 0.1-0.3) are
//! starting points a deployment tunes.

use anyhow::{Context, Result};
use directories::BaseDirs;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::PathBuf;

use crate::models::SessionKind;

const CONFIG_FILE_NAME: &str = "config.toml";

/// Root configuration persisted per installation.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct EngineConfig {
    /// Theta-update tuning.
    #[serde(default)]
    pub estimator: EstimatorSettings,
    /// Item-selection tuning.
    #[serde(default)]
    pub selector: SelectorSettings,
    /// Per-kind session profiles (question counts, time budgets, marking).
    #[serde(default)]
    pub sessions: SessionProfiles,
}

impl EngineConfig {
    pub fn profile(&self, kind: SessionKind) -> &SessionProfile {
        match kind {
            SessionKind::DailyQuiz => &self.sessions.daily_quiz,
            SessionKind::ChapterPractice => &self.sessions.chapter_practice,
            SessionKind::MockTest => &self.sessions.mock_test,
        }
    }
}

/// Theta estimator tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EstimatorSettings {
    /// Prior ability for a learner with no scored responses.
    #[serde(default = "default_prior_theta")]
    pub prior_theta: f64,
    /// Prior standard error (wide, narrows with responses).
    #[serde(default = "default_prior_std_err")]
    pub prior_std_err: f64,
    /// Damping applied to the raw Newton step.
    #[serde(default = "default_step_scale")]
    pub step_scale: f64,
    /// Hard cap on how far one response can move theta.
    #[serde(default = "default_max_step")]
    pub max_step: f64,
}

impl Default for EstimatorSettings {
    fn default() -> Self {
        Self {
            prior_theta: default_prior_theta(),
            prior_std_err: default_prior_std_err(),
            step_scale: default_step_scale(),
            max_step: default_max_step(),
        }
    }
}

const fn default_prior_theta() -> f64 {
    0.0
}

const fn default_prior_std_err() -> f64 {
    1.0
}

const fn default_step_scale() -> f64 {
    0.5
}

const fn default_max_step() -> f64 {
    0.3
}

/// Item selector tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectorSettings {
    /// Scored responses before switching from exploration to deliberate
    /// practice.
    #[serde(default = "default_exploration_responses")]
    pub exploration_responses: u32,
    /// Information values within this distance count as tied.
    #[serde(default = "default_info_epsilon")]
    pub info_epsilon: f64,
}

impl Default for SelectorSettings {
    fn default() -> Self {
        Self {
            exploration_responses: default_exploration_responses(),
            info_epsilon: default_info_epsilon(),
        }
    }
}

const fn default_exploration_responses() -> u32 {
    2
}

const fn default_info_epsilon() -> f64 {
    1e-6
}

/// One profile per session kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionProfiles {
    #[serde(default = "default_daily_quiz")]
    pub daily_quiz: SessionProfile,
    #[serde(default = "default_chapter_practice")]
    pub chapter_practice: SessionProfile,
    #[serde(default = "default_mock_test")]
    pub mock_test: SessionProfile,
    /// In-progress sessions untouched this long are swept to abandoned.
    #[serde(default = "default_abandon_ttl_secs")]
    pub abandon_ttl_secs: u64,
}

impl Default for SessionProfiles {
    fn default() -> Self {
        Self {
            daily_quiz: default_daily_quiz(),
            chapter_practice: default_chapter_practice(),
            mock_test: default_mock_test(),
            abandon_ttl_secs: default_abandon_ttl_secs(),
        }
    }
}

/// Shape of one session kind: size, pacing, and marks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionProfile {
    pub total_questions: usize,
    /// Wall-clock budget; only mock tests carry one.
    #[serde(default)]
    pub duration_secs: Option<u64>,
    /// Whether questions are picked adaptively one at a time, or the full
    /// paper is fixed up front.
    pub adaptive: bool,
    #[serde(default)]
    pub marking: MarkingScheme,
}

/// JEE marking scheme. `max_marks` is explicit because the official paper
/// lists more questions than count toward the cap.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarkingScheme {
    #[serde(default = "default_marks_correct")]
    pub correct: i32,
    #[serde(default = "default_marks_incorrect")]
    pub incorrect: i32,
    #[serde(default)]
    pub unattempted: i32,
    #[serde(default = "default_max_marks")]
    pub max_marks: i32,
}

impl Default for MarkingScheme {
    fn default() -> Self {
        Self {
            correct: default_marks_correct(),
            incorrect: default_marks_incorrect(),
            unattempted: 0,
            max_marks: default_max_marks(),
        }
    }
}

const fn default_marks_correct() -> i32 {
    4
}

const fn default_marks_incorrect() -> i32 {
    -1
}

const fn default_max_marks() -> i32 {
    300
}

fn default_daily_quiz() -> SessionProfile {
    SessionProfile {
        total_questions: 5,
        duration_secs: None,
        adaptive: true,
        marking: MarkingScheme::default(),
    }
}

fn default_chapter_practice() -> SessionProfile {
    SessionProfile {
        total_questions: 30,
        duration_secs: None,
        adaptive: true,
        marking: MarkingScheme::default(),
    }
}

fn default_mock_test() -> SessionProfile {
    SessionProfile {
        total_questions: 90,
        duration_secs: Some(10_800),
        adaptive: false,
        marking: MarkingScheme::default(),
    }
}

const fn default_abandon_ttl_secs() -> u64 {
    86_400
}

/// Resolves the workspace root.
///
/// Order of precedence:
/// 1. `EXAMCORE_HOME` environment variable.
/// 2. OS-specific data directory via `directories::BaseDirs`.
pub fn workspace_root() -> Result<PathBuf> {
    if let Ok(path) = env::var("EXAMCORE_HOME") {
        return Ok(PathBuf::from(path));
    }
    let base_dirs = BaseDirs::new().context("Unable to determine OS data directory")?;
    Ok(base_dirs.data_dir().join("Examcore"))
}

pub fn config_dir() -> Result<PathBuf> {
    Ok(workspace_root()?.join("config"))
}

pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Loads the configuration from disk or returns defaults.
pub fn load_or_default() -> Result<EngineConfig> {
    let path = config_file_path()?;
    if path.exists() {
        let data = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file {:?}", path))?;
        let cfg: EngineConfig = toml::from_str(&data)
            .with_context(|| format!("Failed to parse config file {:?}", path))?;
        Ok(cfg)
    } else {
        Ok(EngineConfig::default())
    }
}

/// Persists the configuration to disk.
pub fn save(config: &EngineConfig) -> Result<()> {
    let dir = config_dir()?;
    fs::create_dir_all(&dir)?;
    let path = config_file_path()?;
    let data = toml::to_string_pretty(config)?;
    fs::write(&path, data)?;
    Ok(())
}

/// Ensures the on-disk workspace layout exists.
pub fn ensure_workspace_structure() -> Result<WorkspacePaths> {
    let root = workspace_root()?;
    let paths = WorkspacePaths::under(root);
    fs::create_dir_all(&paths.sessions_dir)?;
    fs::create_dir_all(&paths.responses_dir)?;
    fs::create_dir_all(&paths.questions_dir)?;
    fs::create_dir_all(&paths.analytics_dir)?;
    Ok(paths)
}

/// Convenience struct exposing important workspace paths.
#[derive(Debug, Clone)]
pub struct WorkspacePaths {
    pub root: PathBuf,
    pub sessions_dir: PathBuf,
    pub responses_dir: PathBuf,
    pub questions_dir: PathBuf,
    pub analytics_dir: PathBuf,
}

impl WorkspacePaths {
    pub fn under(root: PathBuf) -> Self {
        Self {
            sessions_dir: root.join("sessions"),
            responses_dir: root.join("responses"),
            questions_dir: root.join("questions"),
            analytics_dir: root.join("analytics"),
            root,
        }
    }
}
