//! Adaptive item selection.
//!
//! Early in a session the selector explores: it spreads difficulty to
//! localize theta quickly. Once enough responses are in, it exploits:
//! maximum Fisher information at the current estimate. Selection is
//! deterministic given the same pool, theta, and asked set.

use std::collections::HashSet;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::SelectorSettings;
use crate::engine::irt::fisher_information;
use crate::error::EngineError;
use crate::models::Question;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionPhase {
    Exploration,
    DeliberatePractice,
}

/// Phase for the next pick, given how many responses the session has scored.
pub fn phase_for(responses_scored: u32, settings: &SelectorSettings) -> SelectionPhase {
    if responses_scored < settings.exploration_responses {
        SelectionPhase::Exploration
    } else {
        SelectionPhase::DeliberatePractice
    }
}

/// Picks the next question from `pool`, never repeating an id in `asked`.
pub fn select_next<'a>(
    pool: &'a [Question],
    theta: f64,
    asked: &HashSet<String>,
    phase: SelectionPhase,
    settings: &SelectorSettings,
) -> Result<&'a Question, EngineError> {
    let eligible: Vec<&Question> = pool.iter().filter(|q| !asked.contains(&q.id)).collect();
    if eligible.is_empty() {
        return Err(EngineError::PoolExhausted);
    }
    match phase {
        SelectionPhase::Exploration => Ok(select_exploration(&eligible, pool, theta, asked)),
        SelectionPhase::DeliberatePractice => {
            Ok(select_max_information(&eligible, theta, settings))
        }
    }
}

/// Exploration: maximize the smallest difficulty gap to items already asked,
/// so consecutive picks straddle the ability scale. The very first pick
/// anchors at theta itself.
fn select_exploration<'a>(
    eligible: &[&'a Question],
    pool: &[Question],
    theta: f64,
    asked: &HashSet<String>,
) -> &'a Question {
    let asked_difficulties: Vec<f64> = pool
        .iter()
        .filter(|q| asked.contains(&q.id))
        .map(|q| q.irt.b)
        .collect();

    let mut best = eligible[0];
    let mut best_key = exploration_key(best, theta, &asked_difficulties);
    for &candidate in &eligible[1..] {
        let key = exploration_key(candidate, theta, &asked_difficulties);
        if better_spread(key, best_key) || (key == best_key && candidate.id < best.id) {
            best = candidate;
            best_key = key;
        }
    }
    best
}

/// (spread to asked items, larger wins; distance to theta, smaller wins).
fn exploration_key(question: &Question, theta: f64, asked_difficulties: &[f64]) -> (f64, f64) {
    let spread = asked_difficulties
        .iter()
        .map(|b| (question.irt.b - b).abs())
        .fold(f64::INFINITY, f64::min);
    let spread = if spread.is_finite() { spread } else { 0.0 };
    (spread, (question.irt.b - theta).abs())
}

fn better_spread(key: (f64, f64), best: (f64, f64)) -> bool {
    key.0 > best.0 || (key.0 == best.0 && key.1 < best.1)
}

/// Exploitation: maximum Fisher information at the current theta. Candidates
/// within `info_epsilon` of each other tie-break on smaller `|b - theta|`,
/// then lowest question id.
fn select_max_information<'a>(
    eligible: &[&'a Question],
    theta: f64,
    settings: &SelectorSettings,
) -> &'a Question {
    let scored: Vec<(f64, &Question)> = eligible
        .par_iter()
        .map(|q| (fisher_information(theta, &q.irt), *q))
        .collect();

    let mut best = scored[0];
    for &(info, candidate) in &scored[1..] {
        if info > best.0 + settings.info_epsilon {
            best = (info, candidate);
            continue;
        }
        if (info - best.0).abs() <= settings.info_epsilon {
            let dist = (candidate.irt.b - theta).abs();
            let best_dist = (best.1.irt.b - theta).abs();
            if dist < best_dist || (dist == best_dist && candidate.id < best.1.id) {
                best = (info, candidate);
            }
        }
    }
    best.1
}
