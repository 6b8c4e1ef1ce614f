//! Theta estimation.
//!
//! One damped Newton step of the 3PL log-likelihood per response, clamped so
//! a single answer can only move theta by a bounded delta.

use serde::{Deserialize, Serialize};

use crate::config::EstimatorSettings;
use crate::engine::irt::{fisher_information, probability_correct};
use crate::models::{AbilityEstimate, IrtParams};

/// Outcome of scoring one response against the current estimate.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ThetaUpdate {
    pub theta_after: f64,
    pub std_err_after: f64,
    pub delta: f64,
}

/// Updates the ability estimate for one scored response.
///
/// The score function of the 3PL is `S = a (u - p)(p - c) / (p (1 - c))`;
/// the raw Newton step `S / I` is damped by `step_scale` and clamped to
/// `max_step`. When the item carries no usable information at the current
/// theta the step falls back to a fixed nudge in the direction of the score.
pub fn update_theta(
    estimate: &AbilityEstimate,
    item: &IrtParams,
    is_correct: bool,
    settings: &EstimatorSettings,
) -> ThetaUpdate {
    let p = probability_correct(estimate.theta, item);
    let info = fisher_information(estimate.theta, item);
    let u = if is_correct { 1.0 } else { 0.0 };
    let score = item.a * (u - p) * (p - item.c) / (p * (1.0 - item.c));

    let raw_step = if info > MIN_USABLE_INFO {
        score / info
    } else {
        score.signum() * settings.max_step
    };
    let delta = (settings.step_scale * raw_step).clamp(-settings.max_step, settings.max_step);

    // Precision accumulates; the error never widens from one response.
    let precision = 1.0 / (estimate.std_err * estimate.std_err) + info;
    let std_err_after = (1.0 / precision).sqrt();

    ThetaUpdate {
        theta_after: estimate.theta + delta,
        std_err_after,
        delta,
    }
}

/// Applies an update, advancing the response counter.
pub fn apply_update(estimate: &AbilityEstimate, update: &ThetaUpdate) -> AbilityEstimate {
    AbilityEstimate {
        theta: update.theta_after,
        std_err: update.std_err_after,
        responses_scored: estimate.responses_scored + 1,
    }
}

const MIN_USABLE_INFO: f64 = 1e-9;
