use serde::{Deserialize, Serialize};

/// Latent-ability estimate ("theta") for a learner, with the standard error
/// that narrows as more informative items are answered.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AbilityEstimate {
    pub theta: f64,
    pub std_err: f64,
    pub responses_scored: u32,
}

impl AbilityEstimate {
    /// First-ever estimate for a learner: configured prior with wide error.
    pub fn prior(theta: f64, std_err: f64) -> Self {
        Self {
            theta,
            std_err,
            responses_scored: 0,
        }
    }
}
