//! 3-parameter-logistic item response model.
//!
//! Pure functions over validated `IrtParams`. Boundary conditions of the
//! logistic (c close to 1, p collapsing onto the guessing floor) are guarded
//! to zero information rather than surfaced as errors.

use crate::models::IrtParams;

/// Probability that a learner at `theta` answers the item correctly:
/// `p = c + (1 - c) / (1 + exp(-a (theta - b)))`. Always in `(c, 1)`.
pub fn probability_correct(theta: f64, item: &IrtParams) -> f64 {
    let logistic = 1.0 / (1.0 + (-item.a * (theta - item.b)).exp());
    item.c + (1.0 - item.c) * logistic
}

/// Fisher information of the item at `theta`:
/// `I = a^2 * (p - c)^2 / (1 - c)^2 * (1 - p) / p`.
///
/// Returns 0.0 instead of NaN when the denominators collapse (`c -> 1`, or
/// `p` indistinguishable from `c` in floating point).
pub fn fisher_information(theta: f64, item: &IrtParams) -> f64 {
    let one_minus_c = 1.0 - item.c;
    if one_minus_c <= f64::EPSILON {
        return 0.0;
    }
    let p = probability_correct(theta, item);
    if p <= 0.0 || (p - item.c).abs() < f64::EPSILON {
        return 0.0;
    }
    let ratio = (p - item.c) / one_minus_c;
    let info = item.a * item.a * ratio * ratio * (1.0 - p) / p;
    if info.is_finite() && info > 0.0 {
        info
    } else {
        0.0
    }
}
