pub mod estimator;
pub mod irt;
pub mod selector;

pub use estimator::{apply_update, update_theta, ThetaUpdate};
pub use irt::{fisher_information, probability_correct};
pub use selector::{phase_for, select_next, SelectionPhase};
