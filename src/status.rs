use serde::{Deserialize, Serialize};

use crate::eval::Metrics;
use crate::mcmc::Diagnostics;

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
/// A struct containing information about the outcome of a training run
pub struct Status {
    /// Number of conducted epochs (SGD) or iterations (Gibbs/ALS)
    pub steps: usize,
    /// Elapsed time (in seconds)
    pub time: f64,
    /// Metrics on the training set after the last step
    pub train: Option<Metrics>,
    /// Metrics on the test set after the last step
    pub test: Option<Metrics>,
    /// Counts of non-finite draws (always zero for SGD)
    pub diagnostics: Diagnostics,
    /// Final test predictions on the response scale (posterior mean for the sampler)
    pub predictions: Vec<f64>,
}

impl Status {
    /// Create a [`Status`] struct for a run that did not conduct any step yet
    pub fn new() -> Status {
        Status::default()
    }
}
