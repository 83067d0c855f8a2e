use ndarray::Array2;
use serde::{Deserialize, Serialize};

/// Noise precision and the priors of linear weights and factors (one per attribute group)
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Hyperparameters {
    /// Precision of the observation noise
    pub alpha: f64,
    /// Mean of the linear weights per group
    pub w_mu: Vec<f64>,
    /// Precision of the linear weights per group
    pub w_lambda: Vec<f64>,
    /// Mean of the factors per group and factor (`num_groups × num_factor`)
    pub v_mu: Array2<f64>,
    /// Precision of the factors per group and factor (`num_groups × num_factor`)
    pub v_lambda: Array2<f64>,
}

impl Hyperparameters {
    /// Creates hyperparameters with the given initial values for every group and factor.
    pub fn new(
        num_groups: usize,
        num_factor: usize,
        alpha: f64,
        mu: f64,
        w_lambda: f64,
        v_lambda: f64,
    ) -> Self {
        Hyperparameters {
            alpha,
            w_mu: vec![mu; num_groups],
            w_lambda: vec![w_lambda; num_groups],
            v_mu: Array2::from_elem((num_groups, num_factor), mu),
            v_lambda: Array2::from_elem((num_groups, num_factor), v_lambda),
        }
    }
}
