use serde::{Deserialize, Serialize};

use crate::eval::Metrics;

/// Squared loss with predictions clipped to the range of the training targets
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Regression {
    /// Smallest admissible prediction
    pub min_target: f64,
    /// Largest admissible prediction
    pub max_target: f64,
}

impl Regression {
    /// Creates a [`Regression`] task clipping predictions to `[min_target, max_target]`.
    pub fn new(min_target: f64, max_target: f64) -> Self {
        Regression {
            min_target,
            max_target,
        }
    }

    /// Clips a prediction to the target range.
    pub fn clamp(&self, prediction: f64) -> f64 {
        prediction.min(self.max_target).max(self.min_target)
    }
}

impl super::TaskStrategy for Regression {
    fn multiplier(&self, prediction: f64, target: f64) -> f64 {
        self.clamp(prediction) - target
    }

    fn response(&self, prediction: f64) -> f64 {
        self.clamp(prediction)
    }

    fn score(&self, predictions: &[f64], targets: &[f64]) -> Metrics {
        let n = predictions.len() as f64;
        let (sum_sqr, sum_abs) = predictions.iter().zip(targets).fold(
            (0.0, 0.0),
            |(sq, ab), (&p, &t)| {
                let err = self.clamp(p) - t;
                (sq + err * err, ab + err.abs())
            },
        );
        Metrics::Regression {
            rmse: (sum_sqr / n).sqrt(),
            mae: sum_abs / n,
        }
    }

    fn fields(&self) -> &'static [&'static str] {
        &["rmse", "mae"]
    }
}
