use serde::{Deserialize, Serialize};

use crate::eval::Metrics;
use crate::math::sigmoid;

/// Binary classification with targets in `{-1, +1}` and logistic loss
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Classification;

/// Probabilities are clipped to this range before taking logarithms.
const PROB_CLIP: (f64, f64) = (0.01, 0.99);

impl Classification {
    /// Checks whether a probability agrees with the sign of the target.
    pub fn is_correct(probability: f64, target: f64) -> bool {
        (probability >= 0.5) == (target >= 0.0)
    }

    /// Computes the (base 10) log-loss of a single probability.
    pub fn log_loss(probability: f64, target: f64) -> f64 {
        let m = if target >= 0.0 { 1.0 } else { 0.0 };
        let p = probability.max(PROB_CLIP.0).min(PROB_CLIP.1);
        -(m * p.log10() + (1.0 - m) * (1.0 - p).log10())
    }
}

impl super::TaskStrategy for Classification {
    fn multiplier(&self, prediction: f64, target: f64) -> f64 {
        -target * (1.0 - sigmoid(target * prediction))
    }

    fn response(&self, prediction: f64) -> f64 {
        sigmoid(prediction)
    }

    fn score(&self, predictions: &[f64], targets: &[f64]) -> Metrics {
        let n = predictions.len() as f64;
        let (correct, loss) =
            predictions
                .iter()
                .zip(targets)
                .fold((0usize, 0.0), |(correct, loss), (&p, &t)| {
                    (
                        correct + Self::is_correct(p, t) as usize,
                        loss + Self::log_loss(p, t),
                    )
                });
        Metrics::Classification {
            accuracy: correct as f64 / n,
            log_loss: loss / n,
        }
    }

    fn fields(&self) -> &'static [&'static str] {
        &["accuracy", "log_loss"]
    }
}
