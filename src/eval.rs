//! Evaluation of models on datasets
use serde::{Deserialize, Serialize};

use crate::data::{Dataset, Entry};
use crate::model::{Interactions, Model};
use crate::task::Task;

/// Quality of a set of predictions
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum Metrics {
    /// Errors of clipped predictions
    Regression {
        /// Root mean squared error
        rmse: f64,
        /// Mean absolute error
        mae: f64,
    },
    /// Quality of predicted probabilities
    Classification {
        /// Fraction of cases whose predicted class matches the target
        accuracy: f64,
        /// Mean (base 10) log-loss with probabilities clipped to `[0.01, 0.99]`
        log_loss: f64,
    },
}

impl Metrics {
    /// Returns the main metric (RMSE or accuracy).
    pub fn primary(&self) -> f64 {
        match *self {
            Metrics::Regression { rmse, .. } => rmse,
            Metrics::Classification { accuracy, .. } => accuracy,
        }
    }

    /// Returns all metrics with their names.
    pub fn named(&self) -> [(&'static str, f64); 2] {
        match *self {
            Metrics::Regression { rmse, mae } => [("rmse", rmse), ("mae", mae)],
            Metrics::Classification { accuracy, log_loss } => {
                [("accuracy", accuracy), ("log_loss", log_loss)]
            }
        }
    }
}

/// Running mean of per-case predictions over sampler iterations
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PosteriorMean {
    sums: Vec<f64>,
    draws: usize,
    burn_in: usize,
}

impl PosteriorMean {
    /// Creates an empty running mean for `num_cases` cases.
    pub fn new(num_cases: usize) -> Self {
        PosteriorMean {
            sums: vec![0.0; num_cases],
            draws: 0,
            burn_in: 0,
        }
    }

    /// Ignores the draws of the first `burn_in` iterations.
    pub fn with_burn_in(mut self, burn_in: usize) -> Self {
        self.burn_in = burn_in;
        self
    }

    /// Adds the predictions of `iteration`; returns whether they were accumulated.
    pub fn record(&mut self, iteration: usize, predictions: &[f64]) -> bool {
        if iteration < self.burn_in {
            return false;
        }
        for (s, &p) in self.sums.iter_mut().zip(predictions) {
            *s += p;
        }
        self.draws += 1;
        true
    }

    /// Returns the number of accumulated draws.
    pub fn draws(&self) -> usize {
        self.draws
    }

    /// Returns the mean prediction of case `c` (`NaN` before the first draw).
    pub fn mean(&self, c: usize) -> f64 {
        if self.draws == 0 {
            return f64::NAN;
        }
        self.sums[c] / self.draws as f64
    }

    /// Returns the mean predictions of all cases.
    pub fn means(&self) -> Vec<f64> {
        (0..self.sums.len()).map(|c| self.mean(c)).collect()
    }
}

/// How the prediction of a single case is obtained
#[derive(Clone, Copy, Debug)]
pub enum Estimate<'a> {
    /// Current model parameters
    Point,
    /// Mean over the stored predictions of a sampler
    PosteriorMean(&'a PosteriorMean),
}

impl Estimate<'_> {
    /// Predicts case `c` on the response scale of `task`.
    pub fn predict_case(
        &self,
        model: &Model,
        task: &Task,
        c: usize,
        row: &[Entry],
        ws: &mut Interactions,
    ) -> f64 {
        match self {
            Estimate::Point => task.strategy().response(model.predict_with(row, ws)),
            Estimate::PosteriorMean(mean) => mean.mean(c),
        }
    }
}

/// Computes predictions and metrics for a task
#[derive(Clone, Copy, Debug)]
pub struct Evaluator {
    /// Task the predictions are scored for
    pub task: Task,
}

impl Evaluator {
    /// Creates an [`Evaluator`] for `task`.
    pub fn new(task: Task) -> Self {
        Evaluator { task }
    }

    /// Predicts all cases of `data` on the response scale.
    pub fn predict(&self, model: &Model, data: &Dataset, estimate: Estimate<'_>) -> Vec<f64> {
        let mut ws = Interactions::new(model.num_factor());
        let mut row = Vec::new();
        (0..data.num_cases())
            .map(|c| {
                let row = if data.relations.is_empty() {
                    data.x.row(c)
                } else {
                    data.expand_row(c, &mut row);
                    row.as_slice()
                };
                estimate.predict_case(model, &self.task, c, row, &mut ws)
            })
            .collect()
    }

    /// Predicts all cases of `data` and scores them against the targets.
    pub fn evaluate(&self, model: &Model, data: &Dataset, estimate: Estimate<'_>) -> Metrics {
        let predictions = self.predict(model, data, estimate);
        self.score(&predictions, &data.target)
    }

    /// Scores predictions given on the response scale.
    pub fn score(&self, predictions: &[f64], targets: &[f64]) -> Metrics {
        self.task.strategy().score(predictions, targets)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::SparseMatrix;
    use crate::model::Params;
    use approx::assert_abs_diff_eq;

    fn data() -> Dataset {
        let x = SparseMatrix::from_rows(&[
            vec![Entry::new(0, 1.0)],
            vec![Entry::new(1, 1.0)],
            vec![Entry::new(0, 1.0), Entry::new(1, 1.0)],
        ]);
        Dataset::new(x, vec![1.0, -1.0, 1.0]).unwrap()
    }

    fn model() -> Model {
        let mut model = Model::new(Params::new(2).with_num_factor(0));
        model.w[0] = 2.0;
        model.w[1] = -1.0;
        model
    }

    #[test]
    fn running_mean_is_arithmetic_mean() {
        let mut all = PosteriorMean::new(2);
        let mut burned = PosteriorMean::new(2).with_burn_in(5);
        let draws: Vec<[f64; 2]> = (0..8).map(|i| [i as f64, 2.0 * i as f64]).collect();
        for (i, d) in draws.iter().enumerate() {
            all.record(i, d);
            burned.record(i, d);
            let expected: f64 = (0..=i).map(|j| j as f64).sum::<f64>() / (i + 1) as f64;
            assert_abs_diff_eq!(all.mean(0), expected, epsilon = 1e-12);
            if i < 5 {
                assert_eq!(burned.draws(), 0);
                assert!(burned.mean(0).is_nan());
            } else {
                let expected: f64 = (5..=i).map(|j| j as f64).sum::<f64>() / (i - 4) as f64;
                assert_abs_diff_eq!(burned.mean(0), expected, epsilon = 1e-12);
                assert_abs_diff_eq!(burned.mean(1), 2.0 * expected, epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn regression_metrics_of_point_estimate() {
        let data = data();
        let evaluator = Evaluator::new(Task::regression(&data));
        // predictions 2, -1, 1 clipped to [-1, 1]: 1, -1, 1
        let metrics = evaluator.evaluate(&model(), &data, Estimate::Point);
        assert_abs_diff_eq!(metrics.primary(), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn classification_accuracy_uses_sign() {
        let mut data = data();
        data.target = vec![1.0, 1.0, -1.0];
        let evaluator = Evaluator::new(Task::classification());
        match evaluator.evaluate(&model(), &data, Estimate::Point) {
            Metrics::Classification { accuracy, .. } => {
                assert_abs_diff_eq!(accuracy, 1.0 / 3.0, epsilon = 1e-12)
            }
            other => panic!("unexpected metrics {other:?}"),
        }
    }

    #[test]
    fn posterior_mean_ignores_model() {
        let data = data();
        let mut mean = PosteriorMean::new(3);
        mean.record(0, &[1.0, -1.0, 1.0]);
        mean.record(1, &[1.0, -1.0, 0.0]);
        let evaluator = Evaluator::new(Task::regression(&data));
        let predictions = evaluator.predict(&model(), &data, Estimate::PosteriorMean(&mean));
        assert_eq!(predictions, vec![1.0, -1.0, 0.5]);
    }
}
