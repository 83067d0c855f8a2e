//! Learning tasks
//!
//! A task fixes the loss gradient used by SGD, the mapping of raw model outputs to the response
//! scale (clipped value or probability) and the metrics a prediction is scored with.
pub mod classification;
pub mod regression;

pub use classification::Classification;
pub use regression::Regression;

use serde::{Deserialize, Serialize};

use crate::data::Dataset;
use crate::error::{Error, Result};
use crate::eval::Metrics;

/// Behavior specific to a learning task
pub trait TaskStrategy {
    /// Derivative of the loss with respect to the prediction.
    fn multiplier(&self, prediction: f64, target: f64) -> f64;
    /// Maps a raw model output to the response scale.
    fn response(&self, prediction: f64) -> f64;
    /// Scores predictions given on the response scale.
    fn score(&self, predictions: &[f64], targets: &[f64]) -> Metrics;
    /// Names of the metrics returned by [`TaskStrategy::score`].
    fn fields(&self) -> &'static [&'static str];
}

/// Learning task of a training run
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum Task {
    /// Real-valued targets
    Regression(Regression),
    /// Targets in `{-1, +1}`
    Classification(Classification),
}

impl Task {
    /// Identifier of the regression task
    pub const REGRESSION: u8 = 0;
    /// Identifier of the classification task
    pub const CLASSIFICATION: u8 = 1;

    /// Creates a regression task whose predictions are clipped to the target range of `train`.
    pub fn regression(train: &Dataset) -> Self {
        let (min_target, max_target) = train.target_bounds();
        Task::Regression(Regression::new(min_target, max_target))
    }

    /// Creates a classification task.
    pub fn classification() -> Self {
        Task::Classification(Classification)
    }

    /// Selects the task by its numeric identifier.
    pub fn from_id(id: u8, train: &Dataset) -> Result<Self> {
        match id {
            Self::REGRESSION => Ok(Self::regression(train)),
            Self::CLASSIFICATION => Ok(Self::classification()),
            _ => Err(Error::Configuration(format!("unknown task {id}"))),
        }
    }

    /// Selects the task by name (`r`/`regression` or `c`/`classification`).
    pub fn from_name(name: &str, train: &Dataset) -> Result<Self> {
        match name {
            "r" | "regression" => Ok(Self::regression(train)),
            "c" | "classification" => Ok(Self::classification()),
            _ => Err(Error::Configuration(format!("unknown task {name:?}"))),
        }
    }

    /// Checks that `data` holds targets the task can learn from: classification targets must be
    /// `-1` or `+1`. `name` is only used for error messages.
    pub fn check_targets(&self, data: &Dataset, name: &str) -> Result<()> {
        if let Task::Classification(_) = self {
            if let Some(t) = data.target.iter().find(|&&t| t != 1.0 && t != -1.0) {
                return Err(Error::DataIntegrity(format!(
                    "classification targets of the {name} data must be -1 or +1, found {t}"
                )));
            }
        }
        Ok(())
    }

    /// Returns the behavior of the task.
    pub fn strategy(&self) -> &dyn TaskStrategy {
        match self {
            Task::Regression(task) => task,
            Task::Classification(task) => task,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Entry, SparseMatrix};

    fn train() -> Dataset {
        let x = SparseMatrix::from_rows(&[vec![Entry::new(0, 1.0)], vec![Entry::new(0, 2.0)]]);
        Dataset::new(x, vec![1.0, 5.0]).unwrap()
    }

    #[test]
    fn regression_takes_bounds_from_training_data() {
        match Task::from_id(Task::REGRESSION, &train()).unwrap() {
            Task::Regression(task) => {
                assert_eq!(task.min_target, 1.0);
                assert_eq!(task.max_target, 5.0);
            }
            other => panic!("unexpected task {other:?}"),
        }
    }

    #[test]
    fn unknown_task_is_configuration_error() {
        assert!(matches!(
            Task::from_id(7, &train()),
            Err(Error::Configuration(_))
        ));
        assert!(matches!(
            Task::from_name("ranking", &train()),
            Err(Error::Configuration(_))
        ));
    }

    #[test]
    fn classification_targets_must_be_signed() {
        let x = SparseMatrix::from_rows(&[vec![Entry::new(0, 1.0)], vec![Entry::new(0, 2.0)]]);
        let zero_one = Dataset::new(x, vec![1.0, 0.0]).unwrap();
        assert!(matches!(
            Task::classification().check_targets(&zero_one, "training"),
            Err(Error::DataIntegrity(_))
        ));
        let signed = zero_one.binarize_targets();
        assert!(Task::classification().check_targets(&signed, "training").is_ok());
        assert!(Task::regression(&train()).check_targets(&train(), "training").is_ok());
    }

    #[test]
    fn names_select_tasks() {
        assert_eq!(
            Task::from_name("c", &train()).unwrap(),
            Task::classification()
        );
        assert_eq!(
            Task::from_name("regression", &train()).unwrap().strategy().fields(),
            &["rmse", "mae"]
        );
    }
}
