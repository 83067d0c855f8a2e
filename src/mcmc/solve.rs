use rand::rngs::StdRng;
use rand::SeedableRng;

use super::cache::{ETerm, RelationCache, RelationRow};
use super::draws::Draws;
use super::hyper::Hyperparameters;
use super::predict::predict_joint;
use super::{Diagnostics, Params};
use crate::data::{AttributeGroups, Dataset};
use crate::error::{Error, Result};
use crate::eval::{Evaluator, Metrics, PosteriorMean};
use crate::math::normal_cdf;
use crate::memory::MemoryLedger;
use crate::metric_log::MetricLog;
use crate::model::Model;
use crate::status::Status;
use crate::task::Task;
use crate::time::{now, until_now};

/// Outcome of one sampler iteration
#[derive(Clone, Debug)]
pub struct Report {
    /// Index of the iteration (starting at 0)
    pub iteration: usize,
    /// Non-finite draws of this iteration
    pub diagnostics: Diagnostics,
    /// Metrics of the current model on the training set
    pub train: Metrics,
    /// Metrics of this iteration's test predictions
    pub test_this: Metrics,
    /// Metrics of the mean test predictions over all iterations
    pub test_all: Metrics,
    /// Metrics of the mean test predictions after the burn-in (`None` during the burn-in)
    pub test_burn_in: Option<Metrics>,
}

/// Gibbs sampler (or ALS solver) for a factorization machine
///
/// Keeps the residual `e` of every training case up to date while drawing one parameter at a
/// time, so that every draw costs time proportional to the number of cases containing the
/// attribute. Attributes of relation tables are drawn on per-relation-row aggregates.
pub struct Sampler<'a> {
    pub(super) model: &'a mut Model,
    pub(super) task: Task,
    pub(super) train: &'a Dataset,
    pub(super) test: &'a Dataset,
    pub(super) params: Params,
    pub(super) groups: AttributeGroups,
    pub(super) hyper: Hyperparameters,
    pub(super) draws: Draws<StdRng>,
    pub(super) train_cache: Vec<ETerm>,
    pub(super) test_cache: Vec<ETerm>,
    pub(super) relations: Vec<RelationCache>,
    /// attributes not owned by a relation table, in ascending order
    pub(super) main_attributes: Vec<usize>,
    pred_this: Vec<f64>,
    mean_all: PosteriorMean,
    mean_burn_in: PosteriorMean,
    evaluator: Evaluator,
    ledger: MemoryLedger,
    iteration: usize,
}

fn check_params(params: &Params) -> Result<()> {
    let priors = [
        ("alpha_0", params.alpha_0),
        ("gamma_0", params.gamma_0),
        ("beta_0", params.beta_0),
    ];
    for (name, value) in priors {
        if !(value.is_finite() && value > 0.0) {
            return Err(Error::Configuration(format!(
                "{name} must be positive, got {value}"
            )));
        }
    }
    if !(params.mu_0.is_finite() && params.w0_mean_0.is_finite()) {
        return Err(Error::Configuration("prior means must be finite".into()));
    }
    Ok(())
}

/// Builds the group of every attribute: groups of the primary table first, then the groups of
/// every relation table. Attributes without an assignment join group 0.
fn joint_groups(train: &Dataset, num_attribute: usize) -> AttributeGroups {
    let mut groups = train
        .groups
        .clone()
        .unwrap_or_else(|| AttributeGroups::single(train.x.num_cols()));
    for join in train.relations.iter() {
        let data = &join.data;
        let own = data
            .groups
            .clone()
            .unwrap_or_else(|| AttributeGroups::single(data.num_features()));
        groups.append_at(data.attr_offset, &own);
    }
    groups.resize(num_attribute, 0);
    groups
}

fn response(task: &Task, prediction: f64) -> f64 {
    match task {
        Task::Regression(task) => task.clamp(prediction),
        Task::Classification(_) => normal_cdf(prediction),
    }
}

impl<'a> Sampler<'a> {
    /// Prepares sampling of `model` (whose parameters serve as the initial state).
    pub fn new(
        model: &'a mut Model,
        task: Task,
        train: &'a Dataset,
        test: &'a Dataset,
        params: Params,
    ) -> Result<Self> {
        check_params(&params)?;
        let n = model.num_attribute();
        train.validate(n)?;
        test.validate(n)?;
        task.check_targets(train, "training")?;
        task.check_targets(test, "test")?;

        let groups = joint_groups(train, n);
        let hyper = Hyperparameters::new(
            groups.num_groups(),
            model.num_factor(),
            params.alpha_0,
            params.mu_0,
            model.params.regw,
            model.params.regv,
        );
        let mut owned = vec![false; n];
        for join in train.relations.iter() {
            let offset = join.data.attr_offset;
            for flag in owned[offset..offset + join.data.num_features()].iter_mut() {
                *flag = true;
            }
        }
        let main_attributes: Vec<usize> = (0..n).filter(|&i| !owned[i]).collect();
        let relations: Vec<RelationCache> =
            train.relations.iter().map(RelationCache::new).collect();

        // make sure the transposes exist before sampling starts
        train.transposed();

        let mut ledger = MemoryLedger::new();
        ledger.reserve::<ETerm>("train e/q-terms", train.num_cases());
        ledger.reserve::<ETerm>("test e/q-terms", test.num_cases());
        ledger.reserve::<f64>("test predictions", 3 * test.num_cases());
        ledger.reserve::<usize>("attribute lists", main_attributes.len());
        for cache in relations.iter() {
            ledger.reserve::<RelationRow>("relation cache", cache.len());
        }
        log::debug!(
            "sampler: {} cases, {} attributes, {} groups, {} relations",
            train.num_cases(),
            n,
            groups.num_groups(),
            relations.len()
        );

        let mut sampler = Sampler {
            draws: Draws::new(StdRng::seed_from_u64(params.seed), params.do_sample),
            mean_all: PosteriorMean::new(test.num_cases()),
            mean_burn_in: PosteriorMean::new(test.num_cases()).with_burn_in(params.burn_in),
            pred_this: vec![0.0; test.num_cases()],
            train_cache: vec![ETerm::default(); train.num_cases()],
            test_cache: vec![ETerm::default(); test.num_cases()],
            evaluator: Evaluator::new(task),
            model,
            task,
            train,
            test,
            params,
            groups,
            hyper,
            relations,
            main_attributes,
            ledger,
            iteration: 0,
        };
        predict_joint(&*sampler.model, train, &mut sampler.train_cache);
        for (term, &target) in sampler.train_cache.iter_mut().zip(train.target.iter()) {
            term.e -= target;
        }
        Ok(sampler)
    }

    /// Runs one iteration: draws all parameters, predicts train and test data and updates the
    /// running means of the test predictions.
    pub fn iterate(&mut self) -> Report {
        let diagnostics = self.draw();
        diagnostics.report();

        predict_joint(&*self.model, self.train, &mut self.train_cache);
        predict_joint(&*self.model, self.test, &mut self.test_cache);

        let task = self.task;
        let train_pred: Vec<f64> = self
            .train_cache
            .iter()
            .map(|t| response(&task, t.e))
            .collect();
        let train = self.evaluator.score(&train_pred, &self.train.target);
        match task {
            Task::Regression(_) => {
                for (term, &target) in self.train_cache.iter_mut().zip(self.train.target.iter()) {
                    term.e -= target;
                }
            }
            Task::Classification(_) => {
                for (term, &target) in self.train_cache.iter_mut().zip(self.train.target.iter()) {
                    let z = if target >= 0.0 {
                        self.draws.positive(term.e)
                    } else {
                        self.draws.negative(term.e)
                    };
                    term.e -= z;
                }
            }
        }

        for (p, term) in self.pred_this.iter_mut().zip(self.test_cache.iter()) {
            *p = response(&task, term.e);
        }
        let i = self.iteration;
        self.mean_all.record(i, &self.pred_this);
        let burned = self.mean_burn_in.record(i, &self.pred_this);
        self.iteration += 1;

        let target = &self.test.target;
        Report {
            iteration: i,
            diagnostics,
            train,
            test_this: self.evaluator.score(&self.pred_this, target),
            test_all: self.evaluator.score(&self.mean_all.means(), target),
            test_burn_in: burned.then(|| self.evaluator.score(&self.mean_burn_in.means(), target)),
        }
    }

    /// Returns the model in its current state.
    pub fn model(&self) -> &Model {
        &*self.model
    }

    /// Returns the current hyperparameters.
    pub fn hyperparameters(&self) -> &Hyperparameters {
        &self.hyper
    }

    /// Returns the tracked residuals of the training cases.
    pub fn residuals(&self) -> Vec<f64> {
        self.train_cache.iter().map(|t| t.e).collect()
    }

    /// Returns the running mean of the test predictions over all iterations.
    pub fn posterior_mean(&self) -> &PosteriorMean {
        &self.mean_all
    }

    /// Returns the running mean of the test predictions after the burn-in.
    pub fn burn_in_mean(&self) -> &PosteriorMean {
        &self.mean_burn_in
    }

    /// Returns this iteration's test predictions on the response scale.
    pub fn predictions(&self) -> &[f64] {
        &self.pred_this
    }

    /// Returns the number of finished iterations.
    pub fn iteration(&self) -> usize {
        self.iteration
    }
}

impl Drop for Sampler<'_> {
    fn drop(&mut self) {
        self.ledger.release_all();
    }
}

/// Samples `model` with `params.num_iter` iterations of the Gibbs sampler (or ALS).
///
/// The returned [`Status`] holds the final metrics, the summed diagnostics and the mean test
/// predictions over all iterations.
pub fn solve(
    model: &mut Model,
    task: &Task,
    train: &Dataset,
    test: &Dataset,
    params: &Params,
    mut log: Option<&mut MetricLog>,
) -> Result<Status> {
    let start = now();
    let mut sampler = Sampler::new(model, *task, train, test, params.clone())?;
    let fields = task.strategy().fields();
    if let Some(log) = log.as_deref_mut() {
        for &field in fields {
            log.ensure_field(field, f64::NAN)?;
            for suffix in ["this", "all", "burn_in"] {
                log.ensure_field(&format!("{field}_mcmc_{suffix}"), f64::NAN)?;
            }
        }
        for field in ["train", "time_learn"] {
            log.ensure_field(field, f64::NAN)?;
        }
    }

    let mut status = Status::new();
    for _ in 0..params.num_iter {
        let iteration_start = now();
        let report = sampler.iterate();
        let time_learn = until_now(iteration_start);
        log::info!(
            "#Iter={:3} Train={:.6} Test={:.6}",
            report.iteration,
            report.train.primary(),
            report.test_all.primary()
        );

        if let Some(log) = log.as_deref_mut() {
            for (field, value) in report.test_all.named() {
                log.set(field, value);
                log.set(&format!("{field}_mcmc_all"), value);
            }
            for (field, value) in report.test_this.named() {
                log.set(&format!("{field}_mcmc_this"), value);
            }
            if let Some(metrics) = report.test_burn_in {
                for (field, value) in metrics.named() {
                    log.set(&format!("{field}_mcmc_burn_in"), value);
                }
            }
            log.set("train", report.train.primary());
            log.set("time_learn", time_learn);
            log.new_line()?;
        }

        status.steps = report.iteration + 1;
        status.diagnostics.merge(&report.diagnostics);
        status.train = Some(report.train);
        status.test = Some(report.test_all);
    }
    status.predictions = sampler.posterior_mean().means();
    status.time = until_now(start);
    Ok(status)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Entry, SparseMatrix};
    use crate::model;
    use crate::relation::{RelationData, RelationJoin};
    use approx::assert_abs_diff_eq;
    use std::sync::Arc;

    fn data(target: Vec<f64>) -> Dataset {
        let x = SparseMatrix::from_rows(&[
            vec![Entry::new(0, 1.0), Entry::new(2, 1.0)],
            vec![Entry::new(1, 1.0), Entry::new(2, 1.0)],
            vec![Entry::new(0, 1.0), Entry::new(3, 1.0)],
            vec![Entry::new(1, 1.0), Entry::new(3, 1.0)],
        ]);
        Dataset::new(x, target).unwrap()
    }

    fn model() -> Model {
        Model::new(model::Params::new(4).with_num_factor(2).with_init(0.0, 0.1))
    }

    #[test]
    fn burn_in_mean_starts_after_burn_in() {
        let train = data(vec![1.0, 2.0, 3.0, 4.0]);
        let mut m = model();
        let task = Task::regression(&train);
        let params = Params::new().with_burn_in(5).with_seed(1);
        let mut sampler = Sampler::new(&mut m, task, &train, &train, params).unwrap();
        for i in 0..7 {
            let report = sampler.iterate();
            assert_eq!(report.iteration, i);
            assert_eq!(report.test_burn_in.is_some(), i >= 5);
        }
        assert_eq!(sampler.posterior_mean().draws(), 7);
        assert_eq!(sampler.burn_in_mean().draws(), 2);
        assert_eq!(sampler.iteration(), 7);
    }

    #[test]
    fn running_means_average_the_iteration_predictions() {
        let train = data(vec![1.0, 2.0, 3.0, 4.0]);
        let mut m = model();
        let task = Task::regression(&train);
        let params = Params::new().with_burn_in(3).with_seed(4);
        let mut sampler = Sampler::new(&mut m, task, &train, &train, params).unwrap();
        let mut history = Vec::new();
        for _ in 0..8 {
            sampler.iterate();
            let predictions = sampler.predictions().to_vec();
            assert!(predictions.iter().all(|p| (1.0..=4.0).contains(p)));
            history.push(predictions);
        }
        let mean = |draws: &[Vec<f64>], c: usize| {
            draws.iter().map(|p| p[c]).sum::<f64>() / draws.len() as f64
        };
        let all = sampler.posterior_mean().means();
        let burned = sampler.burn_in_mean().means();
        for c in 0..train.num_cases() {
            assert_abs_diff_eq!(all[c], mean(&history, c), epsilon = 1e-12);
            assert_abs_diff_eq!(burned[c], mean(&history[3..], c), epsilon = 1e-12);
        }
    }

    #[test]
    fn classification_requires_signed_targets() {
        let train = data(vec![1.0, 0.0, 1.0, 0.0]);
        let mut m = model();
        assert!(matches!(
            Sampler::new(&mut m, Task::classification(), &train, &train, Params::new()),
            Err(Error::DataIntegrity(_))
        ));
    }

    #[test]
    fn classification_requires_signed_test_targets() {
        let train = data(vec![1.0, -1.0, 1.0, -1.0]);
        let test = data(vec![1.0, 0.0, 1.0, 0.0]);
        let mut m = model();
        assert!(matches!(
            Sampler::new(&mut m, Task::classification(), &train, &test, Params::new()),
            Err(Error::DataIntegrity(_))
        ));
    }

    #[test]
    fn overlapping_relation_attributes_are_rejected() {
        let users = Arc::new(RelationData::new(
            SparseMatrix::from_rows(&[vec![Entry::new(0, 1.0)], vec![Entry::new(1, 1.0)]]),
            1,
        ));
        let train = data(vec![1.0, 2.0, 3.0, 4.0])
            .with_relation(RelationJoin::new(vec![0, 1, 1, 0], users).unwrap())
            .unwrap();
        let mut m = model();
        let task = Task::regression(&train);
        assert!(matches!(
            Sampler::new(&mut m, task, &train, &train, Params::als()),
            Err(Error::DataIntegrity(_))
        ));
    }

    #[test]
    fn invalid_priors_are_rejected() {
        let train = data(vec![1.0, 2.0, 3.0, 4.0]);
        let mut m = model();
        let task = Task::regression(&train);
        let params = Params::new().with_priors(0.0, 1.0, 1.0, 0.0);
        assert!(matches!(
            Sampler::new(&mut m, task, &train, &train, params),
            Err(Error::Configuration(_))
        ));
    }

    #[test]
    fn als_classification_separates_classes() {
        let train = data(vec![1.0, -1.0, 1.0, -1.0]);
        let mut m = Model::new(
            model::Params::new(4)
                .with_num_factor(0)
                .with_regularization(1.0, 1.0, 1.0),
        );
        let task = Task::classification();
        let params = Params::als().with_num_iter(10);
        let status = solve(&mut m, &task, &train, &train, &params, None).unwrap();
        assert_eq!(status.steps, 10);
        assert!(m.w[0] > 0.0 && m.w[1] < 0.0);
        match status.test {
            Some(Metrics::Classification { accuracy, .. }) => assert_eq!(accuracy, 1.0),
            other => panic!("unexpected metrics {other:?}"),
        }
        assert_eq!(status.diagnostics.total(), 0);
    }
}
