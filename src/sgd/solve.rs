use crate::data::Dataset;
use crate::error::{Error, Result};
use crate::eval::{Estimate, Evaluator, Metrics};
use crate::math::sigmoid;
use crate::metric_log::MetricLog;
use crate::model::{Interactions, Model};
use crate::status::Status;
use crate::task::{Classification, Task};
use crate::time::{now, until_now};

use super::update::{pair_sgd_step, sgd_step, PairGradient};
use super::Params;

fn check_params(params: &Params) -> Result<()> {
    if !(params.learn_rate.is_finite() && params.learn_rate > 0.0) {
        return Err(Error::Configuration(format!(
            "learning rate must be positive, got {}",
            params.learn_rate
        )));
    }
    Ok(())
}

fn check_data(data: &Dataset, model: &Model, name: &str) -> Result<()> {
    if !data.relations.is_empty() {
        return Err(Error::Configuration(format!(
            "SGD does not support relations ({name} data has {})",
            data.relations.len()
        )));
    }
    data.validate(model.num_attribute())
}

/// Trains `model` on `train` with pointwise SGD and evaluates it on `test` after every epoch.
///
/// Rows are visited in their stored order. If `log` is given, one record per epoch is written.
pub fn solve(
    model: &mut Model,
    task: &Task,
    train: &Dataset,
    test: &Dataset,
    params: &Params,
    mut log: Option<&mut MetricLog>,
) -> Result<Status> {
    check_params(params)?;
    check_data(train, model, "training")?;
    check_data(test, model, "test")?;
    task.check_targets(train, "training")?;
    task.check_targets(test, "test")?;

    let strategy = task.strategy();
    let evaluator = Evaluator::new(*task);
    if let Some(log) = log.as_deref_mut() {
        for &field in strategy.fields() {
            log.ensure_field(field, f64::NAN)?;
        }
        for field in ["train", "time_learn", "time_pred"] {
            log.ensure_field(field, f64::NAN)?;
        }
    }

    log::info!(
        "SGD: rows are visited in their stored order, shuffle the training data for best results"
    );
    let start = now();
    let mut status = Status::new();
    let mut ws = Interactions::new(model.num_factor());
    for epoch in 0..params.num_iter {
        let epoch_start = now();
        for (row, &target) in train.x.rows().zip(train.target.iter()) {
            let p = model.predict_with(row, &mut ws);
            let mult = strategy.multiplier(p, target);
            sgd_step(model, params.learn_rate, row, mult, &ws);
        }
        let time_learn = until_now(epoch_start);

        let train_metrics = evaluator.evaluate(model, train, Estimate::Point);
        let pred_start = now();
        let test_metrics = evaluator.evaluate(model, test, Estimate::Point);
        let time_pred = until_now(pred_start);
        log::info!(
            "#Iter={epoch:3} Train={:.6} Test={:.6}",
            train_metrics.primary(),
            test_metrics.primary()
        );

        if let Some(log) = log.as_deref_mut() {
            for (field, value) in test_metrics.named() {
                log.set(field, value);
            }
            log.set("train", train_metrics.primary());
            log.set("time_learn", time_learn);
            log.set("time_pred", time_pred);
            log.new_line()?;
        }

        status.steps = epoch + 1;
        status.train = Some(train_metrics);
        status.test = Some(test_metrics);
    }
    status.time = until_now(start);
    status.predictions = evaluator.predict(model, test, Estimate::Point);
    Ok(status)
}

/// Trains `model` with pairwise SGD so that row `pos` of every pair scores higher than row `neg`.
///
/// The loss of a pair is `-ln σ(ŷ(pos) - ŷ(neg))`. After every epoch the fraction of correctly
/// ordered pairs and their mean log-loss are reported.
pub fn solve_pairs(
    model: &mut Model,
    train: &Dataset,
    pairs: &[(usize, usize)],
    params: &Params,
    mut log: Option<&mut MetricLog>,
) -> Result<Status> {
    check_params(params)?;
    check_data(train, model, "training")?;
    let n = train.num_cases();
    if let Some(&(pos, neg)) = pairs.iter().find(|&&(pos, neg)| pos >= n || neg >= n) {
        return Err(Error::DataIntegrity(format!(
            "pair ({pos}, {neg}) references a row beyond {n} cases"
        )));
    }
    if let Some(log) = log.as_deref_mut() {
        for field in ["pair_accuracy", "pair_log_loss", "time_learn"] {
            log.ensure_field(field, f64::NAN)?;
        }
    }

    let start = now();
    let mut status = Status::new();
    let mut ws_pos = Interactions::new(model.num_factor());
    let mut ws_neg = Interactions::new(model.num_factor());
    let mut grad = PairGradient::new(model.num_attribute());
    for epoch in 0..params.num_iter {
        let epoch_start = now();
        for &(pos, neg) in pairs {
            let (x_pos, x_neg) = (train.x.row(pos), train.x.row(neg));
            let p_pos = model.predict_with(x_pos, &mut ws_pos);
            let p_neg = model.predict_with(x_neg, &mut ws_neg);
            let mult = -(1.0 - sigmoid(p_pos - p_neg));
            pair_sgd_step(
                model,
                params.learn_rate,
                x_pos,
                x_neg,
                mult,
                &ws_pos,
                &ws_neg,
                &mut grad,
            );
        }
        let time_learn = until_now(epoch_start);

        let metrics = score_pairs(model, train, pairs);
        if let Metrics::Classification { accuracy, log_loss } = metrics {
            log::info!("#Iter={epoch:3} PairAccuracy={accuracy:.6} PairLogLoss={log_loss:.6}");
            if let Some(log) = log.as_deref_mut() {
                log.set("pair_accuracy", accuracy);
                log.set("pair_log_loss", log_loss);
                log.set("time_learn", time_learn);
                log.new_line()?;
            }
        }
        status.steps = epoch + 1;
        status.train = Some(metrics);
    }
    status.time = until_now(start);
    status.predictions = pairs
        .iter()
        .map(|&(pos, neg)| sigmoid(model.predict(train.x.row(pos)) - model.predict(train.x.row(neg))))
        .collect();
    Ok(status)
}

fn score_pairs(model: &Model, data: &Dataset, pairs: &[(usize, usize)]) -> Metrics {
    let mut ws = Interactions::new(model.num_factor());
    let mut probabilities = Vec::with_capacity(pairs.len());
    for &(pos, neg) in pairs {
        let p_pos = model.predict_with(data.x.row(pos), &mut ws);
        let p_neg = model.predict_with(data.x.row(neg), &mut ws);
        probabilities.push(sigmoid(p_pos - p_neg));
    }
    let n = pairs.len() as f64;
    let accuracy = probabilities
        .iter()
        .filter(|&&p| Classification::is_correct(p, 1.0))
        .count() as f64
        / n;
    let log_loss = probabilities
        .iter()
        .map(|&p| Classification::log_loss(p, 1.0))
        .sum::<f64>()
        / n;
    Metrics::Classification { accuracy, log_loss }
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
            vec![Entry::new(0, 1.0)],
            vec![Entry::new(1, 1.0)],
            vec![Entry::new(0, 1.0), Entry::new(1, 1.0)],
        ]);
        Dataset::new(x, target).unwrap()
    }

    fn model(num_factor: usize) -> Model {
        Model::new(
            model::Params::new(2)
                .with_num_factor(num_factor)
                .with_init(0.0, 0.0),
        )
    }

    #[test]
    fn rejects_relations() {
        let relation = Arc::new(RelationData::new(
            SparseMatrix::from_rows(&[vec![Entry::new(0, 1.0)]]),
            2,
        ));
        let train = data(vec![1.0, 1.0, 1.0])
            .with_relation(RelationJoin::new(vec![0, 0, 0], relation).unwrap())
            .unwrap();
        let test = data(vec![1.0, 1.0, 1.0]);
        let mut m = Model::new(model::Params::new(3));
        let task = Task::regression(&train);
        assert!(matches!(
            solve(&mut m, &task, &train, &test, &Params::new(), None),
            Err(Error::Configuration(_))
        ));
    }

    #[test]
    fn rejects_invalid_learning_rate() {
        let train = data(vec![1.0, 1.0, 1.0]);
        let task = Task::regression(&train);
        let params = Params::new().with_learn_rate(0.0);
        assert!(matches!(
            solve(&mut model(1), &task, &train, &train, &params, None),
            Err(Error::Configuration(_))
        ));
    }

    #[test]
    fn rejects_unknown_features() {
        let train = data(vec![1.0, 1.0, 1.0]);
        let task = Task::regression(&train);
        let mut m = Model::new(model::Params::new(1).with_num_factor(0));
        assert!(matches!(
            solve(&mut m, &task, &train, &train, &Params::new(), None),
            Err(Error::DataIntegrity(_))
        ));
    }

    #[test]
    fn classification_rejects_zero_one_targets() {
        let train = data(vec![1.0, 0.0, 1.0]);
        let signed = data(vec![1.0, -1.0, 1.0]);
        let task = Task::classification();
        let params = Params::new().with_num_iter(50);
        assert!(matches!(
            solve(&mut model(1), &task, &train, &signed, &params, None),
            Err(Error::DataIntegrity(_))
        ));
        assert!(matches!(
            solve(&mut model(1), &task, &signed, &train, &params, None),
            Err(Error::DataIntegrity(_))
        ));
        assert!(solve(&mut model(1), &task, &signed, &signed, &params, None).is_ok());
    }

    #[test]
    fn ranking_learns_pair_order() {
        let train = data(vec![0.0, 0.0, 0.0]);
        let mut m = model(1);
        let params = Params::new().with_num_iter(50).with_learn_rate(0.1);
        let status = solve_pairs(&mut m, &train, &[(0, 1), (2, 1)], &params, None).unwrap();
        assert_eq!(status.steps, 50);
        assert!(m.w[0] > m.w[1]);
        match status.train {
            Some(Metrics::Classification { accuracy, .. }) => assert_abs_diff_eq!(accuracy, 1.0),
            other => panic!("unexpected metrics {other:?}"),
        }
        assert!(status.predictions.iter().all(|&p| p > 0.5));
    }

    #[test]
    fn pair_index_out_of_range() {
        let train = data(vec![0.0, 0.0, 0.0]);
        assert!(matches!(
            solve_pairs(&mut model(1), &train, &[(0, 3)], &Params::new(), None),
            Err(Error::DataIntegrity(_))
        ));
    }
}
