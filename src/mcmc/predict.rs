use super::cache::ETerm;
use crate::data::Dataset;
use crate::model::Model;

/// Writes the prediction of every case of `data` (including joined relation rows) to `e`.
///
/// Contributions of relation rows are computed once per relation row and shared by all cases
/// referencing it.
pub(crate) fn predict_joint(model: &Model, data: &Dataset, cache: &mut [ETerm]) {
    let p = &model.params;
    let n = data.num_cases();
    for (term, row) in cache.iter_mut().zip(data.x.rows()) {
        term.e = if p.use_bias { model.w0 } else { 0.0 };
        if p.use_linear {
            term.e += row.iter().map(|x| model.w[x.id] * x.value).sum::<f64>();
        }
    }
    if p.use_linear {
        for join in data.relations.iter() {
            let offset = join.data.attr_offset;
            let linear: Vec<f64> = join
                .data
                .x
                .rows()
                .map(|row| row.iter().map(|x| model.w[offset + x.id] * x.value).sum())
                .collect();
            for (c, term) in cache.iter_mut().enumerate() {
                term.e += linear[join.relation_row(c)];
            }
        }
    }

    let mut sum = vec![0.0; n];
    let mut sum_sqr = vec![0.0; n];
    for vf in model.v.outer_iter() {
        for (c, row) in data.x.rows().enumerate() {
            let (mut s, mut ss) = (0.0, 0.0);
            for x in row {
                let d = vf[x.id] * x.value;
                s += d;
                ss += d * d;
            }
            sum[c] = s;
            sum_sqr[c] = ss;
        }
        for join in data.relations.iter() {
            let offset = join.data.attr_offset;
            let partial: Vec<(f64, f64)> = join
                .data
                .x
                .rows()
                .map(|row| {
                    row.iter().fold((0.0, 0.0), |(s, ss), x| {
                        let d = vf[offset + x.id] * x.value;
                        (s + d, ss + d * d)
                    })
                })
                .collect();
            for c in 0..n {
                let (s, ss) = partial[join.relation_row(c)];
                sum[c] += s;
                sum_sqr[c] += ss;
            }
        }
        for (c, term) in cache.iter_mut().enumerate() {
            term.e += 0.5 * (sum[c] * sum[c] - sum_sqr[c]);
        }
    }
}

/// Writes the partial sums `q = Σ_i v_{f,i} x_i` of factor `f` for every case of `data`.
pub(crate) fn compute_q(model: &Model, data: &Dataset, f: usize, cache: &mut [ETerm]) {
    let vf = model.v.row(f);
    for (term, row) in cache.iter_mut().zip(data.x.rows()) {
        term.q = row.iter().map(|x| vf[x.id] * x.value).sum();
    }
    for join in data.relations.iter() {
        let offset = join.data.attr_offset;
        let partial: Vec<f64> = join
            .data
            .x
            .rows()
            .map(|row| row.iter().map(|x| vf[offset + x.id] * x.value).sum())
            .collect();
        for (c, term) in cache.iter_mut().enumerate() {
            term.q += partial[join.relation_row(c)];
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Entry, SparseMatrix};
    use crate::model::Params;
    use crate::relation::{RelationData, RelationJoin};
    use approx::assert_abs_diff_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::sync::Arc;

    #[test]
    fn joint_prediction_matches_expanded_rows() {
        let relation = Arc::new(RelationData::new(
            SparseMatrix::from_rows(&[
                vec![Entry::new(0, 1.0), Entry::new(1, 0.5)],
                vec![Entry::new(1, 2.0)],
            ]),
            3,
        ));
        let x = SparseMatrix::from_rows(&[
            vec![Entry::new(0, 1.0)],
            vec![Entry::new(1, 1.0), Entry::new(2, -1.0)],
            vec![Entry::new(2, 0.5)],
        ]);
        let data = Dataset::new(x, vec![0.0; 3])
            .unwrap()
            .with_relation(RelationJoin::new(vec![1, 0, 1], relation).unwrap())
            .unwrap();
        let mut model = Model::new(Params::new(5).with_num_factor(3).with_init(0.1, 0.4));
        model.init(&mut StdRng::seed_from_u64(5)).unwrap();
        model.w0 = -0.2;
        for i in 0..5 {
            model.w[i] = 0.3 - 0.1 * i as f64;
        }

        let mut cache = vec![ETerm::default(); 3];
        predict_joint(&model, &data, &mut cache);
        compute_q(&model, &data, 2, &mut cache);
        let mut row = Vec::new();
        for c in 0..3 {
            data.expand_row(c, &mut row);
            assert_abs_diff_eq!(cache[c].e, model.predict(&row), epsilon = 1e-12);
            let q: f64 = row.iter().map(|x| model.v[[2, x.id]] * x.value).sum();
            assert_abs_diff_eq!(cache[c].q, q, epsilon = 1e-12);
        }
    }
}
