//! Factorization machine model
//!
//! The model computes
//! `ŷ(x) = w0 + Σ_i w_i x_i + Σ_{i<j} <v_i, v_j> x_i x_j`
//! where the pairwise term is evaluated in `O(k·nnz)` through
//! `Σ_f ½ ((Σ_i v_{f,i} x_i)² − Σ_i (v_{f,i} x_i)²)`.
mod params;

pub use self::params::Params;

use ndarray::{Array1, Array2};
use rand::Rng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};

use crate::data::Entry;
use crate::error::{Error, Result};

/// Per-factor sums of a row, reused by the gradient updates
#[derive(Clone, Debug)]
pub struct Interactions {
    /// `Σ_i v_{f,i} x_i` for every factor `f`
    pub sum: Array1<f64>,
    /// `Σ_i (v_{f,i} x_i)²` for every factor `f`
    pub sum_sqr: Array1<f64>,
}

impl Interactions {
    /// Creates a zeroed workspace for `num_factor` factors.
    pub fn new(num_factor: usize) -> Self {
        Interactions {
            sum: Array1::zeros(num_factor),
            sum_sqr: Array1::zeros(num_factor),
        }
    }
}

/// Parameters of a factorization machine
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Model {
    /// Bias
    pub w0: f64,
    /// Linear weights (one per attribute)
    pub w: Array1<f64>,
    /// Factors (`num_factor × num_attribute`)
    pub v: Array2<f64>,
    /// Shape and regularization
    pub params: Params,
}

impl Model {
    /// Creates a model with all parameters set to zero.
    pub fn new(params: Params) -> Self {
        Model {
            w0: 0.0,
            w: Array1::zeros(params.num_attribute),
            v: Array2::zeros((params.num_factor, params.num_attribute)),
            params,
        }
    }

    /// Resets bias and linear weights to zero and draws the factors from
    /// `N(init_mean, init_stdev²)`.
    pub fn init<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<()> {
        let (n, k) = (self.params.num_attribute, self.params.num_factor);
        self.w0 = 0.0;
        self.w = Array1::zeros(n);
        let (mean, stdev) = (self.params.init_mean, self.params.init_stdev);
        if stdev == 0.0 {
            self.v = Array2::from_elem((k, n), mean);
            return Ok(());
        }
        let normal = Normal::new(mean, stdev)
            .map_err(|e| Error::Configuration(format!("invalid factor initialization: {e}")))?;
        self.v = Array2::from_shape_simple_fn((k, n), || normal.sample(rng));
        Ok(())
    }

    /// Returns the number of attributes.
    pub fn num_attribute(&self) -> usize {
        self.params.num_attribute
    }

    /// Returns the dimension of the factorization.
    pub fn num_factor(&self) -> usize {
        self.params.num_factor
    }

    /// Predicts the value of a row.
    pub fn predict(&self, row: &[Entry]) -> f64 {
        let mut ws = Interactions::new(self.num_factor());
        self.predict_with(row, &mut ws)
    }

    /// Predicts the value of a row and leaves the per-factor sums in `ws`.
    ///
    /// Panics if the row references an attribute `>= num_attribute`.
    pub fn predict_with(&self, row: &[Entry], ws: &mut Interactions) -> f64 {
        let n = self.num_attribute();
        for e in row {
            assert!(e.id < n, "feature id {} out of range ({n} attributes)", e.id);
        }
        let mut result = 0.0;
        if self.params.use_bias {
            result += self.w0;
        }
        if self.params.use_linear {
            for e in row {
                result += self.w[e.id] * e.value;
            }
        }
        for f in 0..self.num_factor() {
            let vf = self.v.row(f);
            let mut sum = 0.0;
            let mut sum_sqr = 0.0;
            for e in row {
                let d = vf[e.id] * e.value;
                sum += d;
                sum_sqr += d * d;
            }
            ws.sum[f] = sum;
            ws.sum_sqr[f] = sum_sqr;
            result += 0.5 * (sum * sum - sum_sqr);
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn random_model(num_attribute: usize, num_factor: usize, seed: u64) -> Model {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut model = Model::new(
            Params::new(num_attribute)
                .with_num_factor(num_factor)
                .with_init(0.0, 0.5),
        );
        model.init(&mut rng).unwrap();
        model.w0 = 0.3;
        for i in 0..num_attribute {
            model.w[i] = 0.1 * i as f64 - 0.2;
        }
        model
    }

    fn brute_force(model: &Model, row: &[Entry]) -> f64 {
        let mut result = model.w0;
        for e in row {
            result += model.w[e.id] * e.value;
        }
        for a in 0..row.len() {
            for b in a + 1..row.len() {
                let (ea, eb) = (row[a], row[b]);
                let dot: f64 = (0..model.num_factor())
                    .map(|f| model.v[[f, ea.id]] * model.v[[f, eb.id]])
                    .sum();
                result += dot * ea.value * eb.value;
            }
        }
        result
    }

    #[test]
    fn single_feature_has_no_interactions() {
        let model = random_model(4, 3, 1);
        let row = [Entry::new(2, 1.5)];
        assert_abs_diff_eq!(model.predict(&row), 0.3 + 0.0 * 1.5, epsilon = 1e-12);
    }

    #[test]
    fn zero_factors_is_linear_model() {
        let model = random_model(4, 0, 2);
        let row = [Entry::new(0, 1.0), Entry::new(3, 2.0)];
        assert_abs_diff_eq!(model.predict(&row), 0.3 - 0.2 + 0.1 * 2.0, epsilon = 1e-12);
    }

    #[test]
    fn interaction_sums_match_brute_force() {
        for seed in 0..5 {
            let model = random_model(6, 4, seed);
            let row: Vec<_> = (0..6)
                .map(|i| Entry::new(i, 0.5 + i as f64 * (seed as f64 - 2.0)))
                .collect();
            assert_abs_diff_eq!(model.predict(&row), brute_force(&model, &row), epsilon = 1e-9);
        }
    }

    #[test]
    fn workspace_receives_sums() {
        let model = random_model(3, 2, 7);
        let row = [Entry::new(0, 1.0), Entry::new(2, -2.0)];
        let mut ws = Interactions::new(2);
        model.predict_with(&row, &mut ws);
        for f in 0..2 {
            let expected = model.v[[f, 0]] - 2.0 * model.v[[f, 2]];
            assert_abs_diff_eq!(ws.sum[f], expected, epsilon = 1e-12);
        }
    }

    #[test]
    fn toggles_disable_bias_and_linear_terms() {
        let mut model = random_model(2, 0, 3);
        model.params = model.params.clone().with_bias(false).with_linear(false);
        assert_eq!(model.predict(&[Entry::new(1, 4.0)]), 0.0);
    }

    #[test]
    fn zero_stdev_gives_constant_factors() {
        let mut model = Model::new(Params::new(2).with_num_factor(1).with_init(0.0, 0.0));
        model.init(&mut StdRng::seed_from_u64(0)).unwrap();
        assert!(model.v.iter().all(|&v| v == 0.0));
        assert_eq!(model.predict(&[Entry::new(0, 1.0), Entry::new(1, 1.0)]), 0.0);
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn rejects_unknown_feature() {
        random_model(2, 1, 0).predict(&[Entry::new(2, 1.0)]);
    }
}
