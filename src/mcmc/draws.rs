use rand::Rng;
use rand_distr::{Distribution, Exp1, Gamma, StandardNormal};

use crate::math::{negative_truncated_mean, positive_truncated_mean};

/// Source of the sampler's random draws; returns the distribution means when sampling is off.
pub(crate) struct Draws<R: Rng> {
    rng: R,
    sample: bool,
}

impl<R: Rng> Draws<R> {
    pub fn new(rng: R, sample: bool) -> Self {
        Draws { rng, sample }
    }

    /// Draws from `N(mean, var)`.
    pub fn gaussian(&mut self, mean: f64, var: f64) -> f64 {
        if !self.sample {
            return mean;
        }
        let z: f64 = StandardNormal.sample(&mut self.rng);
        mean + var.sqrt() * z
    }

    /// Draws from a Gamma distribution with the given shape and rate (`NaN` if they are invalid).
    pub fn gamma(&mut self, shape: f64, rate: f64) -> f64 {
        if !self.sample {
            return shape / rate;
        }
        match Gamma::new(shape, 1.0 / rate) {
            Ok(gamma) => gamma.sample(&mut self.rng),
            Err(_) => f64::NAN,
        }
    }

    /// Draws from `N(mean, 1)` restricted to `(0, ∞)`.
    pub fn positive(&mut self, mean: f64) -> f64 {
        if !self.sample {
            return positive_truncated_mean(mean);
        }
        mean + self.standard_above(-mean)
    }

    /// Draws from `N(mean, 1)` restricted to `(-∞, 0)`.
    pub fn negative(&mut self, mean: f64) -> f64 {
        if !self.sample {
            return negative_truncated_mean(mean);
        }
        mean - self.standard_above(mean)
    }

    /// Draws from the standard normal distribution restricted to `(a, ∞)`.
    fn standard_above(&mut self, a: f64) -> f64 {
        if a < 0.0 {
            // at least half of the mass lies above a
            loop {
                let z: f64 = StandardNormal.sample(&mut self.rng);
                if z > a {
                    return z;
                }
            }
        }
        // exponential proposals (Robert, 1995)
        let rate = 0.5 * (a + (a * a + 4.0).sqrt());
        loop {
            let e: f64 = Exp1.sample(&mut self.rng);
            let z = a + e / rate;
            let rho = (-0.5 * (z - rate) * (z - rate)).exp();
            if self.rng.random::<f64>() <= rho {
                return z;
            }
        }
    }
}
