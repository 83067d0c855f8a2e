use serde::{Deserialize, Serialize};

/// Number of non-finite values drawn for one family of parameters
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counter {
    /// Draws that were `NaN`
    pub nan: usize,
    /// Draws that were infinite
    pub inf: usize,
}

impl Counter {
    /// Returns `new` if it is finite; otherwise counts it and returns `old`.
    pub fn accept(&mut self, old: f64, new: f64) -> f64 {
        if new.is_nan() {
            self.nan += 1;
            old
        } else if new.is_infinite() {
            self.inf += 1;
            old
        } else {
            new
        }
    }

    /// Checks whether no non-finite value was counted.
    pub fn is_clean(&self) -> bool {
        self.nan == 0 && self.inf == 0
    }

    fn add(&mut self, other: &Counter) {
        self.nan += other.nan;
        self.inf += other.inf;
    }
}

/// Non-finite draws of one or more sampler iterations, per parameter family
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostics {
    /// Noise precision
    pub alpha: Counter,
    /// Bias
    pub w0: Counter,
    /// Linear weights
    pub w: Counter,
    /// Factors
    pub v: Counter,
    /// Means of the linear weights
    pub w_mu: Counter,
    /// Precisions of the linear weights
    pub w_lambda: Counter,
    /// Means of the factors
    pub v_mu: Counter,
    /// Precisions of the factors
    pub v_lambda: Counter,
}

impl Diagnostics {
    /// Returns the counters with their names.
    pub fn families(&self) -> [(&'static str, Counter); 8] {
        [
            ("alpha", self.alpha),
            ("w0", self.w0),
            ("w", self.w),
            ("v", self.v),
            ("w_mu", self.w_mu),
            ("w_lambda", self.w_lambda),
            ("v_mu", self.v_mu),
            ("v_lambda", self.v_lambda),
        ]
    }

    /// Adds the counts of `other`.
    pub fn merge(&mut self, other: &Diagnostics) {
        self.alpha.add(&other.alpha);
        self.w0.add(&other.w0);
        self.w.add(&other.w);
        self.v.add(&other.v);
        self.w_mu.add(&other.w_mu);
        self.w_lambda.add(&other.w_lambda);
        self.v_mu.add(&other.v_mu);
        self.v_lambda.add(&other.v_lambda);
    }

    /// Returns the number of non-finite draws over all families.
    pub fn total(&self) -> usize {
        self.families().iter().map(|(_, c)| c.nan + c.inf).sum()
    }

    /// Logs a warning for every family with non-finite draws.
    pub fn report(&self) {
        for (name, counter) in self.families() {
            if !counter.is_clean() {
                log::warn!(
                    "#nans in {name}: {} #inf in {name}: {}",
                    counter.nan,
                    counter.inf
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_finite_draws_keep_old_value() {
        let mut counter = Counter::default();
        assert_eq!(counter.accept(1.0, 2.0), 2.0);
        assert_eq!(counter.accept(1.0, f64::NAN), 1.0);
        assert_eq!(counter.accept(1.0, f64::NEG_INFINITY), 1.0);
        assert_eq!(counter, Counter { nan: 1, inf: 1 });
        assert!(!counter.is_clean());
    }

    #[test]
    fn merge_sums_counts() {
        let mut total = Diagnostics::default();
        let mut step = Diagnostics::default();
        step.v.nan = 2;
        step.alpha.inf = 1;
        total.merge(&step);
        total.merge(&step);
        assert_eq!(total.v.nan, 4);
        assert_eq!(total.alpha.inf, 2);
        assert_eq!(total.total(), 6);
    }
}
