//! Numerical helpers
use std::f64::consts::{PI, SQRT_2};

/// Logistic function.
pub fn sigmoid(t: f64) -> f64 {
    1.0 / (1.0 + (-t).exp())
}

/// Complementary error function (Chebyshev fit, fractional error below 1.2e-7).
pub fn erfc(x: f64) -> f64 {
    let z = x.abs();
    let t = 1.0 / (1.0 + 0.5 * z);
    let poly = -1.26551223
        + t * (1.00002368
            + t * (0.37409196
                + t * (0.09678418
                    + t * (-0.18628806
                        + t * (0.27886807
                            + t * (-1.13520398
                                + t * (1.48851587 + t * (-0.82215223 + t * 0.17087277))))))));
    let ans = t * (-z * z + poly).exp();
    if x >= 0.0 {
        ans
    } else {
        2.0 - ans
    }
}

/// Density of the standard normal distribution.
pub fn normal_pdf(x: f64) -> f64 {
    (-0.5 * x * x).exp() / (2.0 * PI).sqrt()
}

/// Distribution function of the standard normal distribution.
pub fn normal_cdf(x: f64) -> f64 {
    0.5 * erfc(-x / SQRT_2)
}

/// Mean of `N(mu, 1)` restricted to `(0, ∞)`.
///
/// Far below zero the density and distribution function underflow; there the mean follows its
/// asymptote `-1/mu`.
pub fn positive_truncated_mean(mu: f64) -> f64 {
    let mean = mu + normal_pdf(mu) / normal_cdf(mu);
    if mean.is_finite() && mean > 0.0 {
        mean
    } else if mu > 0.0 {
        mu
    } else {
        -1.0 / mu
    }
}

/// Mean of `N(mu, 1)` restricted to `(-∞, 0)`.
pub fn negative_truncated_mean(mu: f64) -> f64 {
    -positive_truncated_mean(-mu)
}
