//! Gibbs sampling and alternating least squares
//!
//! Bayesian factorization machines place Gaussian priors on all parameters with per-group
//! Normal-Gamma hyperpriors. Every iteration draws each parameter from its conditional posterior
//! given all others. Without sampling every draw takes the conditional mean, which turns the
//! sampler into alternating least squares.

mod cache;
mod diagnostics;
mod draw;
mod draws;
mod hyper;
mod params;
mod predict;

pub use self::diagnostics::{Counter, Diagnostics};
pub use self::hyper::Hyperparameters;
pub use self::params::Params;

mod solve;
pub use solve::{solve, Report, Sampler};
