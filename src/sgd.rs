//! Stochastic gradient descent
//!
//! Streams the training rows once per epoch and applies the gradient of the task's loss to the
//! model after every row. A pairwise variant learns from `(positive, negative)` row pairs.

mod params;
mod update;

pub use self::params::Params;
pub use self::update::{pair_sgd_step, sgd_step, PairGradient};

mod solve;
pub use solve::{solve, solve_pairs};
