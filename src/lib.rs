//! Learn factorization machine models.
#![warn(missing_docs)]

pub mod data;
pub mod error;
pub mod eval;
mod math;
pub mod mcmc;
pub mod memory;
pub mod metric_log;
pub mod model;
pub mod relation;
pub mod sgd;
pub mod task;
mod time;

mod status;
pub use crate::error::{Error, Result};
pub use crate::status::Status;
