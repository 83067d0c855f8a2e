//! Sparse data, datasets and file readers
pub mod dataset;
pub mod groups;
pub mod sparse;
pub mod text;

pub use dataset::Dataset;
pub use groups::AttributeGroups;
pub use sparse::{Entry, SparseMatrix};
