//! Error types
use std::path::PathBuf;

/// Result type used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while loading data or setting up a training run.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid combination of parameters, unknown task, unsupported input for a learner.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Data does not satisfy the invariants of the model or of a relation join.
    #[error("data integrity error: {0}")]
    DataIntegrity(String),

    /// A file could not be opened or read.
    #[error("failed to read {path}: {source}")]
    Io {
        /// Path of the offending file
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// A line of a text file could not be parsed.
    #[error("{path}:{line}: {message}")]
    Parse {
        /// Path of the offending file
        path: PathBuf,
        /// Line number (starting at 1)
        line: usize,
        /// Description of the problem
        message: String,
    },

    /// Writing to the metric sink failed.
    #[error("failed to write metrics: {0}")]
    Write(#[from] std::io::Error),
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn parse(path: impl Into<PathBuf>, line: usize, message: impl Into<String>) -> Self {
        Error::Parse {
            path: path.into(),
            line,
            message: message.into(),
        }
    }
}
