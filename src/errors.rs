use std::io;

use thiserror::Error;

/// Error type for sampling, prompt assembly, and collaborator failures.
#[derive(Debug, Error)]
pub enum InsightError {
    /// A budget or argument the caller supplied cannot be honored.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    /// The cost estimator produced NaN or infinity.
    #[error("cost estimator returned a non-finite value ({0}) for {1} records")]
    NonFiniteCost(f64, usize),
    /// JSON (de)serialization failed.
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    /// Reading a file failed.
    #[error(transparent)]
    Io(#[from] io::Error),
    /// Configuration failed validation.
    #[error("configuration error: {0}")]
    Configuration(String),
    /// The query service refused or failed a query.
    #[error("query on connection '{connection}' failed: {reason}")]
    QueryFailed {
        /// Connection the query targeted.
        connection: String,
        /// Failure description.
        reason: String,
    },
    /// A collaborator's result lacked an expected field.
    #[error("query result is missing field '{0}'")]
    MissingField(String),
}
