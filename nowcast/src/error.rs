use std::path::PathBuf;

use thiserror::Error;

/// Errors returned by the nowcast operations.
///
/// Every operation validates its inputs before doing any numerical work, so an
/// error never comes with a partially computed field.
#[derive(Debug, Error)]
pub enum NowcastError {
    /// Two fields that are combined have different spatial shapes.
    #[error("shape mismatch: {what} has (width, height) {actual:?}, expected {expected:?}")]
    ShapeMismatch {
        what: &'static str,
        /// `(width, height)` required by the operation.
        expected: (usize, usize),
        /// `(width, height)` that was passed.
        actual: (usize, usize),
    },

    /// A scalar parameter is out of its valid range.
    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    /// The SVD-based least-squares solver could not produce a solution.
    #[error("least-squares solve failed: {0}")]
    Solver(&'static str),

    #[error("failed to parse configuration: {0}")]
    ConfigParse(#[from] serde_yml::Error),

    #[error("failed to read configuration '{path}': {source}")]
    ConfigIo {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl NowcastError {
    pub(crate) fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }
}

/// Result type for nowcast operations.
pub type Result<T> = std::result::Result<T, NowcastError>;
