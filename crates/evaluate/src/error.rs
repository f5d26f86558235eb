//! Evaluation error types.

use gcmeval_grid::GridError;
use gcmeval_io::IoError;

/// Errors that can occur while reading sources and building tables.
#[derive(Debug, thiserror::Error)]
pub enum EvaluateError {
    /// The configuration is inconsistent.
    #[error("invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    /// A variable has no reference/simulation name mapping.
    #[error("no variable-name mapping for '{var}'")]
    MissingVariableMapping { var: String },

    /// Writing a table failed.
    #[error("table output error: {reason}")]
    Output { reason: String },

    /// Reading an input file failed.
    #[error(transparent)]
    Io(#[from] IoError),

    /// A grid transformation failed.
    #[error(transparent)]
    Grid(#[from] GridError),
}

impl EvaluateError {
    /// Returns `true` if the error means an input file is absent.
    pub fn is_missing_input(&self) -> bool {
        matches!(
            self,
            EvaluateError::Io(IoError::FileNotFound { .. } | IoError::NoFilesMatched { .. })
        )
    }
}

impl From<csv::Error> for EvaluateError {
    fn from(e: csv::Error) -> Self {
        EvaluateError::Output {
            reason: e.to_string(),
        }
    }
}
