//! Error types for the nowcasting engine.

use thiserror::Error;

/// Result type alias for nowcasting operations.
pub type Result<T> = std::result::Result<T, NowcastError>;

/// Errors that can occur while configuring or running a nowcast.
#[derive(Error, Debug)]
pub enum NowcastError {
    /// Malformed release rule or configuration entry.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Input data is empty.
    #[error("empty input data")]
    EmptyData,

    /// Insufficient data points for the operation.
    #[error("insufficient data: need at least {needed}, got {got}")]
    InsufficientData { needed: usize, got: usize },

    /// Invalid parameter value.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Dimension mismatch between data structures.
    #[error("dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    /// Normal equations could not be solved.
    #[error("least-squares system is singular or ill-conditioned")]
    SingularMatrix,

    /// Every lag combination failed for an indicator.
    #[error("no model for indicator {indicator} ({tried} lag combinations tried)")]
    NoModel { indicator: String, tried: usize },

    /// A fitted model cannot build the regressors of the target quarter.
    #[error("cannot predict target quarter: {0}")]
    MissingPrediction(String),

    /// A required external input is absent.
    #[error("missing input: {0}")]
    MissingInput(String),

    /// Reading a configuration file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A configuration file is not valid TOML for the expected schema.
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl NowcastError {
    /// Whether the error belongs to a single lag candidate or indicator and
    /// must not abort a nowcast run.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            NowcastError::InsufficientData { .. }
                | NowcastError::SingularMatrix
                | NowcastError::NoModel { .. }
                | NowcastError::MissingPrediction(_)
                | NowcastError::EmptyData
        )
    }
}
