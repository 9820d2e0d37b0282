//! Error types for the forecast-dialog pipeline.

use thiserror::Error;

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Errors that can occur while loading, modelling, rendering or conversing.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PipelineError {
    /// Input data is empty.
    #[error("empty input data")]
    EmptyData,

    /// Insufficient data points for the operation.
    #[error("insufficient data: need at least {needed}, got {got}")]
    InsufficientData { needed: usize, got: usize },

    /// Invalid parameter value.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// A cell or row of the input file could not be interpreted.
    #[error("invalid data: {0}")]
    InvalidData(String),

    /// Requested column is not present in the file.
    #[error("column '{0}' not found")]
    ColumnNotFound(String),

    /// Timestamp-related error.
    #[error("timestamp error: {0}")]
    TimestampError(String),

    /// User input rejected at the conversation boundary.
    #[error("{0}")]
    InputValidation(String),

    /// Forecast period text is not a usable horizon.
    #[error("invalid forecast period: {0}")]
    InvalidPeriod(String),

    /// Differencing did not reach stationarity within the iteration cap.
    #[error("series did not become stationary after {iterations} differencing steps")]
    NonStationarySeries { iterations: usize },

    /// Order search or model estimation failed.
    #[error("model fit failed: {0}")]
    ModelFit(String),

    /// Forecast or interval computation failed.
    #[error("forecast failed: {0}")]
    Forecast(String),

    /// Computation error (e.g., numerical issues).
    #[error("computation error: {0}")]
    ComputationError(String),

    /// Model has not been fitted yet.
    #[error("model must be fitted before prediction")]
    FitRequired,

    /// Plot backend failed to produce an image.
    #[error("render error: {0}")]
    Render(String),

    /// Filesystem error.
    #[error("io error: {0}")]
    Io(String),

    /// CSV reader error.
    #[error("csv error: {0}")]
    Csv(String),

    /// Transport failed to deliver or fetch a message.
    #[error("transport error: {0}")]
    Transport(String),
}

impl From<std::io::Error> for PipelineError {
    fn from(err: std::io::Error) -> Self {
        PipelineError::Io(err.to_string())
    }
}

impl From<csv::Error> for PipelineError {
    fn from(err: csv::Error) -> Self {
        PipelineError::Csv(err.to_string())
    }
}

impl PipelineError {
    /// Whether the error stems from user input and should trigger a re-prompt.
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            PipelineError::InputValidation(_) | PipelineError::InvalidPeriod(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_messages_are_descriptive() {
        let err = PipelineError::EmptyData;
        assert_eq!(err.to_string(), "empty input data");

        let err = PipelineError::InsufficientData { needed: 10, got: 5 };
        assert_eq!(err.to_string(), "insufficient data: need at least 10, got 5");

        let err = PipelineError::NonStationarySeries { iterations: 7 };
        assert_eq!(
            err.to_string(),
            "series did not become stationary after 7 differencing steps"
        );

        let err = PipelineError::ColumnNotFound("Price".to_string());
        assert_eq!(err.to_string(), "column 'Price' not found");

        let err = PipelineError::InvalidPeriod("abc".to_string());
        assert_eq!(err.to_string(), "invalid forecast period: abc");
    }

    #[test]
    fn io_errors_convert() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing.csv");
        let err: PipelineError = io.into();
        assert!(matches!(err, PipelineError::Io(msg) if msg.contains("missing.csv")));
    }

    #[test]
    fn user_errors_are_classified() {
        assert!(PipelineError::InvalidPeriod("x".into()).is_user_error());
        assert!(PipelineError::InputValidation("x".into()).is_user_error());
        assert!(!PipelineError::ModelFit("x".into()).is_user_error());
    }
}
