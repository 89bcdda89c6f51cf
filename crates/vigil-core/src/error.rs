//! Typed errors for expectation validation.

use thiserror::Error;

use crate::engine::EngineKind;

/// Errors raised while configuring or evaluating expectations.
#[derive(Debug, Error)]
pub enum ExpectationError {
    /// A required expectation parameter is missing or has the wrong type.
    #[error("invalid expectation configuration: {0}")]
    InvalidConfiguration(String),

    #[error("unknown expectation type '{0}'")]
    UnknownExpectation(String),

    /// No metric function is registered for the requested engine.
    #[error("metric '{metric}' is not registered for the {engine} engine")]
    MetricNotRegistered { metric: String, engine: EngineKind },

    /// A declared metric dependency was not produced by the engine.
    #[error("metric '{0}' was not resolved")]
    MissingMetric(String),

    #[error("column not found: {0}")]
    ColumnNotFound(String),

    #[error("invalid result_format: {0}")]
    InvalidResultFormat(String),

    /// The execution engine failed while computing a metric.
    #[error("engine failed: {0}")]
    Engine(String),
}

impl From<datafusion::error::DataFusionError> for ExpectationError {
    fn from(e: datafusion::error::DataFusionError) -> Self {
        ExpectationError::Engine(e.to_string())
    }
}

impl From<arrow::error::ArrowError> for ExpectationError {
    fn from(e: arrow::error::ArrowError) -> Self {
        ExpectationError::Engine(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ExpectationError::InvalidConfiguration("regex is required".to_string());
        assert_eq!(
            err.to_string(),
            "invalid expectation configuration: regex is required"
        );

        let err = ExpectationError::MetricNotRegistered {
            metric: "map.matches_regex".to_string(),
            engine: EngineKind::DataFusion,
        };
        let msg = err.to_string();
        assert!(msg.contains("map.matches_regex"));
        assert!(msg.contains("datafusion"));
    }

    #[test]
    fn test_from_arrow_error() {
        let err: ExpectationError =
            arrow::error::ArrowError::ComputeError("boom".to_string()).into();
        assert!(matches!(err, ExpectationError::Engine(msg) if msg.contains("boom")));
    }
}
