//! Vigil Core - column expectations over Arrow and DataFusion
//!
//! This crate provides:
//! - Declarative expectations (regex match / non-match with a `mostly` tolerance)
//! - An explicit registry of metric functions keyed by metric and engine
//! - Execution engines over in-memory Arrow batches or DataFusion tables
//! - Result formatting by verbosity level, and suite validation

pub mod engine;
pub mod error;
pub mod expectation;
pub mod expectations;
pub mod metrics;
pub mod registry;
pub mod result_format;
pub mod udf;
pub mod validator;

pub use engine::{ArrowExecutionEngine, EngineKind, ExecutionEngine, SqlExecutionEngine};
pub use error::ExpectationError;
pub use expectation::{
    Expectation, ExpectationConfiguration, ExpectationRegistry, RuntimeConfiguration,
    ValidationResult,
};
pub use expectations::{ExpectColumnValuesToMatchRegex, ExpectColumnValuesToNotMatchRegex};
pub use metrics::{MetricValue, MetricValues};
pub use registry::{MapMetricProvider, MetricRegistry};
pub use result_format::{ResultFormat, ResultFormatLevel};
pub use validator::{check_suite, ExpectationSuite, SuiteValidationResult, Validator};

// Re-export for downstream consumers
pub use arrow::array::RecordBatch;
