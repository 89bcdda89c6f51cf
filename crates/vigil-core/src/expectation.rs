//! Expectation contract, configuration and results.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;

use crate::error::ExpectationError;
use crate::metrics::{MetricKwargs, MetricValues};
use crate::result_format::{MapResultDetails, ResultFormat};

/// A configured expectation: its type name plus keyword arguments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpectationConfiguration {
    pub expectation_type: String,
    #[serde(default)]
    pub kwargs: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub meta: Map<String, Value>,
}

impl ExpectationConfiguration {
    pub fn new(expectation_type: impl Into<String>, kwargs: Map<String, Value>) -> Self {
        Self {
            expectation_type: expectation_type.into(),
            kwargs,
            meta: Map::new(),
        }
    }

    /// The target column of a column expectation.
    pub fn column(&self) -> Result<&str, ExpectationError> {
        match self.kwargs.get("column") {
            Some(Value::String(c)) => Ok(c),
            Some(_) => Err(ExpectationError::InvalidConfiguration(
                "column must be a string".to_string(),
            )),
            None => Err(ExpectationError::InvalidConfiguration(
                "column is required".to_string(),
            )),
        }
    }

    /// Select `keys` from the kwargs (absent keys are skipped).
    pub fn select_kwargs(&self, keys: &[&str]) -> MetricKwargs {
        keys.iter()
            .filter_map(|k| self.kwargs.get(*k).map(|v| (k.to_string(), v.clone())))
            .collect()
    }

    pub fn bool_kwarg(&self, key: &str) -> Option<bool> {
        self.kwargs.get(key).and_then(Value::as_bool)
    }
}

/// Per-run overrides supplied by the caller.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RuntimeConfiguration {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result_format: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mostly: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catch_exceptions: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include_config: Option<bool>,
}

/// Default keyword argument values declared by an expectation.
#[derive(Debug, Clone, PartialEq)]
pub struct DefaultKwargs {
    pub mostly: f64,
    pub result_format: ResultFormat,
    pub include_config: bool,
    pub catch_exceptions: bool,
}

impl Default for DefaultKwargs {
    fn default() -> Self {
        Self {
            mostly: 1.0,
            result_format: ResultFormat::default(),
            include_config: true,
            catch_exceptions: false,
        }
    }
}

/// Error captured instead of propagated when `catch_exceptions` is set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExceptionInfo {
    pub raised_exception: bool,
    pub exception_message: String,
}

/// Outcome of validating one expectation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<MapResultDetails>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expectation_config: Option<ExpectationConfiguration>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exception_info: Option<ExceptionInfo>,
}

impl ValidationResult {
    pub fn new(success: bool, result: Option<MapResultDetails>) -> Self {
        Self {
            success,
            result,
            expectation_config: None,
            exception_info: None,
        }
    }

    pub fn from_exception(error: &ExpectationError) -> Self {
        Self {
            success: false,
            result: None,
            expectation_config: None,
            exception_info: Some(ExceptionInfo {
                raised_exception: true,
                exception_message: error.to_string(),
            }),
        }
    }
}

/// A declarative validation rule.
///
/// An expectation names the map metric it needs, checks its configuration
/// before any data is touched, and turns resolved metric values into a result.
pub trait Expectation: Send + Sync {
    fn expectation_type(&self) -> &'static str;

    /// Map metric evaluated per row for this expectation.
    fn map_metric(&self) -> &'static str;

    /// Metric names that must be resolved before `validates` runs.
    fn metric_dependencies(&self) -> Vec<String>;

    /// Kwargs that affect success.
    fn success_keys(&self) -> &'static [&'static str];

    /// Kwargs forwarded to the metric function.
    fn metric_value_keys(&self) -> &'static [&'static str];

    fn default_kwarg_values(&self) -> DefaultKwargs {
        DefaultKwargs::default()
    }

    fn validate_configuration(
        &self,
        configuration: &ExpectationConfiguration,
    ) -> Result<(), ExpectationError>;

    fn validates(
        &self,
        configuration: &ExpectationConfiguration,
        metrics: &MetricValues,
        runtime_configuration: &RuntimeConfiguration,
    ) -> Result<ValidationResult, ExpectationError>;
}

/// Registry of expectations by type name.
#[derive(Clone, Default)]
pub struct ExpectationRegistry {
    expectations: HashMap<String, Arc<dyn Expectation>>,
}

impl ExpectationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding every built-in expectation.
    pub fn with_builtin_expectations() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(crate::expectations::ExpectColumnValuesToMatchRegex));
        registry.register(Arc::new(crate::expectations::ExpectColumnValuesToNotMatchRegex));
        registry
    }

    pub fn register(&mut self, expectation: Arc<dyn Expectation>) {
        self.expectations
            .insert(expectation.expectation_type().to_string(), expectation);
    }

    pub fn get(&self, expectation_type: &str) -> Result<Arc<dyn Expectation>, ExpectationError> {
        self.expectations
            .get(expectation_type)
            .cloned()
            .ok_or_else(|| ExpectationError::UnknownExpectation(expectation_type.to_string()))
    }

    /// Registered type names, sorted.
    pub fn expectation_types(&self) -> Vec<&str> {
        let mut types: Vec<&str> = self.expectations.keys().map(String::as_str).collect();
        types.sort_unstable();
        types
    }
}

impl std::fmt::Debug for ExpectationRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExpectationRegistry")
            .field("expectations", &self.expectation_types())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn config(kwargs: Value) -> ExpectationConfiguration {
        serde_json::from_value(json!({
            "expectation_type": "expect_column_values_to_not_match_regex",
            "kwargs": kwargs,
        }))
        .unwrap()
    }

    #[test]
    fn test_column_accessor() {
        assert_eq!(config(json!({"column": "email"})).column().unwrap(), "email");
        assert!(config(json!({})).column().is_err());
        assert!(config(json!({"column": 3})).column().is_err());
    }

    #[test]
    fn test_select_kwargs() {
        let c = config(json!({"column": "a", "regex": "x", "mostly": 0.5}));
        let selected = c.select_kwargs(&["regex", "missing"]);
        assert_eq!(selected.len(), 1);
        assert_eq!(selected["regex"], json!("x"));
    }

    #[test]
    fn test_configuration_roundtrip_omits_empty_meta() {
        let c = config(json!({"column": "a"}));
        let value = serde_json::to_value(&c).unwrap();
        assert!(value.get("meta").is_none());
        let parsed: ExpectationConfiguration = serde_json::from_value(value).unwrap();
        assert_eq!(parsed, c);
    }

    #[test]
    fn test_builtin_registry() {
        let registry = ExpectationRegistry::with_builtin_expectations();
        assert_eq!(
            registry.expectation_types(),
            vec![
                "expect_column_values_to_match_regex",
                "expect_column_values_to_not_match_regex"
            ]
        );
        assert!(matches!(
            registry.get("expect_table_row_count_to_equal"),
            Err(ExpectationError::UnknownExpectation(_))
        ));
    }

    #[test]
    fn test_exception_result() {
        let err = ExpectationError::ColumnNotFound("x".to_string());
        let result = ValidationResult::from_exception(&err);
        assert!(!result.success);
        let info = result.exception_info.unwrap();
        assert!(info.raised_exception);
        assert!(info.exception_message.contains("x"));
    }
}
