//! Regex match / non-match column expectations and their metric functions.

use arrow::array::{BooleanArray, StringArray};
use regex::Regex;
use serde_json::Value;

use crate::engine::quote_literal;
use crate::error::ExpectationError;
use crate::expectation::{Expectation, ExpectationConfiguration, RuntimeConfiguration, ValidationResult};
use crate::expectations::column_map::{
    column_map_dependencies, column_map_validates, validate_column_map_configuration,
};
use crate::metrics::{MetricKwargs, MetricValues};
use crate::registry::{MapMetricProvider, MetricRegistry};

/// Per-row: the value matches `regex`.
pub const MATCHES_REGEX: &str = "map.matches_regex";
/// Per-row: the value does not match `regex`.
pub const NOT_MATCHES_REGEX: &str = "map.not_matches_regex";

const SUCCESS_KEYS: &[&str] = &["regex", "mostly"];
const METRIC_VALUE_KEYS: &[&str] = &["regex"];

fn regex_pattern(kwargs: &MetricKwargs) -> Result<&str, ExpectationError> {
    match kwargs.get("regex") {
        Some(Value::String(pattern)) => Ok(pattern),
        Some(_) => Err(ExpectationError::InvalidConfiguration(
            "regex must be a string".to_string(),
        )),
        None => Err(ExpectationError::InvalidConfiguration(
            "regex is required".to_string(),
        )),
    }
}

fn compile(kwargs: &MetricKwargs) -> Result<Regex, ExpectationError> {
    let pattern = regex_pattern(kwargs)?;
    Regex::new(pattern).map_err(|e| {
        ExpectationError::InvalidConfiguration(format!("invalid regex '{}': {}", pattern, e))
    })
}

fn arrow_matches_regex(
    values: &StringArray,
    kwargs: &MetricKwargs,
) -> Result<BooleanArray, ExpectationError> {
    let regex = compile(kwargs)?;
    Ok(values.iter().map(|v| v.map(|s| regex.is_match(s))).collect())
}

fn arrow_not_matches_regex(
    values: &StringArray,
    kwargs: &MetricKwargs,
) -> Result<BooleanArray, ExpectationError> {
    let regex = compile(kwargs)?;
    Ok(values.iter().map(|v| v.map(|s| !regex.is_match(s))).collect())
}

fn sql_matches_regex(value_expr: &str, kwargs: &MetricKwargs) -> Result<String, ExpectationError> {
    let pattern = regex_pattern(kwargs)?;
    Ok(format!("regex_match({}, {})", value_expr, quote_literal(pattern)))
}

fn sql_not_matches_regex(value_expr: &str, kwargs: &MetricKwargs) -> Result<String, ExpectationError> {
    Ok(format!("NOT {}", sql_matches_regex(value_expr, kwargs)?))
}

/// Register the regex map metrics for every engine.
pub fn register_regex_metrics(registry: &mut MetricRegistry) {
    registry.register(MATCHES_REGEX, MapMetricProvider::Arrow(arrow_matches_regex));
    registry.register(MATCHES_REGEX, MapMetricProvider::Sql(sql_matches_regex));
    registry.register(NOT_MATCHES_REGEX, MapMetricProvider::Arrow(arrow_not_matches_regex));
    registry.register(NOT_MATCHES_REGEX, MapMetricProvider::Sql(sql_not_matches_regex));
}

fn validate_regex_configuration(
    configuration: &ExpectationConfiguration,
) -> Result<(), ExpectationError> {
    validate_column_map_configuration(configuration)?;
    compile(&configuration.kwargs)?;
    Ok(())
}

/// Expect column values to match a regular expression, `mostly` of the time.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExpectColumnValuesToMatchRegex;

impl Expectation for ExpectColumnValuesToMatchRegex {
    fn expectation_type(&self) -> &'static str {
        "expect_column_values_to_match_regex"
    }

    fn map_metric(&self) -> &'static str {
        MATCHES_REGEX
    }

    fn metric_dependencies(&self) -> Vec<String> {
        column_map_dependencies(MATCHES_REGEX)
    }

    fn success_keys(&self) -> &'static [&'static str] {
        SUCCESS_KEYS
    }

    fn metric_value_keys(&self) -> &'static [&'static str] {
        METRIC_VALUE_KEYS
    }

    fn validate_configuration(
        &self,
        configuration: &ExpectationConfiguration,
    ) -> Result<(), ExpectationError> {
        validate_regex_configuration(configuration)
    }

    fn validates(
        &self,
        configuration: &ExpectationConfiguration,
        metrics: &MetricValues,
        runtime_configuration: &RuntimeConfiguration,
    ) -> Result<ValidationResult, ExpectationError> {
        column_map_validates(
            MATCHES_REGEX,
            &self.default_kwarg_values(),
            configuration,
            metrics,
            runtime_configuration,
        )
    }
}

/// Expect column values not to match a regular expression, `mostly` of the
/// time. Matching values are the unexpected ones.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExpectColumnValuesToNotMatchRegex;

impl Expectation for ExpectColumnValuesToNotMatchRegex {
    fn expectation_type(&self) -> &'static str {
        "expect_column_values_to_not_match_regex"
    }

    fn map_metric(&self) -> &'static str {
        NOT_MATCHES_REGEX
    }

    fn metric_dependencies(&self) -> Vec<String> {
        column_map_dependencies(NOT_MATCHES_REGEX)
    }

    fn success_keys(&self) -> &'static [&'static str] {
        SUCCESS_KEYS
    }

    fn metric_value_keys(&self) -> &'static [&'static str] {
        METRIC_VALUE_KEYS
    }

    fn validate_configuration(
        &self,
        configuration: &ExpectationConfiguration,
    ) -> Result<(), ExpectationError> {
        validate_regex_configuration(configuration)
    }

    fn validates(
        &self,
        configuration: &ExpectationConfiguration,
        metrics: &MetricValues,
        runtime_configuration: &RuntimeConfiguration,
    ) -> Result<ValidationResult, ExpectationError> {
        column_map_validates(
            NOT_MATCHES_REGEX,
            &self.default_kwarg_values(),
            configuration,
            metrics,
            runtime_configuration,
        )
    }
}
