//! Behaviour shared by column-map expectations.
//!
//! A column-map expectation evaluates a per-row condition over one column and
//! succeeds when the fraction of compliant non-null values reaches `mostly`.

use serde_json::Value;

use crate::error::ExpectationError;
use crate::expectation::{DefaultKwargs, ExpectationConfiguration, RuntimeConfiguration, ValidationResult};
use crate::metrics::{self, MetricValues};
use crate::result_format::{format_map_output, parse_result_format, MapOutput, ResultFormat};

/// Dependencies every column-map expectation declares for `map_metric`.
pub fn column_map_dependencies(map_metric: &str) -> Vec<String> {
    vec![
        metrics::count_metric(map_metric),
        metrics::NONNULL_COUNT.to_string(),
    ]
}

fn check_mostly(value: &Value) -> Result<f64, ExpectationError> {
    let mostly = value.as_f64().ok_or_else(|| {
        ExpectationError::InvalidConfiguration(format!("mostly must be a number, got {}", value))
    })?;
    if !(0.0..=1.0).contains(&mostly) {
        return Err(ExpectationError::InvalidConfiguration(format!(
            "mostly must be between 0 and 1, got {}",
            mostly
        )));
    }
    Ok(mostly)
}

/// Checks common to every column-map expectation: a string `column`, a
/// `mostly` within `[0, 1]`, a known `result_format` and boolean flags.
pub fn validate_column_map_configuration(
    configuration: &ExpectationConfiguration,
) -> Result<(), ExpectationError> {
    configuration.column()?;
    if let Some(mostly) = configuration.kwargs.get("mostly") {
        check_mostly(mostly)?;
    }
    if let Some(format) = configuration.kwargs.get("result_format") {
        parse_result_format(format)?;
    }
    for flag in ["catch_exceptions", "include_config"] {
        match configuration.kwargs.get(flag) {
            None | Some(Value::Bool(_)) => {}
            Some(other) => {
                return Err(ExpectationError::InvalidConfiguration(format!(
                    "{} must be a boolean, got {}",
                    flag, other
                )))
            }
        }
    }
    Ok(())
}

/// Runtime override, else configuration kwarg, else declared default.
pub fn effective_mostly(
    defaults: &DefaultKwargs,
    configuration: &ExpectationConfiguration,
    runtime: &RuntimeConfiguration,
) -> Result<f64, ExpectationError> {
    if let Some(mostly) = runtime.mostly {
        return check_mostly(&Value::from(mostly));
    }
    match configuration.kwargs.get("mostly") {
        Some(value) => check_mostly(value),
        None => Ok(defaults.mostly),
    }
}

/// Runtime override, else configuration kwarg, else declared default.
pub fn effective_result_format(
    defaults: &DefaultKwargs,
    configuration: &ExpectationConfiguration,
    runtime: &RuntimeConfiguration,
) -> Result<ResultFormat, ExpectationError> {
    match runtime
        .result_format
        .as_ref()
        .or_else(|| configuration.kwargs.get("result_format"))
    {
        Some(value) => parse_result_format(value),
        None => Ok(defaults.result_format),
    }
}

/// Success criterion on the compliant ratio. An empty (all-null) column
/// succeeds.
pub fn meets_mostly(compliant_count: u64, nonnull_count: u64, mostly: f64) -> bool {
    if nonnull_count == 0 {
        return true;
    }
    compliant_count as f64 / nonnull_count as f64 >= mostly
}

/// Build the validation result for `map_metric` from resolved metrics.
pub fn column_map_validates(
    map_metric: &str,
    defaults: &DefaultKwargs,
    configuration: &ExpectationConfiguration,
    metric_values: &MetricValues,
    runtime: &RuntimeConfiguration,
) -> Result<ValidationResult, ExpectationError> {
    let mostly = effective_mostly(defaults, configuration, runtime)?;
    let result_format = effective_result_format(defaults, configuration, runtime)?;

    let compliant_count = metric_values.count(&metrics::count_metric(map_metric))?;
    let nonnull_count = metric_values.count(metrics::NONNULL_COUNT)?;
    let element_count = metric_values
        .count(metrics::ELEMENT_COUNT)
        .unwrap_or(nonnull_count);
    let unexpected_list = metric_values
        .string_list(&metrics::unexpected_values_metric(map_metric))
        .unwrap_or(&[]);
    let unexpected_index_list = metric_values
        .index_list(&metrics::unexpected_index_metric(map_metric))
        .unwrap_or(&[]);

    let success = meets_mostly(compliant_count, nonnull_count, mostly);
    let details = format_map_output(
        result_format,
        MapOutput {
            element_count,
            nonnull_count,
            unexpected_count: nonnull_count.saturating_sub(compliant_count),
            unexpected_list,
            unexpected_index_list,
        },
    );

    Ok(ValidationResult::new(success, details))
}
