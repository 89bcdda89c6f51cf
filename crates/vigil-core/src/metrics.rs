//! Metric values and the aggregation of per-row map conditions into them.

use arrow::array::{Array, BooleanArray, StringArray};
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::HashMap;

use crate::error::ExpectationError;

/// Metric keyword arguments (e.g. `regex`), taken from the expectation kwargs.
pub type MetricKwargs = Map<String, Value>;

/// Element count of the column domain.
pub const ELEMENT_COUNT: &str = "map.count";
/// Non-null element count of the column domain.
pub const NONNULL_COUNT: &str = "map.nonnull.count";

/// Name of the compliant-row count derived from a map metric.
pub fn count_metric(map_metric: &str) -> String {
    format!("{}.count", map_metric)
}

pub fn unexpected_values_metric(map_metric: &str) -> String {
    format!("{}.unexpected_values", map_metric)
}

pub fn unexpected_index_metric(map_metric: &str) -> String {
    format!("{}.unexpected_index", map_metric)
}

/// A computed metric value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MetricValue {
    Count(u64),
    Values(Vec<String>),
    Indices(Vec<usize>),
}

/// Metric values resolved for one validation run, keyed by metric name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetricValues {
    values: HashMap<String, MetricValue>,
}

impl MetricValues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: MetricValue) {
        self.values.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<&MetricValue> {
        self.values.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn count(&self, name: &str) -> Result<u64, ExpectationError> {
        match self.values.get(name) {
            Some(MetricValue::Count(n)) => Ok(*n),
            _ => Err(ExpectationError::MissingMetric(name.to_string())),
        }
    }

    pub fn string_list(&self, name: &str) -> Result<&[String], ExpectationError> {
        match self.values.get(name) {
            Some(MetricValue::Values(v)) => Ok(v),
            _ => Err(ExpectationError::MissingMetric(name.to_string())),
        }
    }

    pub fn index_list(&self, name: &str) -> Result<&[usize], ExpectationError> {
        match self.values.get(name) {
            Some(MetricValue::Indices(v)) => Ok(v),
            _ => Err(ExpectationError::MissingMetric(name.to_string())),
        }
    }

    /// Ensure every named dependency has been resolved.
    pub fn require(&self, dependencies: &[String]) -> Result<(), ExpectationError> {
        for name in dependencies {
            if !self.contains(name) {
                return Err(ExpectationError::MissingMetric(name.clone()));
            }
        }
        Ok(())
    }
}

/// A column coerced to text alongside the per-row map condition.
///
/// `condition[i]` is true when row `i` complies with the map metric.
#[derive(Debug, Clone)]
pub struct ColumnConditions {
    pub values: StringArray,
    pub condition: BooleanArray,
}

/// Derive counts and unexpected lists for `map_metric` from evaluated conditions.
///
/// Null values are excluded from the non-null count and never reported as
/// unexpected.
pub fn aggregate_map_metric(
    map_metric: &str,
    conditions: &ColumnConditions,
) -> Result<MetricValues, ExpectationError> {
    let values = &conditions.values;
    let condition = &conditions.condition;

    if values.len() != condition.len() {
        return Err(ExpectationError::Engine(format!(
            "map metric '{}' produced {} conditions for {} rows",
            map_metric,
            condition.len(),
            values.len()
        )));
    }

    let mut nonnull = 0u64;
    let mut compliant = 0u64;
    let mut unexpected_values = Vec::new();
    let mut unexpected_index = Vec::new();

    for i in 0..values.len() {
        if values.is_null(i) {
            continue;
        }
        nonnull += 1;
        if condition.is_valid(i) && condition.value(i) {
            compliant += 1;
        } else {
            unexpected_values.push(values.value(i).to_string());
            unexpected_index.push(i);
        }
    }

    let mut metrics = MetricValues::new();
    metrics.insert(ELEMENT_COUNT, MetricValue::Count(values.len() as u64));
    metrics.insert(NONNULL_COUNT, MetricValue::Count(nonnull));
    metrics.insert(count_metric(map_metric), MetricValue::Count(compliant));
    metrics.insert(
        unexpected_values_metric(map_metric),
        MetricValue::Values(unexpected_values),
    );
    metrics.insert(
        unexpected_index_metric(map_metric),
        MetricValue::Indices(unexpected_index),
    );
    Ok(metrics)
}
