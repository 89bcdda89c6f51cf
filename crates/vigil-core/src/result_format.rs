//! Result verbosity levels and shaping of column-map validation output.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

use crate::error::ExpectationError;

/// Default number of entries kept in the `partial_*` lists.
pub const DEFAULT_PARTIAL_UNEXPECTED_COUNT: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResultFormatLevel {
    BooleanOnly,
    Basic,
    Summary,
    Complete,
}

impl ResultFormatLevel {
    pub fn parse(s: &str) -> Result<Self, ExpectationError> {
        match s {
            "BOOLEAN_ONLY" => Ok(Self::BooleanOnly),
            "BASIC" => Ok(Self::Basic),
            "SUMMARY" => Ok(Self::Summary),
            "COMPLETE" => Ok(Self::Complete),
            other => Err(ExpectationError::InvalidResultFormat(format!(
                "unknown level '{}' (expected BOOLEAN_ONLY, BASIC, SUMMARY or COMPLETE)",
                other
            ))),
        }
    }
}

/// Parsed result format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResultFormat {
    pub level: ResultFormatLevel,
    pub partial_unexpected_count: usize,
}

impl ResultFormat {
    pub fn new(level: ResultFormatLevel) -> Self {
        Self {
            level,
            partial_unexpected_count: DEFAULT_PARTIAL_UNEXPECTED_COUNT,
        }
    }
}

impl Default for ResultFormat {
    fn default() -> Self {
        Self::new(ResultFormatLevel::Basic)
    }
}

/// Parse a result format given either as a level string (`"SUMMARY"`) or as an
/// object `{"result_format": "SUMMARY", "partial_unexpected_count": 5}`.
pub fn parse_result_format(value: &Value) -> Result<ResultFormat, ExpectationError> {
    match value {
        Value::String(level) => Ok(ResultFormat::new(ResultFormatLevel::parse(level)?)),
        Value::Object(map) => {
            let level = match map.get("result_format") {
                Some(Value::String(level)) => ResultFormatLevel::parse(level)?,
                Some(other) => {
                    return Err(ExpectationError::InvalidResultFormat(format!(
                        "result_format must be a string, got {}",
                        other
                    )))
                }
                None => {
                    return Err(ExpectationError::InvalidResultFormat(
                        "object form requires a 'result_format' key".to_string(),
                    ))
                }
            };
            let partial_unexpected_count = match map.get("partial_unexpected_count") {
                None | Some(Value::Null) => DEFAULT_PARTIAL_UNEXPECTED_COUNT,
                Some(v) => v.as_u64().map(|n| n as usize).ok_or_else(|| {
                    ExpectationError::InvalidResultFormat(format!(
                        "partial_unexpected_count must be a non-negative integer, got {}",
                        v
                    ))
                })?,
            };
            Ok(ResultFormat {
                level,
                partial_unexpected_count,
            })
        }
        other => Err(ExpectationError::InvalidResultFormat(format!(
            "expected a string or an object, got {}",
            other
        ))),
    }
}

/// Occurrence count of one unexpected value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueCount {
    pub value: String,
    pub count: u64,
}

/// Details of a column-map validation, populated according to the result format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapResultDetails {
    pub element_count: u64,
    pub missing_count: u64,
    pub missing_percent: Option<f64>,
    pub unexpected_count: u64,
    pub unexpected_percent: Option<f64>,
    pub unexpected_percent_total: Option<f64>,
    pub unexpected_percent_nonmissing: Option<f64>,
    pub partial_unexpected_list: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partial_unexpected_index_list: Option<Vec<usize>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partial_unexpected_counts: Option<Vec<ValueCount>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unexpected_list: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unexpected_index_list: Option<Vec<usize>>,
}

/// Inputs to [`format_map_output`].
#[derive(Debug, Clone, Copy)]
pub struct MapOutput<'a> {
    pub element_count: u64,
    pub nonnull_count: u64,
    pub unexpected_count: u64,
    pub unexpected_list: &'a [String],
    pub unexpected_index_list: &'a [usize],
}

fn percent(numerator: u64, denominator: u64) -> Option<f64> {
    if denominator == 0 {
        None
    } else {
        Some(numerator as f64 / denominator as f64 * 100.0)
    }
}

/// Count unexpected values, most frequent first, ties by value.
pub fn value_counts(values: &[String], limit: usize) -> Vec<ValueCount> {
    let mut counts: HashMap<&str, u64> = HashMap::new();
    for v in values {
        *counts.entry(v.as_str()).or_insert(0) += 1;
    }
    let mut counts: Vec<ValueCount> = counts
        .into_iter()
        .map(|(value, count)| ValueCount {
            value: value.to_string(),
            count,
        })
        .collect();
    counts.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.value.cmp(&b.value)));
    counts.truncate(limit);
    counts
}

/// Shape a column-map outcome. Returns `None` details for `BOOLEAN_ONLY`.
pub fn format_map_output(format: ResultFormat, output: MapOutput<'_>) -> Option<MapResultDetails> {
    if format.level == ResultFormatLevel::BooleanOnly {
        return None;
    }

    let limit = format.partial_unexpected_count;
    let missing_count = output.element_count.saturating_sub(output.nonnull_count);
    // Percentages over the total are only reported when some value is present.
    let unexpected_percent_total = if output.nonnull_count > 0 {
        percent(output.unexpected_count, output.element_count)
    } else {
        None
    };
    let unexpected_percent_nonmissing = percent(output.unexpected_count, output.nonnull_count);

    let mut details = MapResultDetails {
        element_count: output.element_count,
        missing_count,
        missing_percent: percent(missing_count, output.element_count),
        unexpected_count: output.unexpected_count,
        unexpected_percent: unexpected_percent_nonmissing,
        unexpected_percent_total,
        unexpected_percent_nonmissing,
        partial_unexpected_list: output.unexpected_list.iter().take(limit).cloned().collect(),
        partial_unexpected_index_list: None,
        partial_unexpected_counts: None,
        unexpected_list: None,
        unexpected_index_list: None,
    };

    if format.level >= ResultFormatLevel::Summary {
        details.partial_unexpected_index_list = Some(
            output
                .unexpected_index_list
                .iter()
                .take(limit)
                .copied()
                .collect(),
        );
        details.partial_unexpected_counts = Some(value_counts(output.unexpected_list, limit));
    }

    if format.level == ResultFormatLevel::Complete {
        details.unexpected_list = Some(output.unexpected_list.to_vec());
        details.unexpected_index_list = Some(output.unexpected_index_list.to_vec());
    }

    Some(details)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_string_levels() {
        for (s, level) in [
            ("BOOLEAN_ONLY", ResultFormatLevel::BooleanOnly),
            ("BASIC", ResultFormatLevel::Basic),
            ("SUMMARY", ResultFormatLevel::Summary),
            ("COMPLETE", ResultFormatLevel::Complete),
        ] {
            let format = parse_result_format(&json!(s)).unwrap();
            assert_eq!(format.level, level);
            assert_eq!(format.partial_unexpected_count, DEFAULT_PARTIAL_UNEXPECTED_COUNT);
        }
    }

    #[test]
    fn test_parse_object_form() {
        let format =
            parse_result_format(&json!({"result_format": "SUMMARY", "partial_unexpected_count": 3}))
                .unwrap();
        assert_eq!(format.level, ResultFormatLevel::Summary);
        assert_eq!(format.partial_unexpected_count, 3);
    }

    #[test]
    fn test_parse_rejects_unknown() {
        assert!(matches!(
            parse_result_format(&json!("VERBOSE")),
            Err(ExpectationError::InvalidResultFormat(_))
        ));
        assert!(parse_result_format(&json!(42)).is_err());
        assert!(parse_result_format(&json!({"partial_unexpected_count": 3})).is_err());
        assert!(
            parse_result_format(&json!({"result_format": "BASIC", "partial_unexpected_count": -1}))
                .is_err()
        );
    }

    #[test]
    fn test_value_counts_order() {
        let values = strings(&["b", "a", "b", "c", "a", "b"]);
        let counts = value_counts(&values, 2);
        assert_eq!(
            counts,
            vec![
                ValueCount { value: "b".into(), count: 3 },
                ValueCount { value: "a".into(), count: 2 },
            ]
        );
    }

    #[test]
    fn test_boolean_only_has_no_details() {
        let unexpected = strings(&["x"]);
        let output = MapOutput {
            element_count: 2,
            nonnull_count: 2,
            unexpected_count: 1,
            unexpected_list: &unexpected,
            unexpected_index_list: &[0],
        };
        assert!(format_map_output(ResultFormat::new(ResultFormatLevel::BooleanOnly), output).is_none());
    }

    #[test]
    fn test_levels_add_detail() {
        let unexpected = strings(&["x", "y", "x"]);
        let index = [0usize, 2, 4];
        let output = MapOutput {
            element_count: 6,
            nonnull_count: 5,
            unexpected_count: 3,
            unexpected_list: &unexpected,
            unexpected_index_list: &index,
        };

        let basic = format_map_output(ResultFormat::default(), output).unwrap();
        assert_eq!(basic.missing_count, 1);
        assert_eq!(basic.unexpected_percent, Some(60.0));
        assert_eq!(basic.unexpected_percent_total, Some(50.0));
        assert_eq!(basic.partial_unexpected_list, unexpected);
        assert!(basic.partial_unexpected_index_list.is_none());
        assert!(basic.unexpected_list.is_none());

        let summary = format_map_output(
            ResultFormat {
                level: ResultFormatLevel::Summary,
                partial_unexpected_count: 2,
            },
            output,
        )
        .unwrap();
        assert_eq!(summary.partial_unexpected_list, strings(&["x", "y"]));
        assert_eq!(summary.partial_unexpected_index_list, Some(vec![0, 2]));
        assert_eq!(summary.partial_unexpected_counts.as_ref().unwrap()[0].value, "x");
        assert!(summary.unexpected_index_list.is_none());

        let complete =
            format_map_output(ResultFormat::new(ResultFormatLevel::Complete), output).unwrap();
        assert_eq!(complete.unexpected_list, Some(unexpected.clone()));
        assert_eq!(complete.unexpected_index_list, Some(index.to_vec()));
    }

    #[test]
    fn test_percentages_with_no_values() {
        let output = MapOutput {
            element_count: 0,
            nonnull_count: 0,
            unexpected_count: 0,
            unexpected_list: &[],
            unexpected_index_list: &[],
        };
        let details = format_map_output(ResultFormat::default(), output).unwrap();
        assert_eq!(details.missing_percent, None);
        assert_eq!(details.unexpected_percent, None);
        assert_eq!(details.unexpected_percent_total, None);
    }
}
