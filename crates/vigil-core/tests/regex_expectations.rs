//! Integration tests for the regex column expectations across engines

use arrow::array::{ArrayRef, Int64Array, RecordBatch, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use datafusion::dataframe::DataFrameWriteOptions;
use datafusion::prelude::SessionContext;
use serde_json::{json, Value};
use std::sync::Arc;
use vigil_core::{
    ArrowExecutionEngine, ExpectationConfiguration, ExpectationError, RuntimeConfiguration,
    SqlExecutionEngine, ValidationResult, Validator,
};

fn column_batch(values: Vec<Option<&str>>) -> RecordBatch {
    let schema = Arc::new(Schema::new(vec![Field::new("code", DataType::Utf8, true)]));
    RecordBatch::try_new(schema, vec![Arc::new(StringArray::from(values)) as ArrayRef]).unwrap()
}

fn expectation(expectation_type: &str, kwargs: Value) -> ExpectationConfiguration {
    ExpectationConfiguration::new(expectation_type, kwargs.as_object().cloned().unwrap())
}

async fn run(values: Vec<Option<&str>>, config: &ExpectationConfiguration) -> ValidationResult {
    let validator = Validator::new(ArrowExecutionEngine::new(column_batch(values)));
    validator
        .validate(config, &RuntimeConfiguration::default())
        .await
        .unwrap()
}

#[tokio::test]
async fn test_match_regex_reports_non_matching_value() {
    let config = expectation(
        "expect_column_values_to_match_regex",
        json!({"column": "code", "regex": "^\\d+$", "mostly": 1.0}),
    );
    let result = run(vec![Some("123"), Some("abc"), Some("456")], &config).await;

    assert!(!result.success);
    let details = result.result.unwrap();
    assert_eq!(details.unexpected_count, 1);
    assert_eq!(details.partial_unexpected_list, vec!["abc".to_string()]);
}

#[tokio::test]
async fn test_not_match_regex_succeeds_only_when_nothing_matches() {
    let config = expectation(
        "expect_column_values_to_not_match_regex",
        json!({"column": "code", "regex": "^\\d+$"}),
    );

    let result = run(vec![Some("abc"), Some("def"), None], &config).await;
    assert!(result.success);
    assert_eq!(result.result.unwrap().unexpected_count, 0);

    let result = run(vec![Some("abc"), Some("123"), None], &config).await;
    assert!(!result.success);
    let details = result.result.unwrap();
    assert_eq!(details.unexpected_count, 1);
    assert_eq!(details.partial_unexpected_list, vec!["123".to_string()]);
}

#[tokio::test]
async fn test_not_match_regex_counts_matches_as_unexpected_with_inclusive_mostly() {
    let values = vec![Some("1"), Some("2"), Some("a"), Some("b")];

    let at_half = expectation(
        "expect_column_values_to_not_match_regex",
        json!({"column": "code", "regex": "\\d", "mostly": 0.5}),
    );
    let result = run(values.clone(), &at_half).await;
    assert!(result.success);
    assert_eq!(result.result.unwrap().unexpected_count, 2);

    let above_half = expectation(
        "expect_column_values_to_not_match_regex",
        json!({"column": "code", "regex": "\\d", "mostly": 0.51}),
    );
    assert!(!run(values, &above_half).await.success);
}

#[tokio::test]
async fn test_all_null_column_succeeds_consistently() {
    let config = expectation(
        "expect_column_values_to_not_match_regex",
        json!({"column": "code", "regex": "."}),
    );
    for _ in 0..3 {
        let result = run(vec![None, None], &config).await;
        assert!(result.success);
        let details = result.result.unwrap();
        assert_eq!(details.element_count, 2);
        assert_eq!(details.missing_count, 2);
        assert_eq!(details.unexpected_percent, None);
    }
}

#[tokio::test]
async fn test_runtime_result_format_complete() {
    let config = expectation(
        "expect_column_values_to_match_regex",
        json!({"column": "code", "regex": "^a"}),
    );
    let validator = Validator::new(ArrowExecutionEngine::new(column_batch(vec![
        Some("ab"),
        Some("zz"),
        None,
        Some("zz"),
    ])));
    let runtime = RuntimeConfiguration {
        result_format: Some(json!("COMPLETE")),
        ..Default::default()
    };

    let result = validator.validate(&config, &runtime).await.unwrap();
    let details = result.result.unwrap();
    assert_eq!(details.unexpected_index_list, Some(vec![1, 3]));
    assert_eq!(
        details.unexpected_list,
        Some(vec!["zz".to_string(), "zz".to_string()])
    );
    assert_eq!(details.partial_unexpected_counts.unwrap()[0].count, 2);
}

#[tokio::test]
async fn test_boolean_only_result() {
    let config = expectation(
        "expect_column_values_to_match_regex",
        json!({"column": "code", "regex": "^a", "result_format": "BOOLEAN_ONLY"}),
    );
    let result = run(vec![Some("ab")], &config).await;
    assert!(result.success);
    assert!(result.result.is_none());
}

#[tokio::test]
async fn test_numeric_column_is_coerced_to_text() {
    let schema = Arc::new(Schema::new(vec![Field::new("n", DataType::Int64, true)]));
    let batch = RecordBatch::try_new(
        schema,
        vec![Arc::new(Int64Array::from(vec![Some(10), Some(7), None])) as ArrayRef],
    )
    .unwrap();
    let validator = Validator::new(ArrowExecutionEngine::new(batch));
    let config = expectation(
        "expect_column_values_to_match_regex",
        json!({"column": "n", "regex": "^\\d{2}$"}),
    );

    let result = validator
        .validate(&config, &RuntimeConfiguration::default())
        .await
        .unwrap();
    assert!(!result.success);
    assert_eq!(
        result.result.unwrap().partial_unexpected_list,
        vec!["7".to_string()]
    );
}

#[tokio::test]
async fn test_datafusion_engine_over_csv_agrees_with_arrow() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("codes.csv");
    std::fs::write(&path, "id,code\n1,123\n2,abc\n3,\n4,456\n").unwrap();

    let engine = SqlExecutionEngine::new("codes");
    engine.register_csv(path.to_str().unwrap()).await.unwrap();
    let validator = Validator::new(engine);

    let config = expectation(
        "expect_column_values_to_match_regex",
        json!({"column": "code", "regex": "^\\d+$", "result_format": "COMPLETE"}),
    );
    let sql_result = validator
        .validate(&config, &RuntimeConfiguration::default())
        .await
        .unwrap();

    let arrow_result = run(vec![Some("123"), Some("abc"), None, Some("456")], &config).await;

    assert_eq!(sql_result.success, arrow_result.success);
    let sql_details = sql_result.result.unwrap();
    let arrow_details = arrow_result.result.unwrap();
    assert_eq!(sql_details.element_count, 4);
    assert_eq!(sql_details.missing_count, 1);
    assert_eq!(sql_details.unexpected_list, arrow_details.unexpected_list);
    assert_eq!(sql_details.unexpected_index_list, Some(vec![1]));
}

#[tokio::test]
async fn test_datafusion_engine_over_parquet() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("codes.parquet");
    let path_str = path.to_str().unwrap();

    let writer = SessionContext::new();
    writer
        .read_batch(column_batch(vec![Some("123"), Some("abc"), None, Some("456")]))
        .unwrap()
        .write_parquet(
            path_str,
            DataFrameWriteOptions::new().with_single_file_output(true),
            None,
        )
        .await
        .unwrap();

    let engine = SqlExecutionEngine::new("daily-codes");
    engine.register_parquet(path_str).await.unwrap();
    let validator = Validator::new(engine);

    let config = expectation(
        "expect_column_values_to_match_regex",
        json!({"column": "code", "regex": "^\\d+$", "result_format": "COMPLETE"}),
    );
    let result = validator
        .validate(&config, &RuntimeConfiguration::default())
        .await
        .unwrap();

    assert!(!result.success);
    let details = result.result.unwrap();
    assert_eq!(details.element_count, 4);
    assert_eq!(details.missing_count, 1);
    assert_eq!(details.unexpected_list, Some(vec!["abc".to_string()]));
    assert_eq!(details.unexpected_index_list, Some(vec![1]));
}

#[tokio::test]
async fn test_datafusion_not_match_over_batch() {
    let engine = SqlExecutionEngine::new("batch");
    engine
        .register_batch(column_batch(vec![Some("ok"), Some("o'k"), Some("fine")]))
        .unwrap();
    let validator = Validator::new(engine);

    let config = expectation(
        "expect_column_values_to_not_match_regex",
        json!({"column": "code", "regex": "'"}),
    );
    let result = validator
        .validate(&config, &RuntimeConfiguration::default())
        .await
        .unwrap();
    assert!(!result.success);
    assert_eq!(
        result.result.unwrap().partial_unexpected_list,
        vec!["o'k".to_string()]
    );
}

#[tokio::test]
async fn test_non_boolean_flag_is_a_configuration_error() {
    let validator = Validator::new(ArrowExecutionEngine::new(column_batch(vec![Some("ab")])));
    let config = expectation(
        "expect_column_values_to_match_regex",
        json!({"column": "code", "regex": "^a", "include_config": "true"}),
    );

    let err = validator
        .validate(&config, &RuntimeConfiguration::default())
        .await
        .unwrap_err();
    assert!(matches!(err, ExpectationError::InvalidConfiguration(_)));
}
