//! User-Defined Functions backing SQL metric evaluation

use arrow::array::{Array, ArrayRef, BooleanArray, StringArray};
use arrow::compute::cast;
use arrow::datatypes::DataType;
use datafusion::error::DataFusionError;
use datafusion::logical_expr::{ColumnarValue, ScalarUDF, Volatility};
use datafusion::prelude::SessionContext;
use regex::Regex;
use std::collections::HashMap;
use std::sync::Arc;

/// Register all validation UDFs with the session context
pub fn register_validation_udfs(ctx: &SessionContext) {
    ctx.register_udf(regex_match_udf());
}

/// Create the regex_match UDF
///
/// regex_match(text, pattern) -> bool
/// Returns true if `pattern` matches anywhere in `text`. NULL in, NULL out.
pub fn regex_match_udf() -> ScalarUDF {
    ScalarUDF::new_from_impl(RegexMatch::new())
}

#[derive(Debug)]
struct RegexMatch {
    signature: datafusion::logical_expr::Signature,
}

impl RegexMatch {
    fn new() -> Self {
        Self {
            signature: datafusion::logical_expr::Signature::uniform(
                2,
                vec![DataType::Utf8],
                Volatility::Immutable,
            ),
        }
    }
}

fn to_string_array(arg: &ColumnarValue, num_rows: usize) -> datafusion::error::Result<ArrayRef> {
    let array = match arg {
        ColumnarValue::Array(arr) => arr.clone(),
        ColumnarValue::Scalar(s) => s.to_array_of_size(num_rows)?,
    };
    Ok(cast(array.as_ref(), &DataType::Utf8)?)
}

impl datafusion::logical_expr::ScalarUDFImpl for RegexMatch {
    fn as_any(&self) -> &dyn std::any::Any {
        self
    }

    fn name(&self) -> &str {
        "regex_match"
    }

    fn signature(&self) -> &datafusion::logical_expr::Signature {
        &self.signature
    }

    fn return_type(&self, _arg_types: &[DataType]) -> datafusion::error::Result<DataType> {
        Ok(DataType::Boolean)
    }

    fn invoke_batch(
        &self,
        args: &[ColumnarValue],
        num_rows: usize,
    ) -> datafusion::error::Result<ColumnarValue> {
        if args.len() != 2 {
            return Err(DataFusionError::Internal(
                "regex_match expects exactly 2 arguments".into(),
            ));
        }
        let text = to_string_array(&args[0], num_rows)?;
        let pattern = to_string_array(&args[1], num_rows)?;

        let text_arr = text.as_any().downcast_ref::<StringArray>().ok_or_else(|| {
            DataFusionError::Internal("Expected StringArray for arg 0".into())
        })?;
        let pattern_arr = pattern.as_any().downcast_ref::<StringArray>().ok_or_else(|| {
            DataFusionError::Internal("Expected StringArray for arg 1".into())
        })?;

        // Patterns are almost always a literal; compile each distinct one once.
        let mut compiled: HashMap<&str, Regex> = HashMap::new();
        let mut result = Vec::with_capacity(text_arr.len());
        for (text_opt, pattern_opt) in text_arr.iter().zip(pattern_arr.iter()) {
            let (Some(text), Some(pattern)) = (text_opt, pattern_opt) else {
                result.push(None);
                continue;
            };
            if !compiled.contains_key(pattern) {
                let regex = Regex::new(pattern).map_err(|e| {
                    DataFusionError::Execution(format!("invalid regex '{}': {}", pattern, e))
                })?;
                compiled.insert(pattern, regex);
            }
            result.push(compiled.get(pattern).map(|r| r.is_match(text)));
        }

        Ok(ColumnarValue::Array(
            Arc::new(BooleanArray::from(result)) as ArrayRef
        ))
    }
}
