//! Execution engines that evaluate map metrics over a column.

use arrow::array::{Array, ArrayRef, BooleanArray, RecordBatch, StringArray};
use arrow::compute::{cast, concat};
use arrow::datatypes::DataType;
use async_trait::async_trait;
use datafusion::common::TableReference;
use datafusion::datasource::MemTable;
use datafusion::error::Result as DFResult;
use datafusion::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

use crate::error::ExpectationError;
use crate::metrics::{ColumnConditions, MetricKwargs};
use crate::registry::MapMetricProvider;
use crate::udf;

/// Engine variant a metric function is registered for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineKind {
    /// In-memory Arrow arrays.
    Arrow,
    /// DataFusion SQL over registered tables.
    DataFusion,
}

impl fmt::Display for EngineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineKind::Arrow => write!(f, "arrow"),
            EngineKind::DataFusion => write!(f, "datafusion"),
        }
    }
}

/// Evaluates registered map metrics over a named column.
#[async_trait]
pub trait ExecutionEngine: Send + Sync {
    fn kind(&self) -> EngineKind;

    /// Coerce `column` to text and evaluate `provider` for every row.
    async fn evaluate_map_metric(
        &self,
        column: &str,
        provider: MapMetricProvider,
        kwargs: &MetricKwargs,
    ) -> Result<ColumnConditions, ExpectationError>;
}

fn provider_mismatch(provider: MapMetricProvider, engine: EngineKind) -> ExpectationError {
    ExpectationError::Engine(format!(
        "metric function for the {} engine cannot run on the {} engine",
        provider.engine(),
        engine
    ))
}

fn as_string_array(array: &ArrayRef) -> Result<StringArray, ExpectationError> {
    let text = cast(array.as_ref(), &DataType::Utf8)?;
    text.as_any()
        .downcast_ref::<StringArray>()
        .cloned()
        .ok_or_else(|| ExpectationError::Engine("expected Utf8 array after cast".into()))
}

fn as_boolean_array(array: &ArrayRef) -> Result<BooleanArray, ExpectationError> {
    let flags = cast(array.as_ref(), &DataType::Boolean)?;
    flags
        .as_any()
        .downcast_ref::<BooleanArray>()
        .cloned()
        .ok_or_else(|| ExpectationError::Engine("expected Boolean array after cast".into()))
}

/// Engine over a single in-memory record batch.
#[derive(Debug, Clone)]
pub struct ArrowExecutionEngine {
    batch: RecordBatch,
}

impl ArrowExecutionEngine {
    pub fn new(batch: RecordBatch) -> Self {
        Self { batch }
    }

    pub fn batch(&self) -> &RecordBatch {
        &self.batch
    }
}

#[async_trait]
impl ExecutionEngine for ArrowExecutionEngine {
    fn kind(&self) -> EngineKind {
        EngineKind::Arrow
    }

    async fn evaluate_map_metric(
        &self,
        column: &str,
        provider: MapMetricProvider,
        kwargs: &MetricKwargs,
    ) -> Result<ColumnConditions, ExpectationError> {
        let MapMetricProvider::Arrow(map_fn) = provider else {
            return Err(provider_mismatch(provider, self.kind()));
        };

        let array = self
            .batch
            .column_by_name(column)
            .ok_or_else(|| ExpectationError::ColumnNotFound(column.to_string()))?;
        let values = as_string_array(array)?;
        let condition = map_fn(&values, kwargs)?;

        debug!(
            "Evaluated map metric on column {} ({} rows, arrow)",
            column,
            values.len()
        );
        Ok(ColumnConditions { values, condition })
    }
}

/// Engine wrapping a DataFusion SessionContext with validation UDFs registered.
///
/// All data is read from one table. The context runs with a single target
/// partition so that row indices reported for unexpected values follow the
/// scan order of the source.
pub struct SqlExecutionEngine {
    ctx: SessionContext,
    table: String,
}

impl SqlExecutionEngine {
    /// Create a new engine reading from `table`
    pub fn new(table: impl Into<String>) -> Self {
        let config = SessionConfig::new().with_target_partitions(1);
        let ctx = SessionContext::new_with_config(config);

        udf::register_validation_udfs(&ctx);

        let table = table.into();
        info!("SqlExecutionEngine initialized for table {}", table);

        Self { ctx, table }
    }

    /// Get a reference to the underlying SessionContext
    pub fn context(&self) -> &SessionContext {
        &self.ctx
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// The table name taken verbatim, without case folding or splitting on dots.
    fn table_ref(&self) -> TableReference {
        TableReference::bare(self.table.as_str())
    }

    /// Register a CSV file as the validated table
    pub async fn register_csv(&self, path: &str) -> DFResult<()> {
        self.ctx
            .register_csv(self.table_ref(), path, CsvReadOptions::default())
            .await
    }

    /// Register a Parquet file as the validated table
    pub async fn register_parquet(&self, path: &str) -> DFResult<()> {
        self.ctx
            .register_parquet(self.table_ref(), path, ParquetReadOptions::default())
            .await
    }

    /// Register an in-memory batch as the validated table
    pub fn register_batch(&self, batch: RecordBatch) -> DFResult<()> {
        let table = MemTable::try_new(batch.schema(), vec![vec![batch]])?;
        self.ctx.register_table(self.table_ref(), Arc::new(table))?;
        Ok(())
    }

    /// Execute a SQL query and return a DataFrame
    pub async fn sql(&self, query: &str) -> DFResult<DataFrame> {
        self.ctx.sql(query).await
    }

    async fn ensure_column(&self, column: &str) -> Result<(), ExpectationError> {
        let df = self.ctx.table(self.table_ref()).await?;
        if df.schema().field_with_unqualified_name(column).is_err() {
            return Err(ExpectationError::ColumnNotFound(column.to_string()));
        }
        Ok(())
    }
}

/// Quote a SQL identifier, preserving case.
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Quote a SQL string literal.
pub fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

#[async_trait]
impl ExecutionEngine for SqlExecutionEngine {
    fn kind(&self) -> EngineKind {
        EngineKind::DataFusion
    }

    async fn evaluate_map_metric(
        &self,
        column: &str,
        provider: MapMetricProvider,
        kwargs: &MetricKwargs,
    ) -> Result<ColumnConditions, ExpectationError> {
        let MapMetricProvider::Sql(build_expr) = provider else {
            return Err(provider_mismatch(provider, self.kind()));
        };

        self.ensure_column(column).await?;

        let value_expr = format!("CAST({} AS VARCHAR)", quote_identifier(column));
        let condition_expr = build_expr(&value_expr, kwargs)?;
        let query = format!(
            "SELECT {} AS vigil_value, {} AS vigil_condition FROM {}",
            value_expr,
            condition_expr,
            quote_identifier(&self.table)
        );
        debug!("Evaluating map metric: {}", query);

        let batches = self.sql(&query).await?.collect().await?;

        let mut value_parts: Vec<ArrayRef> = Vec::with_capacity(batches.len());
        let mut condition_parts: Vec<ArrayRef> = Vec::with_capacity(batches.len());
        for batch in &batches {
            value_parts.push(batch.column(0).clone());
            condition_parts.push(batch.column(1).clone());
        }

        let conditions = if value_parts.is_empty() {
            ColumnConditions {
                values: StringArray::from(Vec::<Option<&str>>::new()),
                condition: BooleanArray::from(Vec::<Option<bool>>::new()),
            }
        } else {
            let values: Vec<&dyn Array> = value_parts.iter().map(|a| a.as_ref()).collect();
            let flags: Vec<&dyn Array> = condition_parts.iter().map(|a| a.as_ref()).collect();
            ColumnConditions {
                values: as_string_array(&concat(&values)?)?,
                condition: as_boolean_array(&concat(&flags)?)?,
            }
        };

        debug!(
            "Evaluated map metric on column {} ({} rows, datafusion)",
            column,
            conditions.values.len()
        );
        Ok(conditions)
    }
}
