//! Explicit registry of metric functions keyed by (metric name, engine).

use arrow::array::{BooleanArray, StringArray};
use std::collections::HashMap;
use tracing::debug;

use crate::engine::EngineKind;
use crate::error::ExpectationError;
use crate::metrics::MetricKwargs;

/// Per-row map condition over text values, computed in memory.
pub type ArrowMapFn = fn(&StringArray, &MetricKwargs) -> Result<BooleanArray, ExpectationError>;

/// Builds a boolean SQL expression over `value_expr` (a text expression).
pub type SqlMapFn = fn(&str, &MetricKwargs) -> Result<String, ExpectationError>;

/// Engine-specific implementation of a map metric.
#[derive(Clone, Copy)]
pub enum MapMetricProvider {
    Arrow(ArrowMapFn),
    Sql(SqlMapFn),
}

impl MapMetricProvider {
    pub fn engine(&self) -> EngineKind {
        match self {
            MapMetricProvider::Arrow(_) => EngineKind::Arrow,
            MapMetricProvider::Sql(_) => EngineKind::DataFusion,
        }
    }
}

impl std::fmt::Debug for MapMetricProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "MapMetricProvider({})", self.engine())
    }
}

/// Registry mapping `(metric name, engine)` to a metric function.
#[derive(Debug, Clone, Default)]
pub struct MetricRegistry {
    providers: HashMap<(String, EngineKind), MapMetricProvider>,
}

impl MetricRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with every built-in metric registered for every engine.
    pub fn with_builtin_metrics() -> Self {
        let mut registry = Self::new();
        crate::expectations::regex::register_regex_metrics(&mut registry);
        registry
    }

    /// Register `provider` for `metric`. The engine is implied by the provider.
    /// A previous registration for the same key is replaced.
    pub fn register(&mut self, metric: impl Into<String>, provider: MapMetricProvider) {
        let metric = metric.into();
        debug!("Registering metric {} for {} engine", metric, provider.engine());
        self.providers.insert((metric, provider.engine()), provider);
    }

    /// Resolve the provider for `metric` on `engine`.
    pub fn resolve(
        &self,
        metric: &str,
        engine: EngineKind,
    ) -> Result<MapMetricProvider, ExpectationError> {
        self.providers
            .get(&(metric.to_string(), engine))
            .copied()
            .ok_or_else(|| ExpectationError::MetricNotRegistered {
                metric: metric.to_string(),
                engine,
            })
    }

    pub fn contains(&self, metric: &str, engine: EngineKind) -> bool {
        self.providers.contains_key(&(metric.to_string(), engine))
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}
