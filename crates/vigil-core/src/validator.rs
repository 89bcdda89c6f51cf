//! Validation runs: resolve metrics for an expectation and evaluate it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::engine::ExecutionEngine;
use crate::error::ExpectationError;
use crate::expectation::{
    Expectation, ExpectationConfiguration, ExpectationRegistry, RuntimeConfiguration,
    ValidationResult,
};
use crate::metrics::{aggregate_map_metric, MetricValues};
use crate::registry::MetricRegistry;

/// A named, ordered collection of expectation configurations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpectationSuite {
    pub expectation_suite_name: String,
    #[serde(default)]
    pub expectations: Vec<ExpectationConfiguration>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuiteStatistics {
    pub evaluated_expectations: usize,
    pub successful_expectations: usize,
    pub unsuccessful_expectations: usize,
    pub success_percent: Option<f64>,
}

impl SuiteStatistics {
    fn from_results(results: &[ValidationResult]) -> Self {
        let evaluated = results.len();
        let successful = results.iter().filter(|r| r.success).count();
        Self {
            evaluated_expectations: evaluated,
            successful_expectations: successful,
            unsuccessful_expectations: evaluated - successful,
            success_percent: if evaluated == 0 {
                None
            } else {
                Some(successful as f64 / evaluated as f64 * 100.0)
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuiteValidationResult {
    pub expectation_suite_name: String,
    pub success: bool,
    pub results: Vec<ValidationResult>,
    pub statistics: SuiteStatistics,
    pub validation_time: DateTime<Utc>,
}

/// Check every expectation's configuration without touching data.
///
/// Returns all failures, indexed by position in the suite.
pub fn check_suite(
    suite: &ExpectationSuite,
    expectations: &ExpectationRegistry,
) -> Result<(), Vec<(usize, ExpectationError)>> {
    let errors: Vec<(usize, ExpectationError)> = suite
        .expectations
        .iter()
        .enumerate()
        .filter_map(|(i, config)| {
            expectations
                .get(&config.expectation_type)
                .and_then(|e| e.validate_configuration(config))
                .err()
                .map(|e| (i, e))
        })
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Validates expectations against the data behind one execution engine.
pub struct Validator<E: ExecutionEngine> {
    engine: E,
    metrics: MetricRegistry,
    expectations: ExpectationRegistry,
}

impl<E: ExecutionEngine> Validator<E> {
    /// Create a validator with all built-in metrics and expectations.
    pub fn new(engine: E) -> Self {
        Self::with_registries(
            engine,
            MetricRegistry::with_builtin_metrics(),
            ExpectationRegistry::with_builtin_expectations(),
        )
    }

    pub fn with_registries(
        engine: E,
        metrics: MetricRegistry,
        expectations: ExpectationRegistry,
    ) -> Self {
        Self {
            engine,
            metrics,
            expectations,
        }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn expectations(&self) -> &ExpectationRegistry {
        &self.expectations
    }

    /// Resolve every metric the expectation depends on.
    pub async fn resolve_metrics(
        &self,
        expectation: &dyn Expectation,
        configuration: &ExpectationConfiguration,
    ) -> Result<MetricValues, ExpectationError> {
        let column = configuration.column()?;
        let map_metric = expectation.map_metric();
        let provider = self.metrics.resolve(map_metric, self.engine.kind())?;
        let kwargs = configuration.select_kwargs(expectation.metric_value_keys());

        debug!(
            "Resolving {} on column {} with the {} engine",
            map_metric,
            column,
            self.engine.kind()
        );
        let conditions = self
            .engine
            .evaluate_map_metric(column, provider, &kwargs)
            .await?;
        let values = aggregate_map_metric(map_metric, &conditions)?;
        values.require(&expectation.metric_dependencies())?;
        Ok(values)
    }

    /// Validate one expectation.
    ///
    /// Configuration errors always propagate. Errors raised while computing
    /// metrics become a failed result when `catch_exceptions` is set.
    pub async fn validate(
        &self,
        configuration: &ExpectationConfiguration,
        runtime: &RuntimeConfiguration,
    ) -> Result<ValidationResult, ExpectationError> {
        let expectation = self.expectations.get(&configuration.expectation_type)?;
        expectation.validate_configuration(configuration)?;

        let defaults = expectation.default_kwarg_values();
        let catch_exceptions = runtime
            .catch_exceptions
            .or_else(|| configuration.bool_kwarg("catch_exceptions"))
            .unwrap_or(defaults.catch_exceptions);
        let include_config = runtime
            .include_config
            .or_else(|| configuration.bool_kwarg("include_config"))
            .unwrap_or(defaults.include_config);

        let outcome = match self
            .resolve_metrics(expectation.as_ref(), configuration)
            .await
        {
            Ok(metrics) => expectation.validates(configuration, &metrics, runtime),
            Err(e) => Err(e),
        };

        let mut result = match outcome {
            Ok(result) => result,
            Err(e) if catch_exceptions => {
                warn!(
                    "{} raised an exception: {}",
                    configuration.expectation_type, e
                );
                ValidationResult::from_exception(&e)
            }
            Err(e) => return Err(e),
        };

        if include_config {
            result.expectation_config = Some(configuration.clone());
        }

        if result.success {
            info!("PASS: {}", configuration.expectation_type);
        } else {
            warn!("FAIL: {}", configuration.expectation_type);
        }
        Ok(result)
    }

    /// Validate every expectation of a suite in order.
    pub async fn validate_suite(
        &self,
        suite: &ExpectationSuite,
        runtime: &RuntimeConfiguration,
    ) -> Result<SuiteValidationResult, ExpectationError> {
        info!(
            "Validating suite {} ({} expectations)",
            suite.expectation_suite_name,
            suite.expectations.len()
        );

        let mut results = Vec::with_capacity(suite.expectations.len());
        for configuration in &suite.expectations {
            results.push(self.validate(configuration, runtime).await?);
        }

        let statistics = SuiteStatistics::from_results(&results);
        info!(
            "Suite {}: {}/{} expectations succeeded",
            suite.expectation_suite_name,
            statistics.successful_expectations,
            statistics.evaluated_expectations
        );

        Ok(SuiteValidationResult {
            expectation_suite_name: suite.expectation_suite_name.clone(),
            success: statistics.unsuccessful_expectations == 0,
            results,
            statistics,
            validation_time: Utc::now(),
        })
    }
}
