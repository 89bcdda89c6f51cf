//! Checkpoint configuration: the object persisted by the cloud store.

use serde::{Deserialize, Serialize};
use serde_json::Value;

fn default_class_name() -> String {
    "Checkpoint".to_string()
}

fn default_config_version() -> f64 {
    1.0
}

/// A checkpoint ties an expectation suite to the data it validates and the
/// actions run afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckpointConfig {
    pub name: String,
    #[serde(default = "default_config_version")]
    pub config_version: f64,
    #[serde(default = "default_class_name")]
    pub class_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_name_template: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expectation_suite_name: Option<String>,
    #[serde(default)]
    pub action_list: Vec<Value>,
    #[serde(default)]
    pub validations: Vec<Value>,
}

impl CheckpointConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            config_version: default_config_version(),
            class_name: default_class_name(),
            template_name: None,
            run_name_template: None,
            expectation_suite_name: None,
            action_list: Vec::new(),
            validations: Vec::new(),
        }
    }

    pub fn with_expectation_suite(mut self, suite: impl Into<String>) -> Self {
        self.expectation_suite_name = Some(suite.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::StoredConfig;
    use serde_json::json;

    #[test]
    fn test_defaults_from_minimal_json() {
        let checkpoint: CheckpointConfig =
            serde_json::from_value(json!({"name": "nightly"})).unwrap();
        assert_eq!(checkpoint, CheckpointConfig::new("nightly"));
    }

    #[test]
    fn test_to_json_dict_omits_absent_optionals() {
        let dict = CheckpointConfig::new("nightly")
            .with_expectation_suite("orders.warning")
            .to_json_dict()
            .unwrap();
        assert_eq!(dict["name"], json!("nightly"));
        assert_eq!(dict["class_name"], json!("Checkpoint"));
        assert_eq!(dict["expectation_suite_name"], json!("orders.warning"));
        assert!(!dict.contains_key("template_name"));
        assert_eq!(dict["action_list"], json!([]));
    }
}
