//! The key/value store backend contract.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::{Map, Value};
use url::Url;

use crate::error::StoreError;
use crate::key::StoreKey;

/// A configuration object that can be stored: it must serialize to a JSON object.
pub trait StoredConfig: Send + Sync {
    fn to_json_dict(&self) -> Result<Map<String, Value>, StoreError>;
}

impl<T: Serialize + Send + Sync + ?Sized> StoredConfig for T {
    fn to_json_dict(&self) -> Result<Map<String, Value>, StoreError> {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(other) => Err(StoreError::InvalidValue(format!(
                "expected a value serializing to a JSON object, got {}",
                json_kind(&other)
            ))),
            Err(e) => Err(StoreError::InvalidValue(e.to_string())),
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Generic key/value store over configuration objects.
#[async_trait]
pub trait StoreBackend: Send + Sync {
    /// Fetch the object stored under `key`.
    async fn get(&self, key: &StoreKey) -> Result<Value, StoreError>;

    /// Store `value` under `key`, returning the backend's response.
    async fn set(&self, key: &StoreKey, value: &dyn StoredConfig) -> Result<Value, StoreError>;

    async fn list_keys(&self) -> Result<Vec<StoreKey>, StoreError>;

    async fn remove_key(&self, key: &StoreKey) -> Result<(), StoreError>;

    async fn move_key(&self, source: &StoreKey, dest: &StoreKey) -> Result<(), StoreError>;

    /// Whether `key` is present, derived from `list_keys`.
    async fn has_key(&self, key: &StoreKey) -> Result<bool, StoreError> {
        Ok(self.list_keys().await?.contains(key))
    }

    /// URL addressing `key`, for backends that expose one.
    fn url_for_key(&self, _key: &StoreKey) -> Result<Url, StoreError> {
        Err(StoreError::Unsupported("url_for_key"))
    }

    /// Effective configuration of the backend, with falsy fields removed.
    fn config(&self) -> &Map<String, Value>;
}

/// Drop null, `false` and empty-string entries. Numbers are always kept.
pub fn filter_falsy(properties: &mut Map<String, Value>) {
    properties.retain(|_, v| match v {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::String(s) => !s.is_empty(),
        _ => true,
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Serialize)]
    struct Named {
        name: String,
    }

    #[test]
    fn test_struct_serializes_to_object() {
        let map = Named {
            name: "nightly".to_string(),
        }
        .to_json_dict()
        .unwrap();
        assert_eq!(map["name"], json!("nightly"));
    }

    #[test]
    fn test_non_object_is_rejected() {
        let err = "just a string".to_json_dict().unwrap_err();
        assert!(matches!(err, StoreError::InvalidValue(msg) if msg.contains("a string")));
        assert!(vec![1, 2].to_json_dict().is_err());
    }

    #[test]
    fn test_filter_falsy() {
        let mut props = json!({
            "a": null,
            "b": false,
            "c": "",
            "d": true,
            "e": 0,
            "f": "x"
        })
        .as_object()
        .cloned()
        .unwrap();
        filter_falsy(&mut props);
        let mut keys: Vec<&str> = props.keys().map(String::as_str).collect();
        keys.sort_unstable();
        assert_eq!(keys, vec!["d", "e", "f"]);
    }
}
