//! In-process store backend.

use async_trait::async_trait;
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;
use tokio::sync::RwLock;
use tracing::debug;

use crate::backend::{filter_falsy, StoreBackend, StoredConfig};
use crate::error::StoreError;
use crate::key::StoreKey;

/// Keeps serialized objects in memory, ordered by key.
#[derive(Debug)]
pub struct InMemoryStoreBackend {
    objects: RwLock<BTreeMap<StoreKey, Value>>,
    config: Map<String, Value>,
}

impl InMemoryStoreBackend {
    pub fn new(store_name: Option<&str>) -> Self {
        let mut config = json!({
            "store_name": store_name,
            "module_name": module_path!(),
            "class_name": "InMemoryStoreBackend",
        })
        .as_object()
        .cloned()
        .unwrap_or_default();
        filter_falsy(&mut config);

        Self {
            objects: RwLock::new(BTreeMap::new()),
            config,
        }
    }

    pub async fn len(&self) -> usize {
        self.objects.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.objects.read().await.is_empty()
    }
}

impl Default for InMemoryStoreBackend {
    fn default() -> Self {
        Self::new(None)
    }
}

#[async_trait]
impl StoreBackend for InMemoryStoreBackend {
    async fn get(&self, key: &StoreKey) -> Result<Value, StoreError> {
        self.objects
            .read()
            .await
            .get(key)
            .cloned()
            .ok_or_else(|| StoreError::KeyNotFound(key.to_string()))
    }

    async fn set(&self, key: &StoreKey, value: &dyn StoredConfig) -> Result<Value, StoreError> {
        if key.is_empty() {
            return Err(StoreError::InvalidKey("key cannot be empty".to_string()));
        }
        let value = Value::Object(value.to_json_dict()?);
        debug!("Storing object under {}", key);
        self.objects.write().await.insert(key.clone(), value.clone());
        Ok(value)
    }

    async fn list_keys(&self) -> Result<Vec<StoreKey>, StoreError> {
        Ok(self.objects.read().await.keys().cloned().collect())
    }

    async fn remove_key(&self, key: &StoreKey) -> Result<(), StoreError> {
        self.objects
            .write()
            .await
            .remove(key)
            .map(|_| ())
            .ok_or_else(|| StoreError::KeyNotFound(key.to_string()))
    }

    async fn move_key(&self, source: &StoreKey, dest: &StoreKey) -> Result<(), StoreError> {
        let mut objects = self.objects.write().await;
        let value = objects
            .remove(source)
            .ok_or_else(|| StoreError::KeyNotFound(source.to_string()))?;
        objects.insert(dest.clone(), value);
        Ok(())
    }

    async fn has_key(&self, key: &StoreKey) -> Result<bool, StoreError> {
        Ok(self.objects.read().await.contains_key(key))
    }

    fn config(&self) -> &Map<String, Value> {
        &self.config
    }
}
