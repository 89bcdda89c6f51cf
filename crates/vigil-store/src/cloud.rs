//! Store backend over a JSON:API cloud resource.

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use serde_json::{json, Map, Value};
use std::time::Duration;
use tracing::{debug, info};
use url::Url;
use uuid::Uuid;

use crate::backend::{filter_falsy, StoreBackend, StoredConfig};
use crate::config::CloudStoreConfig;
use crate::error::StoreError;
use crate::key::StoreKey;

/// Content type of every request sent to the cloud API.
pub const JSON_API_CONTENT_TYPE: &str = "application/vnd.api+json";

/// Cloud keys hold exactly one part: the resource id.
const KEY_LENGTH: usize = 1;

/// Stores configuration objects as JSON:API resources under
/// `{base_url}/{resource_name}`.
///
/// Only fetch and create are backed by the API; listing, removal and moves
/// return [`StoreError::Unsupported`].
#[derive(Debug)]
pub struct CloudStoreBackend {
    settings: CloudStoreConfig,
    base_url: Url,
    client: reqwest::Client,
    store_backend_id: Option<String>,
    config: Map<String, Value>,
}

impl CloudStoreBackend {
    pub fn new(settings: CloudStoreConfig) -> Result<Self, StoreError> {
        if settings.resource_name.trim().is_empty() {
            return Err(StoreError::Config("resource_name cannot be empty".to_string()));
        }
        if settings.resource_type.trim().is_empty() {
            return Err(StoreError::Config("resource_type cannot be empty".to_string()));
        }

        // A trailing slash makes joins append to the base path instead of
        // replacing its last segment.
        let mut base = settings.base_url.clone();
        if !base.ends_with('/') {
            base.push('/');
        }
        let base_url = Url::parse(&base)?;
        if base_url.cannot_be_a_base() {
            return Err(StoreError::Config(format!(
                "base_url cannot be used as a base: {}",
                settings.base_url
            )));
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(StoreError::Transport)?;

        let store_backend_id = if settings.suppress_store_backend_id {
            None
        } else if !settings.manually_initialize_store_backend_id.is_empty() {
            Some(settings.manually_initialize_store_backend_id.clone())
        } else {
            Some(Uuid::new_v4().to_string())
        };

        let mut config = json!({
            "base_url": settings.base_url,
            "resource_name": settings.resource_name,
            "resource_type": settings.resource_type,
            "fixed_length_key": true,
            "suppress_store_backend_id": settings.suppress_store_backend_id,
            "manually_initialize_store_backend_id": settings.manually_initialize_store_backend_id,
            "store_name": settings.store_name,
            "module_name": module_path!(),
            "class_name": "CloudStoreBackend",
        })
        .as_object()
        .cloned()
        .unwrap_or_default();
        filter_falsy(&mut config);

        info!(
            "CloudStoreBackend initialized for {}{}",
            base_url, settings.resource_name
        );

        Ok(Self {
            settings,
            base_url,
            client,
            store_backend_id,
            config,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn resource_name(&self) -> &str {
        &self.settings.resource_name
    }

    pub fn resource_type(&self) -> &str {
        &self.settings.resource_type
    }

    /// Identifier of this store, unless suppressed.
    pub fn store_backend_id(&self) -> Option<&str> {
        self.store_backend_id.as_deref()
    }

    /// URL of the resource collection.
    pub fn collection_url(&self) -> Result<Url, StoreError> {
        Ok(self.base_url.join(&self.settings.resource_name)?)
    }

    /// JSON:API envelope submitted by `set`.
    pub fn payload(&self, value: &dyn StoredConfig) -> Result<Value, StoreError> {
        Ok(json!({
            "data": {
                "type": self.settings.resource_type,
                "attributes": {
                    "created_by_id": self.settings.created_by_id.to_string(),
                    "checkpoint_config": value.to_json_dict()?,
                },
            }
        }))
    }

    fn request(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        let builder = builder.header(CONTENT_TYPE, JSON_API_CONTENT_TYPE);
        match &self.settings.access_token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn read_json(url: Url, response: reqwest::Response) -> Result<Value, StoreError> {
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(StoreError::Http {
                status: status.as_u16(),
                url: url.to_string(),
                body,
            });
        }
        if body.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&body).map_err(|e| StoreError::Decode {
            url: url.to_string(),
            message: e.to_string(),
        })
    }

    async fn post(&self, payload: &Value) -> Result<Value, StoreError> {
        let url = self.collection_url()?;
        let body =
            serde_json::to_vec(payload).map_err(|e| StoreError::InvalidValue(e.to_string()))?;

        debug!("POST {}", url);
        let response = self
            .request(self.client.post(url.clone()))
            .body(body)
            .send()
            .await?;
        Self::read_json(url, response).await
    }
}

#[async_trait]
impl StoreBackend for CloudStoreBackend {
    async fn get(&self, key: &StoreKey) -> Result<Value, StoreError> {
        let url = self.url_for_key(key)?;

        debug!("GET {}", url);
        let response = self.request(self.client.get(url.clone())).send().await?;
        Self::read_json(url, response).await
    }

    async fn set(&self, key: &StoreKey, value: &dyn StoredConfig) -> Result<Value, StoreError> {
        key.validate_fixed_length(KEY_LENGTH)?;
        let payload = self.payload(value)?;

        self.post(&payload).await.map_err(|e| {
            debug!("{}", e);
            StoreError::SetFailed(Box::new(e))
        })
    }

    async fn list_keys(&self) -> Result<Vec<StoreKey>, StoreError> {
        Err(StoreError::Unsupported("list_keys"))
    }

    async fn remove_key(&self, _key: &StoreKey) -> Result<(), StoreError> {
        Err(StoreError::Unsupported("remove_key"))
    }

    async fn move_key(&self, _source: &StoreKey, _dest: &StoreKey) -> Result<(), StoreError> {
        Err(StoreError::Unsupported("move_key"))
    }

    fn url_for_key(&self, key: &StoreKey) -> Result<Url, StoreError> {
        let id = key.resource_id()?;
        let mut url = self.collection_url()?;
        url.path_segments_mut()
            .map_err(|_| StoreError::Config(format!("cannot extend url {}", self.base_url)))?
            .pop_if_empty()
            .push(id);
        Ok(url)
    }

    fn config(&self) -> &Map<String, Value> {
        &self.config
    }
}
