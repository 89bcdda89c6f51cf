//! Cloud store configuration from environment variables.

use anyhow::{Context, Result};
use uuid::Uuid;

/// Settings for [`CloudStoreBackend`](crate::CloudStoreBackend).
#[derive(Debug, Clone, PartialEq)]
pub struct CloudStoreConfig {
    pub base_url: String,
    /// Path segment of the resource collection, e.g. `checkpoints`.
    pub resource_name: String,
    /// JSON:API `type` of submitted resources, e.g. `checkpoint`.
    pub resource_type: String,
    /// Identity recorded as the creator of submitted objects.
    pub created_by_id: Uuid,
    /// Sent as a bearer token when present.
    pub access_token: Option<String>,
    pub suppress_store_backend_id: bool,
    /// Store backend id to use instead of a generated one. Empty = generate.
    pub manually_initialize_store_backend_id: String,
    pub store_name: Option<String>,
    pub timeout_secs: u64,
}

impl CloudStoreConfig {
    pub fn new(
        base_url: impl Into<String>,
        resource_name: impl Into<String>,
        resource_type: impl Into<String>,
        created_by_id: Uuid,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            resource_name: resource_name.into(),
            resource_type: resource_type.into(),
            created_by_id,
            access_token: None,
            suppress_store_backend_id: false,
            manually_initialize_store_backend_id: String::new(),
            store_name: None,
            timeout_secs: 30,
        }
    }

    pub fn from_env() -> Result<Self> {
        Ok(Self {
            base_url: std::env::var("VIGIL_CLOUD_BASE_URL")
                .context("VIGIL_CLOUD_BASE_URL is not set")?,
            resource_name: std::env::var("VIGIL_CLOUD_RESOURCE_NAME")
                .unwrap_or_else(|_| "checkpoints".to_string()),
            resource_type: std::env::var("VIGIL_CLOUD_RESOURCE_TYPE")
                .unwrap_or_else(|_| "checkpoint".to_string()),
            created_by_id: std::env::var("VIGIL_CLOUD_CREATED_BY_ID")
                .context("VIGIL_CLOUD_CREATED_BY_ID is not set")?
                .parse()
                .context("Invalid VIGIL_CLOUD_CREATED_BY_ID")?,
            access_token: std::env::var("VIGIL_CLOUD_ACCESS_TOKEN").ok(),
            suppress_store_backend_id: std::env::var("VIGIL_SUPPRESS_STORE_BACKEND_ID")
                .unwrap_or_else(|_| "false".to_string())
                .parse()
                .context("Invalid VIGIL_SUPPRESS_STORE_BACKEND_ID")?,
            manually_initialize_store_backend_id: std::env::var("VIGIL_STORE_BACKEND_ID")
                .unwrap_or_default(),
            store_name: std::env::var("VIGIL_STORE_NAME").ok(),
            timeout_secs: std::env::var("VIGIL_CLOUD_TIMEOUT_SECS")
                .unwrap_or_else(|_| "30".to_string())
                .parse()
                .context("Invalid VIGIL_CLOUD_TIMEOUT_SECS")?,
        })
    }
}
