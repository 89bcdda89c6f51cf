//! Vigil Store - persistence backends for configuration objects
//!
//! This crate provides:
//! - The `StoreBackend` key/value contract
//! - A JSON:API cloud backend over HTTP
//! - An in-memory backend
//! - Checkpoint configuration, the object the cloud backend persists

pub mod backend;
pub mod checkpoint;
pub mod cloud;
pub mod config;
pub mod error;
pub mod key;
pub mod memory;

pub use backend::{StoreBackend, StoredConfig};
pub use checkpoint::CheckpointConfig;
pub use cloud::{CloudStoreBackend, JSON_API_CONTENT_TYPE};
pub use config::CloudStoreConfig;
pub use error::StoreError;
pub use key::StoreKey;
pub use memory::InMemoryStoreBackend;
