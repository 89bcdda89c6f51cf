//! Store keys.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::StoreError;

/// A key addressing one stored object: a tuple of string parts.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct StoreKey(Vec<String>);

impl StoreKey {
    pub fn new<I, S>(parts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(parts.into_iter().map(Into::into).collect())
    }

    /// A single-part key holding a resource identifier.
    pub fn resource(id: impl Into<String>) -> Self {
        Self(vec![id.into()])
    }

    pub fn parts(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Check the key has exactly `length` non-empty parts.
    pub fn validate_fixed_length(&self, length: usize) -> Result<(), StoreError> {
        if self.0.len() != length {
            return Err(StoreError::InvalidKey(format!(
                "expected a key of length {}, got {} ({})",
                length,
                self.0.len(),
                self
            )));
        }
        if self.0.iter().any(|p| p.trim().is_empty()) {
            return Err(StoreError::InvalidKey(format!(
                "key parts cannot be empty ({})",
                self
            )));
        }
        Ok(())
    }

    /// The resource identifier of a single-part key.
    pub fn resource_id(&self) -> Result<&str, StoreError> {
        self.validate_fixed_length(1)?;
        Ok(&self.0[0])
    }
}

impl fmt::Display for StoreKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({})", self.0.join(", "))
    }
}

impl From<&str> for StoreKey {
    fn from(id: &str) -> Self {
        Self::resource(id)
    }
}
