//! Object store boundary.
//!
//! The broker performs point reads of data source descriptors by id.
//! Persistence, mutation, and authorization belong to the external store.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Saved-object type under which data source descriptors are stored.
pub const DATA_SOURCE_TYPE: &str = "data-source";

/// Reference from one saved object to another.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SavedObjectReference {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub object_type: String,
}

/// Envelope returned by the object store for a point read.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedObject<T> {
    pub id: String,
    #[serde(rename = "type")]
    pub object_type: String,
    pub attributes: T,
    #[serde(default)]
    pub references: Vec<SavedObjectReference>,
}

/// Failures the store boundary can report.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{object_type} {id} not found")]
    NotFound { object_type: String, id: String },

    #[error("access to {object_type} {id} is forbidden")]
    Forbidden { object_type: String, id: String },

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

/// Generic object store `get(type, id)` contract.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Point read of a saved object. Attributes come back as raw JSON and
    /// are deserialized by the caller.
    async fn get(
        &self,
        object_type: &str,
        id: &str,
    ) -> Result<SavedObject<serde_json::Value>, StoreError>;
}
