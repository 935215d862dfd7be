//! Storage trait — the key/value capability behind user and conversation state.
//!
//! Values are JSON objects. Implementations: in-memory (default when no
//! durable endpoint is configured) and a partitioned Cosmos DB container.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::StorageError;

/// The core Storage trait.
///
/// Implementations must be safe to share across concurrent requests.
#[async_trait]
pub trait Storage: Send + Sync {
    /// The backend name (e.g., "memory", "cosmosdb").
    fn name(&self) -> &str;

    /// Insert or replace the object stored under `key`.
    async fn put(&self, key: &str, value: Value) -> Result<(), StorageError>;

    /// Read the object stored under `key`, if any.
    async fn get(&self, key: &str) -> Result<Option<Value>, StorageError>;

    /// Remove the object stored under `key`. Missing keys are not an error.
    async fn delete(&self, key: &str) -> Result<(), StorageError>;
}
