//! Storage backend selection.
//!
//! The decision is a pure function of one key: a non-empty
//! `AZURE_COSMOSDB_ENDPOINT` selects Cosmos DB, anything else selects
//! in-memory storage. There is no runtime downgrade between the two.

use std::sync::Arc;

use genaibot_config::{Configuration, keys};
use genaibot_core::error::StartupError;
use genaibot_core::storage::Storage;
use genaibot_identity::TokenCredential;

use crate::cosmos::{CosmosDbPartitionedStorage, CosmosDbStorageOptions};
use crate::memory::MemoryStorage;

/// Which backend configuration asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageSelection {
    CosmosDb(CosmosDbStorageOptions),
    InMemory,
}

impl StorageSelection {
    /// Decide the backend. Database and container ids are required only
    /// once the endpoint is set.
    pub fn from_config(config: &Configuration) -> Result<Self, StartupError> {
        let Some(endpoint) = config.get_non_empty(keys::AZURE_COSMOSDB_ENDPOINT) else {
            return Ok(Self::InMemory);
        };

        Ok(Self::CosmosDb(CosmosDbStorageOptions {
            endpoint: endpoint.to_string(),
            database_id: config.require(keys::AZURE_COSMOSDB_DATABASE_ID)?.to_string(),
            container_id: config.require(keys::AZURE_COSMOSDB_CONTAINER_ID)?.to_string(),
        }))
    }
}

/// The constructed backend. Clone shares the same underlying instance.
#[derive(Clone)]
pub enum StorageBackend {
    CosmosDb(Arc<CosmosDbPartitionedStorage>),
    Memory(Arc<MemoryStorage>),
}

impl StorageBackend {
    /// Select and construct the backend in one step.
    pub fn select(
        config: &Configuration,
        credential: Arc<dyn TokenCredential>,
    ) -> Result<Self, StartupError> {
        let selection = StorageSelection::from_config(config)?;
        Self::build(selection, credential)
    }

    pub fn build(
        selection: StorageSelection,
        credential: Arc<dyn TokenCredential>,
    ) -> Result<Self, StartupError> {
        match selection {
            StorageSelection::CosmosDb(options) => {
                tracing::info!(
                    endpoint = %options.endpoint,
                    database = %options.database_id,
                    container = %options.container_id,
                    "Using Cosmos DB state storage"
                );
                Ok(Self::CosmosDb(Arc::new(CosmosDbPartitionedStorage::new(
                    options, credential,
                )?)))
            }
            StorageSelection::InMemory => {
                tracing::info!("No Cosmos DB endpoint configured, using in-memory state storage");
                Ok(Self::Memory(Arc::new(MemoryStorage::new())))
            }
        }
    }

    /// The backend as a trait object. Every call returns the same instance.
    pub fn storage(&self) -> Arc<dyn Storage> {
        match self {
            Self::CosmosDb(s) => s.clone() as Arc<dyn Storage>,
            Self::Memory(s) => s.clone() as Arc<dyn Storage>,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::CosmosDb(_) => "cosmosdb",
            Self::Memory(_) => "memory",
        }
    }
}

impl std::fmt::Debug for StorageBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("StorageBackend").field(&self.name()).finish()
    }
}
