//! Retrieval augmentation descriptor.

use serde::{Deserialize, Serialize};

/// How the inference backend authenticates against the search service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataSourceAuthentication {
    /// The inference service's own system-assigned managed identity.
    SystemAssignedManagedIdentity,
}

/// A search index the chat-completions backend should ground its answers on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AugmentationSource {
    pub endpoint: String,
    pub index_name: String,
    pub authentication: DataSourceAuthentication,

    /// Free-text instructions, passed through verbatim.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role_information: Option<String>,
}
