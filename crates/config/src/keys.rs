//! Well-known configuration keys. Case-sensitive.

/// Client id of the user-assigned identity; optional.
pub const MICROSOFT_APP_ID: &str = "MicrosoftAppId";

pub const AZURE_OPENAI_API_ENDPOINT: &str = "AZURE_OPENAI_API_ENDPOINT";
pub const AZURE_OPENAI_API_VERSION: &str = "AZURE_OPENAI_API_VERSION";
pub const AZURE_OPENAI_DEPLOYMENT_NAME: &str = "AZURE_OPENAI_DEPLOYMENT_NAME";
pub const AZURE_OPENAI_ASSISTANT_ID: &str = "AZURE_OPENAI_ASSISTANT_ID";

pub const AZURE_AI_PHI_DEPLOYMENT_ENDPOINT: &str = "AZURE_AI_PHI_DEPLOYMENT_ENDPOINT";
pub const AZURE_AI_PHI_DEPLOYMENT_KEY: &str = "AZURE_AI_PHI_DEPLOYMENT_KEY";

pub const AZURE_COSMOSDB_ENDPOINT: &str = "AZURE_COSMOSDB_ENDPOINT";
pub const AZURE_COSMOSDB_DATABASE_ID: &str = "AZURE_COSMOSDB_DATABASE_ID";
pub const AZURE_COSMOSDB_CONTAINER_ID: &str = "AZURE_COSMOSDB_CONTAINER_ID";

pub const AZURE_SEARCH_API_ENDPOINT: &str = "AZURE_SEARCH_API_ENDPOINT";
pub const AZURE_SEARCH_INDEX: &str = "AZURE_SEARCH_INDEX";

pub const LLM_INSTRUCTIONS: &str = "LLM_INSTRUCTIONS";

/// Engine selector.
pub const GEN_AI_IMPLEMENTATION: &str = "GEN_AI_IMPLEMENTATION";
