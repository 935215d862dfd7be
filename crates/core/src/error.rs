//! Error types for the GenAIBot domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error enum; [`StartupError`] covers
//! everything that can go wrong while the service graph is composed.

use thiserror::Error;

/// The top-level error type for all GenAIBot operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Startup / composition errors ---
    #[error("Startup error: {0}")]
    Startup(#[from] StartupError),

    // --- Inference errors ---
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    // --- Storage errors ---
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // --- Generic ---
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

/// Fatal errors raised while composing the service graph.
///
/// None of these are recovered from: the process refuses to start.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StartupError {
    #[error("Missing required configuration value: {key}")]
    MissingConfiguration { key: String },

    #[error("Invalid configuration value for {key}: {reason}")]
    InvalidConfiguration { key: String, reason: String },

    #[error("Engine type '{value}' is not supported in this version")]
    UnsupportedSelection { value: String },

    #[error("Invalid engine type: '{value}'")]
    InvalidSelection { value: String },

    #[error("Capability '{capability}' was registered twice")]
    DuplicateRegistration { capability: String },

    #[error("Capability '{capability}' resolved before it was registered")]
    StartupOrderingViolation { capability: String },

    #[error("Failed to construct {client}: {reason}")]
    ClientConstruction { client: String, reason: String },
}

impl StartupError {
    pub fn missing(key: impl Into<String>) -> Self {
        Self::MissingConfiguration { key: key.into() }
    }

    pub fn invalid(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidConfiguration {
            key: key.into(),
            reason: reason.into(),
        }
    }
}

// --- Bounded context errors ---

#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Assistant run ended with status '{status}'")]
    RunFailed { status: String },

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Storage error: {0}")]
    Backend(String),

    #[error("Storage authentication failed: {0}")]
    Authentication(String),

    #[error("Stored document for '{key}' is malformed: {reason}")]
    Malformed { key: String, reason: String },

    #[error("Storage request failed: {message} (status: {status_code})")]
    Request { status_code: u16, message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_error_displays_correctly() {
        let err = Error::Provider(ProviderError::ApiError {
            status_code: 429,
            message: "Too many requests".into(),
        });
        assert!(err.to_string().contains("429"));
        assert!(err.to_string().contains("Too many requests"));
    }

    #[test]
    fn unsupported_and_invalid_selection_are_distinct() {
        let unsupported = StartupError::UnsupportedSelection {
            value: "langchain".into(),
        };
        let invalid = StartupError::InvalidSelection {
            value: "langchain".into(),
        };
        assert_ne!(unsupported, invalid);
        assert!(unsupported.to_string().contains("not supported in this version"));
        assert!(invalid.to_string().contains("Invalid engine type"));
    }

    #[test]
    fn missing_configuration_names_the_key() {
        let err = Error::from(StartupError::missing("AZURE_COSMOSDB_DATABASE_ID"));
        assert!(err.to_string().contains("AZURE_COSMOSDB_DATABASE_ID"));
    }
}
