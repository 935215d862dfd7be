//! Phi serverless deployment client.
//!
//! Serverless model endpoints expose a single deployment behind
//! `{endpoint}/chat/completions` and authenticate with a static key.

use std::time::Duration;

use async_trait::async_trait;
use genaibot_core::error::{ProviderError, StartupError};
use genaibot_core::inference::{ChatRequest, ChatResponse, InferenceClient};
use reqwest::Url;
use tracing::debug;

use crate::wire::{ApiResponse, chat_body, check_status};

const REQUEST_TIMEOUT_SECS: u64 = 120;

pub struct PhiClient {
    endpoint: String,
    key: String,
    http: reqwest::Client,
}

impl PhiClient {
    pub fn new(endpoint: &str, key: &str) -> Result<Self, StartupError> {
        let url = Url::parse(endpoint).map_err(|e| {
            StartupError::invalid("AZURE_AI_PHI_DEPLOYMENT_ENDPOINT", e.to_string())
        })?;
        if url.cannot_be_a_base() {
            return Err(StartupError::invalid(
                "AZURE_AI_PHI_DEPLOYMENT_ENDPOINT",
                "endpoint must be an absolute URL",
            ));
        }
        if key.is_empty() {
            return Err(StartupError::missing("AZURE_AI_PHI_DEPLOYMENT_KEY"));
        }

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| StartupError::ClientConstruction {
                client: "phi".into(),
                reason: e.to_string(),
            })?;

        Ok(Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            key: key.to_string(),
            http,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl std::fmt::Debug for PhiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PhiClient")
            .field("endpoint", &self.endpoint)
            .field("key", &"<redacted>")
            .finish()
    }
}

#[async_trait]
impl InferenceClient for PhiClient {
    fn name(&self) -> &str {
        "phi"
    }

    async fn complete(&self, request: ChatRequest) -> Result<ChatResponse, ProviderError> {
        let url = format!("{}/chat/completions", self.endpoint);
        let body = chat_body(&request, request.deployment.as_deref());

        debug!(url = %url, messages = request.messages.len(), "Sending Phi request");

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;
        let response = check_status(self.name(), response).await?;

        let api_response: ApiResponse =
            response.json().await.map_err(|e| ProviderError::ApiError {
                status_code: 200,
                message: format!("Failed to parse response: {e}"),
            })?;
        api_response.into_chat_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_is_redacted_in_debug() {
        let client = PhiClient::new("https://phi-3.eastus2.models.ai.azure.com/", "s3cr3t").unwrap();
        let debug = format!("{client:?}");
        assert!(!debug.contains("s3cr3t"));
        assert_eq!(client.endpoint(), "https://phi-3.eastus2.models.ai.azure.com");
    }

    #[test]
    fn empty_key_is_missing_configuration() {
        let err = PhiClient::new("https://phi-3.eastus2.models.ai.azure.com", "").unwrap_err();
        assert_eq!(err, StartupError::missing("AZURE_AI_PHI_DEPLOYMENT_KEY"));
    }

    #[test]
    fn relative_endpoint_is_invalid() {
        assert!(matches!(
            PhiClient::new("phi-3", "k"),
            Err(StartupError::InvalidConfiguration { .. })
        ));
    }

    #[test]
    fn non_base_endpoint_is_invalid() {
        for endpoint in ["mailto:ops@example.com", "data:text/plain,phi"] {
            assert!(
                matches!(
                    PhiClient::new(endpoint, "k"),
                    Err(StartupError::InvalidConfiguration { .. })
                ),
                "{endpoint}"
            );
        }
    }

    #[tokio::test]
    async fn assistant_runs_are_not_supported() {
        use genaibot_core::inference::AssistantRun;
        let client = PhiClient::new("https://phi-3.eastus2.models.ai.azure.com", "k").unwrap();
        let err = client
            .run_assistant(AssistantRun {
                assistant_id: "a".into(),
                thread_id: None,
                message: "hi".into(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::NotConfigured(_)));
    }
}
