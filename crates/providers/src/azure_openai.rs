//! Azure OpenAI client.
//!
//! Supports:
//! - Chat completions against a named deployment, optionally grounded on an
//!   Azure AI Search index (`data_sources`)
//! - Assistant threads: create/continue a thread, run it, read the reply
//!
//! Authenticates with bearer tokens from the shared credential.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use genaibot_core::error::{ProviderError, StartupError};
use genaibot_core::inference::{
    AssistantReply, AssistantRun, ChatRequest, ChatResponse, InferenceClient,
};
use genaibot_identity::TokenCredential;
use reqwest::{Method, Url};
use serde_json::{Value, json};
use tracing::debug;

use crate::wire::{ApiResponse, chat_body, check_status};

/// Token scope for Azure AI services.
pub const COGNITIVE_SERVICES_SCOPE: &str = "https://cognitiveservices.azure.com/.default";

pub const DEFAULT_API_VERSION: &str = "2024-05-01-preview";

const REQUEST_TIMEOUT_SECS: u64 = 120;
const RUN_POLL_INTERVAL: Duration = Duration::from_millis(500);
const RUN_TIMEOUT: Duration = Duration::from_secs(120);

/// Lifecycle of an assistant run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum RunStatus {
    Pending,
    Completed,
    Terminal(String),
}

impl RunStatus {
    pub(crate) fn parse(status: &str) -> Self {
        match status {
            "queued" | "in_progress" | "cancelling" => RunStatus::Pending,
            "completed" => RunStatus::Completed,
            other => RunStatus::Terminal(other.to_string()),
        }
    }
}

/// Azure OpenAI resource client.
pub struct AzureOpenAiClient {
    endpoint: String,
    api_version: String,
    credential: Arc<dyn TokenCredential>,
    http: reqwest::Client,
}

impl AzureOpenAiClient {
    /// Validate the endpoint and build the HTTP client. No request is sent.
    pub fn new(
        endpoint: &str,
        api_version: Option<&str>,
        credential: Arc<dyn TokenCredential>,
    ) -> Result<Self, StartupError> {
        let url = Url::parse(endpoint).map_err(|e| {
            StartupError::invalid("AZURE_OPENAI_API_ENDPOINT", e.to_string())
        })?;
        if url.cannot_be_a_base() {
            return Err(StartupError::invalid(
                "AZURE_OPENAI_API_ENDPOINT",
                "endpoint must be an absolute URL",
            ));
        }

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| StartupError::ClientConstruction {
                client: "azure_openai".into(),
                reason: e.to_string(),
            })?;

        Ok(Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            api_version: api_version.unwrap_or(DEFAULT_API_VERSION).to_string(),
            credential,
            http,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn api_version(&self) -> &str {
        &self.api_version
    }

    fn url(&self, path: &str) -> String {
        format!("{}/openai/{}", self.endpoint, path.trim_start_matches('/'))
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, &str)],
        body: Option<&Value>,
    ) -> Result<Value, ProviderError> {
        let token = self
            .credential
            .get_token(COGNITIVE_SERVICES_SCOPE)
            .await
            .map_err(|e| ProviderError::AuthenticationFailed(e.to_string()))?;

        let mut request = self
            .http
            .request(method, self.url(path))
            .bearer_auth(&token.token)
            .query(&[("api-version", self.api_version.as_str())])
            .query(query);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;
        let response = check_status(self.name(), response).await?;

        response.json().await.map_err(|e| ProviderError::ApiError {
            status_code: 200,
            message: format!("Failed to parse response: {e}"),
        })
    }

    async fn create_thread(&self) -> Result<String, ProviderError> {
        let thread = self.send(Method::POST, "threads", &[], Some(&json!({}))).await?;
        string_field(&thread, "id")
    }

    async fn wait_for_run(&self, thread_id: &str, run_id: &str) -> Result<(), ProviderError> {
        let path = format!("threads/{thread_id}/runs/{run_id}");
        let deadline = tokio::time::Instant::now() + RUN_TIMEOUT;

        loop {
            let run = self.send(Method::GET, &path, &[], None).await?;
            match RunStatus::parse(&string_field(&run, "status")?) {
                RunStatus::Completed => return Ok(()),
                RunStatus::Terminal(status) => return Err(ProviderError::RunFailed { status }),
                RunStatus::Pending => {}
            }

            if tokio::time::Instant::now() >= deadline {
                return Err(ProviderError::Timeout(format!(
                    "assistant run {run_id} did not finish within {}s",
                    RUN_TIMEOUT.as_secs()
                )));
            }
            tokio::time::sleep(RUN_POLL_INTERVAL).await;
        }
    }
}

impl std::fmt::Debug for AzureOpenAiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AzureOpenAiClient")
            .field("endpoint", &self.endpoint)
            .field("api_version", &self.api_version)
            .field("credential", &"<credential>")
            .finish()
    }
}

#[async_trait]
impl InferenceClient for AzureOpenAiClient {
    fn name(&self) -> &str {
        "azure_openai"
    }

    async fn complete(&self, request: ChatRequest) -> Result<ChatResponse, ProviderError> {
        let deployment = request.deployment.clone().ok_or_else(|| {
            ProviderError::NotConfigured("Azure OpenAI requests need a deployment name".into())
        })?;

        debug!(
            deployment = %deployment,
            messages = request.messages.len(),
            grounded = request.augmentation.is_some(),
            "Sending chat completion request"
        );

        let body = chat_body(&request, None);
        let path = format!("deployments/{deployment}/chat/completions");
        let raw = self.send(Method::POST, &path, &[], Some(&body)).await?;

        let api_response: ApiResponse =
            serde_json::from_value(raw).map_err(|e| ProviderError::ApiError {
                status_code: 200,
                message: format!("Failed to parse response: {e}"),
            })?;
        api_response.into_chat_response()
    }

    async fn run_assistant(&self, run: AssistantRun) -> Result<AssistantReply, ProviderError> {
        let thread_id = match run.thread_id {
            Some(id) => id,
            None => self.create_thread().await?,
        };

        self.send(
            Method::POST,
            &format!("threads/{thread_id}/messages"),
            &[],
            Some(&json!({ "role": "user", "content": run.message })),
        )
        .await?;

        let created = self
            .send(
                Method::POST,
                &format!("threads/{thread_id}/runs"),
                &[],
                Some(&json!({ "assistant_id": run.assistant_id })),
            )
            .await?;
        let run_id = string_field(&created, "id")?;
        debug!(thread_id = %thread_id, run_id = %run_id, "Assistant run started");

        self.wait_for_run(&thread_id, &run_id).await?;

        let messages = self
            .send(
                Method::GET,
                &format!("threads/{thread_id}/messages"),
                &[("order", "desc"), ("limit", "1")],
                None,
            )
            .await?;

        let text = latest_assistant_text(&messages).ok_or_else(|| ProviderError::ApiError {
            status_code: 200,
            message: "Assistant run completed without a reply".into(),
        })?;

        Ok(AssistantReply { thread_id, text })
    }
}

fn string_field(value: &Value, field: &str) -> Result<String, ProviderError> {
    value[field]
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| ProviderError::ApiError {
            status_code: 200,
            message: format!("Response is missing '{field}'"),
        })
}

/// Text of the newest assistant message in a `list messages` page.
pub(crate) fn latest_assistant_text(page: &Value) -> Option<String> {
    let message = page["data"]
        .as_array()?
        .iter()
        .find(|m| m["role"] == "assistant")?;

    let parts: Vec<&str> = message["content"]
        .as_array()?
        .iter()
        .filter(|part| part["type"] == "text")
        .filter_map(|part| part["text"]["value"].as_str())
        .collect();

    if parts.is_empty() {
        None
    } else {
        Some(parts.join("\n"))
    }
}
