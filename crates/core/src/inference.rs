//! Inference client trait — the abstraction over conversational backends.
//!
//! An inference client knows how to send chat history to a model and get a
//! reply back. Azure OpenAI additionally supports server-side assistant
//! threads; other clients inherit the default `NotConfigured` answer.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::augmentation::AugmentationSource;
use crate::error::ProviderError;
use crate::message::Message;

/// A chat completion request.
#[derive(Debug, Clone, Default)]
pub struct ChatRequest {
    /// Deployment (model) name; ignored by single-deployment endpoints.
    pub deployment: Option<String>,

    /// The conversation messages, oldest first
    pub messages: Vec<Message>,

    /// Sampling temperature
    pub temperature: Option<f32>,

    /// Maximum tokens to generate
    pub max_tokens: Option<u32>,

    /// Retrieval source the backend should ground the answer on
    pub augmentation: Option<AugmentationSource>,
}

/// A complete (non-streaming) response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    /// The generated message
    pub message: Message,

    /// Token usage statistics
    pub usage: Option<Usage>,

    /// Which model actually responded
    pub model: String,
}

/// Token usage information.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// One user message posted to an assistant thread.
#[derive(Debug, Clone)]
pub struct AssistantRun {
    pub assistant_id: String,

    /// Existing thread to continue; a new thread is created when `None`.
    pub thread_id: Option<String>,

    pub message: String,
}

/// The assistant's answer and the thread it lives on.
#[derive(Debug, Clone)]
pub struct AssistantReply {
    pub thread_id: String,
    pub text: String,
}

/// The core inference client trait.
#[async_trait]
pub trait InferenceClient: Send + Sync {
    /// A human-readable name for this client (e.g., "azure_openai", "phi").
    fn name(&self) -> &str;

    /// Send a request and get a complete response.
    async fn complete(&self, request: ChatRequest) -> Result<ChatResponse, ProviderError>;

    /// Post a message to an assistant thread and wait for the run to finish.
    async fn run_assistant(&self, _run: AssistantRun) -> Result<AssistantReply, ProviderError> {
        Err(ProviderError::NotConfigured(format!(
            "Client '{}' does not support assistants",
            self.name()
        )))
    }
}
