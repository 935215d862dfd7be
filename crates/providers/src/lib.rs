//! Inference clients for GenAIBot.
//!
//! All clients implement the `genaibot_core::InferenceClient` trait.
//! The host picks which ones to build from configuration.

pub mod azure_openai;
pub mod phi;
mod wire;

pub use azure_openai::{AzureOpenAiClient, COGNITIVE_SERVICES_SCOPE, DEFAULT_API_VERSION};
pub use phi::PhiClient;
