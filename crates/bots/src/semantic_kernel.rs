//! Semantic-kernel engine.
//!
//! Same Azure OpenAI deployment as chat completions, but only a fixed
//! window of recent history is sent with each request.

use std::sync::Arc;

use async_trait::async_trait;
use genaibot_core::bot::Bot;
use genaibot_core::engine::EngineKind;
use genaibot_core::error::Error;
use genaibot_core::inference::InferenceClient;
use genaibot_core::message::Activity;

use crate::turn::{BotContext, HistoryTurn, configured};

/// History messages sent per request.
pub const HISTORY_WINDOW: usize = 20;

pub struct SemanticKernelBot {
    client: Arc<dyn InferenceClient>,
    deployment: Option<String>,
    window: usize,
    context: BotContext,
}

impl SemanticKernelBot {
    pub fn new(
        client: Arc<dyn InferenceClient>,
        deployment: Option<String>,
        context: BotContext,
    ) -> Self {
        Self {
            client,
            deployment,
            window: HISTORY_WINDOW,
            context,
        }
    }

    /// Override the history window. A window of zero is raised to one.
    pub fn with_window(mut self, window: usize) -> Self {
        self.window = window.max(1);
        self
    }

    pub fn deployment(&self) -> Option<&str> {
        self.deployment.as_deref()
    }
}

#[async_trait]
impl Bot for SemanticKernelBot {
    fn kind(&self) -> EngineKind {
        EngineKind::SemanticKernel
    }

    async fn on_message(&self, activity: &Activity) -> Result<String, Error> {
        let deployment = configured(self.deployment(), "AZURE_OPENAI_DEPLOYMENT_NAME")?;
        HistoryTurn {
            deployment: Some(deployment),
            augmentation: None,
            window: Some(self.window),
        }
        .run(&self.context, self.client.as_ref(), activity)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{ScriptedClient, activity, context};

    #[tokio::test]
    async fn only_the_window_is_sent() {
        let client = Arc::new(ScriptedClient::new(["a", "b", "c"]));
        let bot = SemanticKernelBot::new(client.clone(), Some("gpt-4o".into()), context(Some("sys")))
            .with_window(3);

        for text in ["1", "2", "3"] {
            bot.on_message(&activity(text)).await.unwrap();
        }

        let request = client.last_request().unwrap();
        let contents: Vec<_> = request.messages.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, ["sys", "2", "b", "3"]);
    }

    #[test]
    fn zero_window_is_clamped() {
        let bot = SemanticKernelBot::new(Arc::new(ScriptedClient::new([])), None, context(None))
            .with_window(0);
        assert_eq!(bot.window, 1);
        assert_eq!(bot.kind(), EngineKind::SemanticKernel);
    }

    #[tokio::test]
    async fn unset_deployment_is_reported_on_first_turn() {
        let client = Arc::new(ScriptedClient::new([]));
        let bot = SemanticKernelBot::new(client.clone(), None, context(None));

        let err = bot.on_message(&activity("hi")).await.unwrap_err();
        assert!(matches!(
            err,
            Error::Provider(genaibot_core::error::ProviderError::NotConfigured(_))
        ));
        assert!(client.last_request().is_none());
    }
}
