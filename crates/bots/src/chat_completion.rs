//! Chat-completions engine.
//!
//! Sends the conversation history to an Azure OpenAI deployment. When an
//! augmentation source is configured every request is grounded on it.

use std::sync::Arc;

use async_trait::async_trait;
use genaibot_core::augmentation::AugmentationSource;
use genaibot_core::bot::Bot;
use genaibot_core::engine::EngineKind;
use genaibot_core::error::Error;
use genaibot_core::inference::InferenceClient;
use genaibot_core::message::Activity;

use crate::turn::{BotContext, HistoryTurn, configured};

pub struct ChatCompletionBot {
    client: Arc<dyn InferenceClient>,
    deployment: Option<String>,
    augmentation: Option<Arc<AugmentationSource>>,
    context: BotContext,
}

impl ChatCompletionBot {
    pub fn new(
        client: Arc<dyn InferenceClient>,
        deployment: Option<String>,
        augmentation: Option<Arc<AugmentationSource>>,
        context: BotContext,
    ) -> Self {
        Self {
            client,
            deployment,
            augmentation,
            context,
        }
    }

    pub fn deployment(&self) -> Option<&str> {
        self.deployment.as_deref()
    }

    pub fn augmentation(&self) -> Option<&Arc<AugmentationSource>> {
        self.augmentation.as_ref()
    }
}

#[async_trait]
impl Bot for ChatCompletionBot {
    fn kind(&self) -> EngineKind {
        EngineKind::ChatCompletions
    }

    async fn on_message(&self, activity: &Activity) -> Result<String, Error> {
        let deployment = configured(self.deployment(), "AZURE_OPENAI_DEPLOYMENT_NAME")?;
        HistoryTurn {
            deployment: Some(deployment),
            augmentation: self.augmentation.as_deref(),
            window: None,
        }
        .run(&self.context, self.client.as_ref(), activity)
        .await
    }
}
