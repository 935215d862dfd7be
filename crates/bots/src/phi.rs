//! Phi engine: conversation history against a Phi serverless deployment.

use std::sync::Arc;

use async_trait::async_trait;
use genaibot_core::bot::Bot;
use genaibot_core::engine::EngineKind;
use genaibot_core::error::Error;
use genaibot_core::inference::InferenceClient;
use genaibot_core::message::Activity;

use crate::turn::{BotContext, HistoryTurn};

pub struct PhiBot {
    client: Arc<dyn InferenceClient>,
    context: BotContext,
}

impl PhiBot {
    pub fn new(client: Arc<dyn InferenceClient>, context: BotContext) -> Self {
        Self { client, context }
    }
}

#[async_trait]
impl Bot for PhiBot {
    fn kind(&self) -> EngineKind {
        EngineKind::Phi
    }

    async fn on_message(&self, activity: &Activity) -> Result<String, Error> {
        HistoryTurn::default()
            .run(&self.context, self.client.as_ref(), activity)
            .await
    }
}
