//! Assistant engine.
//!
//! History lives server-side in an assistant thread. The thread id is kept
//! in conversation state so later turns continue the same thread.

use std::sync::Arc;

use async_trait::async_trait;
use genaibot_core::bot::Bot;
use genaibot_core::engine::EngineKind;
use genaibot_core::error::Error;
use genaibot_core::inference::{AssistantRun, InferenceClient};
use genaibot_core::message::Activity;
use tracing::debug;

use crate::turn::{BotContext, THREAD_ID_PROPERTY, configured};

pub struct AssistantBot {
    client: Arc<dyn InferenceClient>,
    assistant_id: Option<String>,
    context: BotContext,
}

impl AssistantBot {
    pub fn new(
        client: Arc<dyn InferenceClient>,
        assistant_id: Option<String>,
        context: BotContext,
    ) -> Self {
        Self {
            client,
            assistant_id,
            context,
        }
    }

    pub fn assistant_id(&self) -> Option<&str> {
        self.assistant_id.as_deref()
    }
}

#[async_trait]
impl Bot for AssistantBot {
    fn kind(&self) -> EngineKind {
        EngineKind::Assistant
    }

    async fn on_message(&self, activity: &Activity) -> Result<String, Error> {
        let assistant_id = configured(self.assistant_id(), "AZURE_OPENAI_ASSISTANT_ID")?;
        let mut bag = self.context.conversation_state.load(activity).await?;
        let thread_id: Option<String> = bag.get(THREAD_ID_PROPERTY);

        let reply = self
            .client
            .run_assistant(AssistantRun {
                assistant_id: assistant_id.to_string(),
                thread_id: thread_id.clone(),
                message: activity.text.clone(),
            })
            .await?;

        if thread_id.as_deref() != Some(reply.thread_id.as_str()) {
            debug!(thread_id = %reply.thread_id, "Storing assistant thread");
            bag.set(THREAD_ID_PROPERTY, &reply.thread_id)?;
            self.context.conversation_state.save(activity, &bag).await?;
        }
        self.context.record_turn(activity).await?;

        Ok(reply.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{ScriptedClient, activity, context};
    use crate::turn::TURN_COUNT_PROPERTY;
    use genaibot_core::error::ProviderError;

    #[tokio::test]
    async fn thread_is_created_once_and_reused() {
        let client = Arc::new(ScriptedClient::new(["first", "second"]));
        let ctx = context(None);
        let bot = AssistantBot::new(client.clone(), Some("asst_123".into()), ctx.clone());

        assert_eq!(bot.on_message(&activity("hi")).await.unwrap(), "first");
        assert_eq!(bot.on_message(&activity("again")).await.unwrap(), "second");

        let runs = client.runs();
        assert_eq!(runs.len(), 2);
        assert_eq!(runs[0].thread_id, None);
        assert_eq!(runs[1].thread_id.as_deref(), Some("thread_0"));
        assert!(runs.iter().all(|r| r.assistant_id == "asst_123"));

        let conversation = ctx.conversation_state.load(&activity("")).await.unwrap();
        assert_eq!(
            conversation.get::<String>(THREAD_ID_PROPERTY).as_deref(),
            Some("thread_0")
        );
        let user = ctx.user_state.load(&activity("")).await.unwrap();
        assert_eq!(user.get::<u64>(TURN_COUNT_PROPERTY), Some(2));
    }

    #[tokio::test]
    async fn unset_assistant_id_is_not_configured() {
        let client = Arc::new(ScriptedClient::new([]));
        let ctx = context(None);
        let bot = AssistantBot::new(client.clone(), None, ctx.clone());

        let err = bot.on_message(&activity("hi")).await.unwrap_err();
        assert!(matches!(err, Error::Provider(ProviderError::NotConfigured(_))));
        assert!(client.runs().is_empty());
        assert!(ctx.user_state.load(&activity("")).await.unwrap().is_empty());
    }
}
