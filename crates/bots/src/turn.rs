//! Per-turn plumbing shared by every engine.
//!
//! A turn loads conversation state, calls the inference client, writes the
//! reply back and bumps the user's turn counter.

use genaibot_core::augmentation::AugmentationSource;
use genaibot_core::error::{Error, ProviderError};
use genaibot_core::inference::{ChatRequest, InferenceClient};
use genaibot_core::message::{Activity, Message};
use genaibot_storage::{BotState, StateBag};
use tracing::debug;

/// Conversation-state property holding the chat history.
pub const HISTORY_PROPERTY: &str = "history";

/// User-state property counting handled turns.
pub const TURN_COUNT_PROPERTY: &str = "turn_count";

/// Conversation-state property holding the assistant thread id.
pub const THREAD_ID_PROPERTY: &str = "thread_id";

/// Upper bound on persisted history, in messages.
pub const MAX_STORED_HISTORY: usize = 50;

/// Dependencies every engine is built with.
#[derive(Debug, Clone)]
pub struct BotContext {
    pub user_state: BotState,
    pub conversation_state: BotState,
    pub instructions: Option<String>,
}

impl BotContext {
    pub fn new(
        user_state: BotState,
        conversation_state: BotState,
        instructions: Option<String>,
    ) -> Self {
        Self {
            user_state,
            conversation_state,
            instructions: instructions.filter(|i| !i.trim().is_empty()),
        }
    }

    /// Increment and persist the user's turn counter. Returns the new count.
    pub async fn record_turn(&self, activity: &Activity) -> Result<u64, Error> {
        let mut bag = self.user_state.load(activity).await?;
        let turns = bag.get::<u64>(TURN_COUNT_PROPERTY).unwrap_or(0) + 1;
        bag.set(TURN_COUNT_PROPERTY, &turns)?;
        self.user_state.save(activity, &bag).await?;
        Ok(turns)
    }

    /// Instructions as a leading system message, when configured.
    pub(crate) fn system_message(&self) -> Option<Message> {
        self.instructions.as_deref().map(Message::system)
    }
}

/// Unwrap an engine setting that may have been left unset at startup.
pub(crate) fn configured<'a>(value: Option<&'a str>, setting: &str) -> Result<&'a str, Error> {
    value.ok_or_else(|| ProviderError::NotConfigured(format!("{setting} is not set")).into())
}

/// How a history-driven engine shapes each request.
#[derive(Debug, Clone, Default)]
pub(crate) struct HistoryTurn<'a> {
    pub deployment: Option<&'a str>,
    pub augmentation: Option<&'a AugmentationSource>,
    /// Only the newest `window` history messages are sent when set.
    pub window: Option<usize>,
}

impl HistoryTurn<'_> {
    pub(crate) async fn run(
        &self,
        context: &BotContext,
        client: &dyn InferenceClient,
        activity: &Activity,
    ) -> Result<String, Error> {
        let mut bag = context.conversation_state.load(activity).await?;
        let mut history: Vec<Message> = bag.get(HISTORY_PROPERTY).unwrap_or_default();
        history.push(Message::user(activity.text.clone()));

        let sent = match self.window {
            Some(window) => &history[history.len().saturating_sub(window)..],
            None => &history[..],
        };

        let mut messages = Vec::with_capacity(sent.len() + 1);
        messages.extend(context.system_message());
        messages.extend(sent.iter().cloned());

        debug!(
            client = client.name(),
            history = history.len(),
            sent = messages.len(),
            "Running history turn"
        );

        let response = client
            .complete(ChatRequest {
                deployment: self.deployment.map(str::to_string),
                messages,
                augmentation: self.augmentation.cloned(),
                ..ChatRequest::default()
            })
            .await?;

        let reply = response.message.content.clone();
        history.push(response.message);
        trim_history(&mut history);

        save_history(context, activity, &mut bag, &history).await?;
        context.record_turn(activity).await?;

        Ok(reply)
    }
}

fn trim_history(history: &mut Vec<Message>) {
    let excess = history.len().saturating_sub(MAX_STORED_HISTORY);
    history.drain(..excess);
}

async fn save_history(
    context: &BotContext,
    activity: &Activity,
    bag: &mut StateBag,
    history: &[Message],
) -> Result<(), Error> {
    bag.set(HISTORY_PROPERTY, &history)?;
    context.conversation_state.save(activity, bag).await?;
    Ok(())
}
